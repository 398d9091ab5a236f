//! Application state for the API server

use crate::{BuildService, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The build service handling submissions, status checks and downloads
    pub service: Arc<BuildService>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<BuildService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}

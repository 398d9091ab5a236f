//! System handlers: health, OpenAPI, unknown-endpoint fallback.

use super::AVAILABLE_ENDPOINTS;
use crate::api::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;

/// GET /api/health - Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up; reports whether remote credentials are configured")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let remote = &state.config.remote;
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "config": {
            "hasGithubToken": remote.has_token(),
            "repoOwner": remote.owner,
            "repoName": remote.repo,
        }
    }))
}

/// GET /api/openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// Fallback for paths no route matches
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::debug!(%method, path = %uri.path(), "unknown endpoint");
    let body = ApiError::with_details(
        "not_found",
        "API endpoint not found",
        json!({
            "path": uri.path(),
            "method": method.as_str(),
            "availableEndpoints": AVAILABLE_ENDPOINTS,
        }),
    );
    (StatusCode::NOT_FOUND, Json(body))
}

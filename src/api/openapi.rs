//! OpenAPI documentation and schema generation
//!
//! The specification is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the ipa-builder REST API
///
/// The spec can be accessed via:
/// - `/api/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ipa-builder REST API",
        version = "0.1.0",
        description = "Submit iOS app builds to a remote CI pipeline, track them and download the resulting archives",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Builds
        crate::api::routes::submit_build,
        crate::api::routes::get_build_status,
        crate::api::routes::download_artifact,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::BuildStatus,
        crate::types::ClientStatus,
        crate::types::ArtifactHandle,

        // Config types from config.rs
        crate::config::Config,
        crate::config::RemoteConfig,
        crate::config::RetryConfig,
        crate::config::PollConfig,
        crate::config::ApiConfig,

        // API request/response types
        crate::api::routes::BuildRequest,
        crate::api::routes::BuildResponse,
        crate::api::routes::StatusResponse,
        crate::api::routes::StatusErrorResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "builds", description = "Builds - Submit, track and download app builds"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;

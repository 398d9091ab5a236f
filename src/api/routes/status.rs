//! Build status handler.

use super::{StatusErrorResponse, StatusResponse};
use crate::api::AppState;
use crate::types::{BuildStatus, JobId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /api/status/:request_id - Current status of a build
#[utoipa::path(
    get,
    path = "/api/status/{request_id}",
    tag = "builds",
    params(
        ("request_id" = String, Path, description = "JobId returned by POST /api/build")
    ),
    responses(
        (status = 200, description = "Current build status", body = StatusResponse),
        (status = 500, description = "Status could not be determined; poll again", body = StatusErrorResponse)
    )
)]
pub async fn get_build_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Response {
    let job_id = JobId::new(request_id);
    let status = state.service.poll_status(&job_id).await;

    if status.status == BuildStatus::Error {
        let error = status
            .message
            .unwrap_or_else(|| "status check failed".to_string());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusErrorResponse {
                status: BuildStatus::Error,
                error,
            }),
        )
            .into_response();
    }

    (StatusCode::OK, Json(StatusResponse::from(status))).into_response()
}

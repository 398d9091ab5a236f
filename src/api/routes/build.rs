//! Build submission handler.

use super::{BuildRequest, BuildResponse};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::JobRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Json, extract::State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// POST /api/build - Submit a build
#[utoipa::path(
    post,
    path = "/api/build",
    tag = "builds",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Build dispatched", body = BuildResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 413, description = "Request body too large", body = crate::error::ApiError),
        (status = 502, description = "Remote CI rejected the upload or dispatch", body = crate::error::ApiError),
        (status = 503, description = "No remote credentials configured", body = crate::error::ApiError)
    )
)]
pub async fn submit_build(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BuildRequest>, JsonRejection>,
) -> Result<Json<BuildResponse>> {
    let Json(body) =
        payload.map_err(|rejection| body_error(&rejection, state.config.api.max_body_bytes))?;
    let icon = decode_icon(&body.icon_base64)?;
    let request = JobRequest::new(body.app_name, body.website_url, icon);

    let job_id = state.service.submit_job(&request).await?;

    Ok(Json(BuildResponse {
        success: true,
        request_id: job_id.to_string(),
        message: "Build started successfully".to_string(),
    }))
}

/// Map a rejected JSON body to an error with the usual response shape
fn body_error(rejection: &JsonRejection, limit: usize) -> Error {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit }
    } else {
        Error::validation("body", rejection.body_text())
    }
}

/// Decode an icon given as bare base64 or as a `data:` URL
///
/// An empty input decodes to an empty icon so the submitter reports it as
/// missing rather than malformed.
pub(crate) fn decode_icon(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| Error::validation("iconBase64", "data URL has no payload"))?,
        None => trimmed,
    };

    if payload.is_empty() {
        return Ok(Vec::new());
    }

    STANDARD
        .decode(payload)
        .map_err(|e| Error::validation("iconBase64", format!("icon is not valid base64: {e}")))
}

//! Artifact download handler.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::proxy::{ARTIFACT_CONTENT_TYPE, ArtifactDownload};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// GET /api/download/:artifact_id - Stream a finished build archive
#[utoipa::path(
    get,
    path = "/api/download/{artifact_id}",
    tag = "builds",
    params(
        ("artifact_id" = u64, Path, description = "Artifact id from the status response")
    ),
    responses(
        (status = 200, description = "Archive stream", content_type = "application/zip"),
        (status = 400, description = "Malformed artifact id", body = crate::error::ApiError),
        (status = 502, description = "Remote refused the download", body = crate::error::ApiError)
    )
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> Result<Response> {
    let artifact_id: u64 = artifact_id
        .parse()
        .map_err(|_| Error::validation("artifactId", "artifact id must be a number"))?;

    let download = state.service.download_artifact(artifact_id).await?;

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                ArtifactDownload::content_disposition(),
            ),
        ],
    )
        .into_response();
    if let Some(length) = download.content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, header::HeaderValue::from(length));
    }
    *response.body_mut() = Body::from_stream(download.body);

    Ok(response)
}

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{Method, StatusCode};
use tracing::{error, info, warn};

use super::{accept, Relayed, BACKOFFICE_PREFIX};
use crate::auth::Credential;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::upload::{self, UploadArtifact, UploadRejection};
use crate::upstream::{upstream_path, UpstreamRequest};

async fn read_file_field(multipart: &mut Multipart) -> AppResult<Option<UploadArtifact>> {
    let mut artifact = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, "invalid multipart data");
        AppError::validation(format!("invalid multipart data: {err}"))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|err| {
            error!(error = %err, "failed to read file bytes");
            AppError::validation(format!("failed to read file bytes: {err}"))
        })?;
        artifact = Some(UploadArtifact::from_part(file_name, content_type, bytes));
    }

    Ok(artifact)
}

pub async fn upload_file(
    State(state): State<AppState>,
    credential: Credential,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Relayed> {
    let artifact = match multipart {
        Ok(mut multipart) => read_file_field(&mut multipart).await?,
        Err(rejection) => {
            warn!(error = %rejection, "upload rejected: body is not multipart");
            None
        }
    };

    let artifact = upload::require_valid(artifact, state.config.upload_max_bytes).map_err(
        |rejection: UploadRejection| {
            warn!(reason = %rejection, "upload rejected");
            AppError::from(rejection)
        },
    )?;

    let file_name = artifact.file_name.clone();
    let size_bytes = artifact.size_bytes();
    let request = UpstreamRequest::new(
        Method::POST,
        upstream_path(BACKOFFICE_PREFIX, &["uploads"]),
    )
    .with_multipart(artifact)
    .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;

    info!(file_name = %file_name, size_bytes, "file relayed upstream");
    Ok(Relayed::new(StatusCode::CREATED, response.payload))
}

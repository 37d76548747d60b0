use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

use super::{accept, parse_json_body, resource_id, BACKOFFICE_PREFIX};
use crate::auth::Credential;
use crate::document::{
    assemble_live, assemble_preview, latest_committee, parse_committees, parse_registration,
    AssembleError, CommitteeOverride, CommitteeRecord, ReregistrationDocument,
};
use crate::error::{AppError, AppResult};
use crate::query::ListQuery;
use crate::state::AppState;
use crate::upstream::{upstream_path, UpstreamRequest};

/// A year rarely has more than a handful of committee records; fetch them in one page.
const COMMITTEE_LOOKUP_LIMIT: u64 = 100;

pub async fn registration_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credential: Credential,
) -> AppResult<Json<ReregistrationDocument>> {
    let id = resource_id(&id)?;
    let request = UpstreamRequest::get(upstream_path(BACKOFFICE_PREFIX, &["registrations", id]))
        .with_credential(Some(credential));
    let response = state.upstream.forward(request).await?;
    if response.status == StatusCode::NOT_FOUND {
        return Err(AssembleError::RecordNotFound("registration").into());
    }
    let response = accept(response)?;

    let mut registration = parse_registration(response.payload)?;
    let committee = registration.committee.take();
    let document = assemble_live(registration, committee.as_ref()).map_err(|err| {
        warn!(registration_id = %id, error = %err, "document could not be assembled");
        err
    })?;

    info!(
        registration_id = %id,
        registration_number = document.document.registration_number,
        "assembled re-registration document"
    );
    Ok(Json(document))
}

pub async fn preview_document(
    State(state): State<AppState>,
    credential: Credential,
    body: Bytes,
) -> AppResult<Json<ReregistrationDocument>> {
    let committee_override: CommitteeOverride = serde_json::from_value(parse_json_body(&body)?)
        .map_err(|err| AppError::validation(format!("invalid committee data: {err}")))?;

    let stored = match committee_override.academic_year_id {
        Some(year) => stored_committee(&state, credential, year).await?,
        None => None,
    };

    Ok(Json(assemble_preview(
        &committee_override,
        stored.as_ref(),
        Utc::now(),
    )))
}

async fn stored_committee(
    state: &AppState,
    credential: Credential,
    academic_year_id: i64,
) -> AppResult<Option<CommitteeRecord>> {
    let query = ListQuery {
        academic_year_id: Some(academic_year_id.to_string()),
        ..ListQuery::default()
    }
    .to_upstream_query(COMMITTEE_LOOKUP_LIMIT);
    let request = UpstreamRequest::get(upstream_path(BACKOFFICE_PREFIX, &["committees"]))
        .with_query(query)
        .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;

    let records = parse_committees(response.payload);
    Ok(latest_committee(&records, academic_year_id).cloned())
}

use axum::extract::{Query, State};
use axum_extra::extract::WithRejection;

use super::{accept, Relayed};
use crate::auth::Credential;
use crate::error::{AppError, AppResult};
use crate::pagination::normalize_collection;
use crate::query::{ListQuery, ALUMNI_DEFAULT_LIMIT};
use crate::state::AppState;
use crate::upstream::UpstreamRequest;

pub async fn landing(
    State(state): State<AppState>,
    credential: Option<Credential>,
) -> AppResult<Relayed> {
    let request = UpstreamRequest::get("landing").with_credential(credential);
    let response = accept(state.upstream.forward(request).await?)?;
    Ok(Relayed::new(response.status, response.payload))
}

pub async fn alumni(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
    credential: Option<Credential>,
) -> AppResult<Relayed> {
    let request = UpstreamRequest::get("alumni")
        .with_query(query.to_upstream_query(ALUMNI_DEFAULT_LIMIT))
        .with_credential(credential);
    let response = accept(state.upstream.forward(request).await?)?;

    let payload = normalize_collection(
        response.payload,
        query.page_request(ALUMNI_DEFAULT_LIMIT),
    );
    Ok(Relayed::new(response.status, payload))
}

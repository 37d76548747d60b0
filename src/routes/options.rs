use axum::{
    extract::{Query, State},
    http::{
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{accept, BACKOFFICE_PREFIX};
use crate::auth::Credential;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::options::{to_options, LookupSpec, ACADEMIC_YEARS, BATCHES, MAJORS};
use crate::query::ListQuery;
use crate::state::AppState;
use crate::upstream::{upstream_path, UpstreamRequest};

/// Lookup lists are small; fetch them in one page.
const OPTIONS_LIMIT: u64 = 100;

pub async fn batches(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
    headers: HeaderMap,
    credential: Credential,
) -> AppResult<Response> {
    lookup(&state, &query, &headers, credential, &BATCHES).await
}

pub async fn academic_years(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
    headers: HeaderMap,
    credential: Credential,
) -> AppResult<Response> {
    lookup(&state, &query, &headers, credential, &ACADEMIC_YEARS).await
}

pub async fn majors(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
    headers: HeaderMap,
    credential: Credential,
) -> AppResult<Response> {
    lookup(&state, &query, &headers, credential, &MAJORS).await
}

async fn lookup(
    state: &AppState,
    query: &ListQuery,
    request_headers: &HeaderMap,
    credential: Credential,
    spec: &LookupSpec,
) -> AppResult<Response> {
    let request = UpstreamRequest::get(upstream_path(
        BACKOFFICE_PREFIX,
        &[spec.upstream_resource],
    ))
    .with_query(query.to_upstream_query(OPTIONS_LIMIT))
    .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;

    let options = to_options(response.payload, spec);
    let body = serde_json::to_vec(&json!({ "data": options }))
        .map_err(AppError::internal)?;
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&body)));

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cache_control(&state.config)) {
        headers.insert(CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(ETAG, value);
    }

    let revalidated = request_headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| if_none_match_hits(value, &etag));
    if revalidated {
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    Ok((
        response.status,
        headers,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// Weak comparison: `W/` prefixes are ignored and `*` matches any current body.
fn if_none_match_hits(header: &str, etag: &str) -> bool {
    let current = etag.trim_start_matches("W/");
    header.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == current
    })
}

/// Advisory freshness metadata; the gateway itself caches nothing.
fn cache_control(config: &AppConfig) -> String {
    format!(
        "private, max-age={}, stale-while-revalidate={}",
        config.options_cache_max_age_seconds, config.options_cache_stale_seconds
    )
}

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
};
use axum_extra::extract::WithRejection;
use tracing::{debug, info};

use super::{accept, parse_json_body, resource_id, Relayed, BACKOFFICE_PREFIX};
use crate::auth::Credential;
use crate::error::{AppError, AppResult};
use crate::pagination::normalize_collection;
use crate::query::{ListQuery, DEFAULT_LIMIT};
use crate::state::AppState;
use crate::upstream::{upstream_path, UpstreamRequest};

/// Back-office collections the gateway relays. Anything else is a 404.
pub const BACKOFFICE_RESOURCES: &[&str] = &[
    "academic-years",
    "alumni",
    "announcements",
    "batches",
    "committees",
    "majors",
    "registrations",
    "users",
];

fn backoffice_resource(resource: &str) -> AppResult<&'static str> {
    BACKOFFICE_RESOURCES
        .iter()
        .copied()
        .find(|known| *known == resource)
        .ok_or_else(|| AppError::not_found(format!("unknown resource '{resource}'")))
}

pub async fn list_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
    credential: Credential,
) -> AppResult<Relayed> {
    let resource = backoffice_resource(&resource)?;
    let upstream_query = query.to_upstream_query(DEFAULT_LIMIT);
    debug!(resource, query = %upstream_query, "listing back-office resource");

    let request = UpstreamRequest::get(upstream_path(BACKOFFICE_PREFIX, &[resource]))
        .with_query(upstream_query)
        .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;

    let payload = normalize_collection(response.payload, query.page_request(DEFAULT_LIMIT));
    Ok(Relayed::new(response.status, payload))
}

pub async fn show_resource(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    credential: Credential,
) -> AppResult<Relayed> {
    relay_show(&state, &resource, &id, credential).await
}

/// `GET /api/committees/preview` shares its path with the preview POST; the
/// GET still addresses the committee record with id `preview`.
pub async fn show_committee_named_preview(
    State(state): State<AppState>,
    credential: Credential,
) -> AppResult<Relayed> {
    relay_show(&state, "committees", "preview", credential).await
}

async fn relay_show(
    state: &AppState,
    resource: &str,
    id: &str,
    credential: Credential,
) -> AppResult<Relayed> {
    let resource = backoffice_resource(resource)?;
    let id = resource_id(id)?;

    let request = UpstreamRequest::get(upstream_path(BACKOFFICE_PREFIX, &[resource, id]))
        .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;
    Ok(Relayed::new(response.status, response.payload))
}

pub async fn create_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    credential: Credential,
    body: Bytes,
) -> AppResult<Relayed> {
    let resource = backoffice_resource(&resource)?;
    let payload = parse_json_body(&body)?;

    let request = UpstreamRequest::new(Method::POST, upstream_path(BACKOFFICE_PREFIX, &[resource]))
        .with_json(payload)
        .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;
    info!(resource, status = %response.status, "created back-office record");
    Ok(Relayed::new(response.status, response.payload))
}

pub async fn update_resource(
    State(state): State<AppState>,
    method: Method,
    Path((resource, id)): Path<(String, String)>,
    credential: Credential,
    body: Bytes,
) -> AppResult<Relayed> {
    let resource = backoffice_resource(&resource)?;
    let id = resource_id(&id)?;
    let payload = parse_json_body(&body)?;

    let request = UpstreamRequest::new(method, upstream_path(BACKOFFICE_PREFIX, &[resource, id]))
        .with_json(payload)
        .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;
    info!(resource, id, status = %response.status, "updated back-office record");
    Ok(Relayed::new(response.status, response.payload))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    credential: Credential,
) -> AppResult<Relayed> {
    let resource = backoffice_resource(&resource)?;
    let id = resource_id(&id)?;

    let request = UpstreamRequest::new(
        Method::DELETE,
        upstream_path(BACKOFFICE_PREFIX, &[resource, id]),
    )
    .with_credential(Some(credential));
    let response = accept(state.upstream.forward(request).await?)?;
    info!(resource, id, "deleted back-office record");
    Ok(Relayed::new(response.status, response.payload))
}

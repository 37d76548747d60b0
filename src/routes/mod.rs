use axum::http::HeaderValue;
use axum::{
    body::Bytes,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{
    auth::Credential,
    error::{AppError, AppResult},
    state::AppState,
    upstream::UpstreamResponse,
};

pub mod documents;
pub mod health;
pub mod options;
pub mod public;
pub mod resources;
pub mod uploads;

pub const BACKOFFICE_PREFIX: &str = "backoffice";

/// Upstream payload relayed with the upstream's own status code.
#[derive(Debug)]
pub struct Relayed {
    pub status: StatusCode,
    pub payload: Value,
}

impl Relayed {
    pub fn new(status: StatusCode, payload: Value) -> Self {
        Self { status, payload }
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }
        (self.status, Json(self.payload)).into_response()
    }
}

/// Keeps 2xx replies; anything else is handed back to the client untouched.
pub(crate) fn accept(response: UpstreamResponse) -> AppResult<UpstreamResponse> {
    if response.is_success() {
        return Ok(response);
    }
    warn!(status = %response.status, "upstream rejected request");
    Err(AppError::upstream_rejected(
        response.status,
        response.payload,
    ))
}

/// Parses an inbound JSON body. An empty body is treated as `{}`.
pub(crate) fn parse_json_body(body: &Bytes) -> AppResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::validation(format!("request body must be valid JSON: {err}")))
}

/// Rejects ids that would change the meaning of the upstream path.
pub(crate) fn resource_id(id: &str) -> AppResult<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(AppError::not_found("record not found"));
    }
    Ok(trimmed)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        warn!(origin = %trimmed, "ignoring invalid CORS allowed origin");
                        None
                    }
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let public_routes = Router::new()
        .route("/api/public/landing", get(public::landing))
        .route("/api/public/alumni", get(public::alumni));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .route("/api/options/batches", get(options::batches))
        .route("/api/options/academic-years", get(options::academic_years))
        .route("/api/options/majors", get(options::majors))
        .route("/api/uploads", post(uploads::upload_file))
        .route(
            "/api/registrations/:id/document",
            get(documents::registration_document),
        )
        .route(
            "/api/committees/preview",
            get(resources::show_committee_named_preview).post(documents::preview_document),
        )
        .route(
            "/api/:resource",
            get(resources::list_resource).post(resources::create_resource),
        )
        .route(
            "/api/:resource/:id",
            get(resources::show_resource)
                .put(resources::update_resource)
                .patch(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .layer(middleware::from_extractor_with_state::<Credential, _>(
            protected_state,
        ));

    let body_limit = state.config.request_body_limit_bytes;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
}

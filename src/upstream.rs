use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{multipart, Client};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::auth::Credential;
use crate::config::AppConfig;
use crate::upload::UploadArtifact;

/// Characters left alone when an inbound id is embedded in an upstream path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream replied {status} with a body that is not JSON: {source}")]
    Decode {
        status: StatusCode,
        source: serde_json::Error,
    },
    #[error("cannot build upstream url for {path}: {source}")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone)]
pub enum UpstreamBody {
    Empty,
    Json(Value),
    Multipart(UploadArtifact),
}

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: UpstreamBody,
    pub credential: Option<Credential>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: UpstreamBody::Empty,
            credential: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = UpstreamBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, artifact: UploadArtifact) -> Self {
        self.body = UpstreamBody::Multipart(artifact);
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub payload: Value,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, payload: Value) -> Self {
        Self { status, payload }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// One round trip to the upstream API. Implementations never retry.
#[async_trait]
pub trait UpstreamApi: Send + Sync + 'static {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// Joins a prefix and raw segments into a relative upstream path, encoding each segment.
pub fn upstream_path(prefix: &str, segments: &[&str]) -> String {
    let mut path = prefix.trim_matches('/').to_string();
    for segment in segments {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&utf8_percent_encode(segment, PATH_SEGMENT).to_string());
    }
    path
}

pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.upstream_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.upstream_api_url.clone(),
        })
    }

    fn resolve(&self, path: &str, query: Option<&str>) -> Result<Url, UpstreamError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| UpstreamError::InvalidPath {
                path: path.to_string(),
                source,
            })?;
        url.set_query(query);
        Ok(url)
    }
}

#[async_trait]
impl UpstreamApi for UpstreamClient {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.resolve(&request.path, request.query.as_deref())?;
        debug!(method = %request.method, %url, "forwarding request upstream");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(credential) = &request.credential {
            builder = builder.bearer_auth(credential.token());
        }

        builder = match request.body {
            UpstreamBody::Empty => builder,
            UpstreamBody::Json(body) => builder.json(&body),
            UpstreamBody::Multipart(artifact) => {
                let length = artifact.bytes.len() as u64;
                let part = multipart::Part::stream_with_length(artifact.bytes, length)
                    .file_name(artifact.file_name)
                    .mime_str(&artifact.mime_type)?;
                builder.multipart(multipart::Form::new().part("file", part))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let payload = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|source| UpstreamError::Decode { status, source })?
        };

        debug!(%status, "upstream replied");
        Ok(UpstreamResponse { status, payload })
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use admissions_gateway::config::AppConfig;
use admissions_gateway::routes;
use admissions_gateway::state::AppState;
use admissions_gateway::upstream::{
    UpstreamApi, UpstreamError, UpstreamRequest, UpstreamResponse,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use url::Url;
use uuid::Uuid;

pub const TOKEN: &str = "test-token";

/// Scripted upstream reply.
#[allow(dead_code)]
pub enum FakeReply {
    Json(StatusCode, Value),
    /// A 200 whose body is not JSON.
    Garbage,
}

/// In-memory upstream that records every forwarded request.
pub struct FakeUpstream {
    requests: Mutex<Vec<UpstreamRequest>>,
    replies: Mutex<VecDeque<FakeReply>>,
}

impl Default for FakeUpstream {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl UpstreamApi for FakeUpstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        self.requests.lock().await.push(request);
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| FakeReply::Json(StatusCode::OK, json!({})));
        match reply {
            FakeReply::Json(status, payload) => Ok(UpstreamResponse::new(status, payload)),
            FakeReply::Garbage => {
                let source = serde_json::from_str::<Value>("<html>proxy error</html>")
                    .expect_err("html is not json");
                Err(UpstreamError::Decode {
                    status: StatusCode::OK,
                    source,
                })
            }
        }
    }
}

impl FakeUpstream {
    #[allow(dead_code)]
    pub async fn reply(&self, reply: FakeReply) {
        self.replies.lock().await.push_back(reply);
    }

    #[allow(dead_code)]
    pub async fn reply_json(&self, status: StatusCode, payload: Value) {
        self.reply(FakeReply::Json(status, payload)).await;
    }

    #[allow(dead_code)]
    pub async fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().await.clone()
    }

    #[allow(dead_code)]
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

pub struct TestApp {
    router: Router,
    upstream: Arc<FakeUpstream>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::with_upstream(
            Url::parse("http://upstream.test/api/").expect("valid test url"),
        );
        let upstream = Arc::new(FakeUpstream::default());
        let upstream_for_state: Arc<dyn UpstreamApi> = upstream.clone();
        let state = AppState::new(config, upstream_for_state);
        let router = routes::create_router(state);

        Self { router, upstream }
    }

    pub fn upstream(&self) -> Arc<FakeUpstream> {
        self.upstream.clone()
    }

    async fn send(&self, request: Request<Body>) -> hyper::Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.get_with_headers(path, token, &[]).await
    }

    #[allow(dead_code)]
    pub async fn get_with_headers(
        &self,
        path: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty())?;
        Ok(self.send(request).await)
    }

    #[allow(dead_code)]
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self.send(request).await)
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self.send(request).await)
    }

    /// Posts a multipart form. `file` is `(filename, content_type, bytes)`;
    /// `None` sends a form with only an unrelated text field.
    #[allow(dead_code)]
    pub async fn upload(
        &self,
        path: &str,
        file: Option<(&str, &str, &[u8])>,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();
        match file {
            Some((filename, content_type, data)) => {
                body.extend(format!("--{boundary}\r\n").as_bytes());
                body.extend(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                        filename
                    )
                    .as_bytes(),
                );
                body.extend(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
                body.extend(data);
                body.extend(b"\r\n");
            }
            None => {
                body.extend(format!("--{boundary}\r\n").as_bytes());
                body.extend(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n");
                body.extend(b"no file attached");
                body.extend(b"\r\n");
            }
        }
        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            );
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self.send(request).await)
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn body_to_json(body: Body) -> Result<Value> {
    let bytes = body_to_vec(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

use std::sync::Arc;

use crate::{config::AppConfig, upstream::UpstreamApi};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub upstream: Arc<dyn UpstreamApi>,
}

impl AppState {
    pub fn new(config: AppConfig, upstream: Arc<dyn UpstreamApi>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }
}

//! HTTP API for the research agent

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::ResearchRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ResearchRuntime>,
}

impl AppState {
    pub fn new(runtime: ResearchRuntime) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }
}

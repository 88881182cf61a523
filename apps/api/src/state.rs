use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// GenAI gateway. `GeminiClient` in production; tests inject a scripted fake.
    pub llm: Arc<dyn LlmGateway>,
    pub config: Config,
}

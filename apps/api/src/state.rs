use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every review is independent.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable completion backend. Default: `LlmClient` (Anthropic Messages API).
    pub llm: Arc<dyn CompletionProvider>,
    pub config: Config,
}

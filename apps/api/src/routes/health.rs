use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::llm_client::prompts::{PING_PROMPT, PING_SYSTEM};
use crate::llm_client::SamplingParams;
use crate::state::AppState;

const PING_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.0,
    max_tokens: 32,
};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-review-api"
    }))
}

/// GET /api/test-llm
/// Sends a fixed prompt to the model provider to verify credentials and connectivity.
pub async fn llm_ping_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.llm.complete(PING_SYSTEM, PING_PROMPT, PING_PARAMS).await {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "LLM API is working correctly",
                "response": response
            })),
        ),
        Err(e) => {
            tracing::error!("LLM API test error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string()
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::{CompletionProvider, LlmError, LlmClient};
    use crate::routes::build_router;

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        async fn complete(
            &self,
            _system: &str,
            _prompt: &str,
            _params: SamplingParams,
        ) -> Result<String, LlmError> {
            Ok("API is working".to_string())
        }
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = build_router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn state_with(llm: Arc<dyn CompletionProvider>) -> AppState {
        AppState {
            llm,
            config: Config::default(),
        }
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let (status, body) = get(state_with(Arc::new(EchoProvider)), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_llm_ping_success() {
        let (status, body) = get(state_with(Arc::new(EchoProvider)), "/api/test-llm").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["response"], "API is working");
    }

    #[tokio::test]
    async fn test_llm_ping_reports_missing_key() {
        let client = LlmClient::new(None, std::time::Duration::from_secs(1)).unwrap();
        let (status, body) = get(state_with(Arc::new(client)), "/api/test-llm").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("ANTHROPIC_API_KEY"));
    }
}

//! Analysis Client: one completion call per review with fixed sampling.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{CompletionProvider, LlmError, SamplingParams};
use crate::review::prompts::REVIEW_SYSTEM;

/// Sampling used for every review.
pub const REVIEW_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.7,
    max_tokens: 2000,
};

/// Sends the built review prompt and returns the raw reply text.
///
/// An empty string means the provider answered without text content; the
/// sanitizer turns that into the fallback review.
pub async fn request_review(
    provider: &dyn CompletionProvider,
    prompt: &str,
) -> Result<String, LlmError> {
    let system = format!("{REVIEW_SYSTEM} {JSON_ONLY_SYSTEM}");
    provider.complete(&system, prompt, REVIEW_PARAMS).await
}

// Resume Review pipeline.
// Implements: file extraction, whitespace normalization, prompt building,
// the model call, and reply sanitization.
// All LLM calls go through llm_client; no direct Anthropic calls here.

pub mod analysis;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod sanitize;
pub mod submission;

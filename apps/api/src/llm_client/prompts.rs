// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Fixed prompt used by the connectivity probe.
pub const PING_PROMPT: &str =
    "Hello, please respond with \"API is working\" if you can read this message.";

pub const PING_SYSTEM: &str = "You are a health-check responder. Reply in one short sentence.";

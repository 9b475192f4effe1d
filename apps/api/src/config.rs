use anyhow::{Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
///
/// The API key is optional at startup: a missing key is reported per request
/// as an upstream configuration failure so the service can still boot.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// When set, unclassified upstream failures answer 200 with the degraded
    /// review instead of a 502.
    pub fallback_on_upstream_error: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            fallback_on_upstream_error: parse_env("FALLBACK_ON_UPSTREAM_ERROR", true)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            anthropic_api_key: None,
            port: 8080,
            rust_log: "info".to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            fallback_on_upstream_error: true,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

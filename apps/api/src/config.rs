use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Inference-tier API keys are optional by design: a tier without
/// credentials stays in the chain but is skipped by the orchestrator.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    /// Redis connection URL; absent falls back to the in-process cache.
    pub redis_url: Option<String>,
    pub prefilter_threshold: u8,
    pub default_concurrency: usize,
    pub cache_ttl: Duration,
    pub hybrid_enabled: bool,
    /// Max in-flight requests per inference provider.
    pub provider_max_in_flight: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5".to_string()),
            redis_url: optional_env("REDIS_URL"),
            prefilter_threshold: parse_env("PREFILTER_THRESHOLD", 70)?,
            default_concurrency: parse_env("ANALYSIS_CONCURRENCY", 5)?,
            cache_ttl: Duration::from_secs(parse_env(
                "ANALYSIS_CACHE_TTL_SECS",
                7 * 24 * 60 * 60,
            )?),
            hybrid_enabled: parse_env("HYBRID_SCORING_ENABLED", true)?,
            provider_max_in_flight: parse_env("PROVIDER_MAX_IN_FLIGHT", 4)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Treats unset AND empty variables as absent, so `KEY=` in a .env file
/// does not masquerade as a credential.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_returns_default_when_unset() {
        assert_eq!(
            parse_env::<u16>("JOBMATCH_TEST_UNSET_VAR", 8080).unwrap(),
            8080
        );
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("JOBMATCH_TEST_PORT_VAR", "9999");
        assert_eq!(parse_env::<u16>("JOBMATCH_TEST_PORT_VAR", 8080).unwrap(), 9999);
        std::env::remove_var("JOBMATCH_TEST_PORT_VAR");
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("JOBMATCH_TEST_BAD_VAR", "not-a-number");
        assert!(parse_env::<u16>("JOBMATCH_TEST_BAD_VAR", 8080).is_err());
        std::env::remove_var("JOBMATCH_TEST_BAD_VAR");
    }

    #[test]
    fn test_optional_env_ignores_empty_values() {
        std::env::set_var("JOBMATCH_TEST_EMPTY_VAR", "   ");
        assert!(optional_env("JOBMATCH_TEST_EMPTY_VAR").is_none());
        std::env::remove_var("JOBMATCH_TEST_EMPTY_VAR");
    }
}

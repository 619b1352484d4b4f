use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

const DEFAULT_NEXT_GEN_PATTERN: &str = r"(?i)gemini-2\.5";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub provider: ProviderConfig,
}

/// Everything the LLM client needs, resolved once and handed over at construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub vertex_project: Option<String>,
    pub vertex_location: String,
    /// Route every call to Vertex regardless of model name.
    pub force_vertex: bool,
    pub vertex_access_token: Option<String>,
    /// Model names matching this regex go to Vertex.
    pub next_gen_pattern: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            vertex_project: None,
            vertex_location: "us-central1".to_string(),
            force_vertex: false,
            vertex_access_token: None,
            next_gen_pattern: DEFAULT_NEXT_GEN_PATTERN.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider: ProviderConfig::from_env()?,
        })
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = ProviderConfig::default();
        Ok(ProviderConfig {
            model: optional_env("GOOGLE_MODEL").unwrap_or(defaults.model),
            api_key: optional_env("GOOGLE_API_KEY"),
            vertex_project: optional_env("GOOGLE_PROJECT_ID"),
            vertex_location: optional_env("GOOGLE_LOCATION").unwrap_or(defaults.vertex_location),
            force_vertex: optional_env("GOOGLE_VERTEX")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            vertex_access_token: optional_env("GOOGLE_VERTEX_ACCESS_TOKEN"),
            next_gen_pattern: optional_env("GOOGLE_NEXT_GEN_PATTERN")
                .unwrap_or(defaults.next_gen_pattern),
            timeout_secs: match optional_env("LLM_TIMEOUT_SECS") {
                Some(raw) => raw
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
                None => defaults.timeout_secs,
            },
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("no"));
    }

    #[test]
    fn test_provider_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.vertex_location, "us-central1");
        assert!(!config.force_vertex);
        assert!(config.api_key.is_none());
    }
}

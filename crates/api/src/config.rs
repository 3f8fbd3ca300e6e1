use std::env;
use std::time::Duration;

use medicheck_llm::OllamaConfig;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub ollama: OllamaConfig,
    /// `None` keeps reminders and history in process memory.
    pub database_url: Option<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    /// Read the client address from `x-forwarded-for`. Only safe behind a proxy that sets it.
    pub trust_forwarded: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            ollama: OllamaConfig::default(),
            database_url: None,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 60,
            allowed_origins: default_allowed_origins(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            trust_forwarded: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind: env::var("MEDICHECK_BIND").unwrap_or(defaults.bind),
            ollama: OllamaConfig::from_env(),
            database_url: env::var("MEDICHECK_DATABASE_URL")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            rate_limit_window: env::var("MEDICHECK_RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env::var("MEDICHECK_RATE_LIMIT_MAX")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
            allowed_origins: env::var("MEDICHECK_ALLOWED_ORIGINS")
                .ok()
                .map(|value| parse_origin_list(&value))
                .unwrap_or(defaults.allowed_origins),
            max_body_bytes: env::var("MEDICHECK_MAX_BODY_BYTES")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.max_body_bytes),
            trust_forwarded: env::var("MEDICHECK_TRUST_FORWARDED")
                .ok()
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.trust_forwarded),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .map(|value| value.to_string())
    .collect()
}

fn parse_origin_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

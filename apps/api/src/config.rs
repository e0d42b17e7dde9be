use std::str::FromStr;

use anyhow::{ensure, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a numeric one is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_attempts: u32,
    pub interview_topic: String,
    pub question_limit: usize,
    /// Max history messages replayed into prompts. 0 disables the window.
    pub history_window: usize,
    pub request_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(lookup);

        let config = Config {
            openai_api_key: vars.require("OPENAI_API_KEY")?,
            openai_base_url: vars.or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            llm_model: vars.or("LLM_MODEL", "gpt-4o"),
            llm_timeout_secs: vars.parse("LLM_TIMEOUT_SECS", 60)?,
            llm_max_attempts: vars.parse("LLM_MAX_ATTEMPTS", 3)?,
            interview_topic: vars.or("INTERVIEW_TOPIC", "Excel"),
            question_limit: vars.parse("QUESTION_LIMIT", 5)?,
            history_window: vars.parse("HISTORY_WINDOW", 40)?,
            request_timeout_secs: vars.parse("REQUEST_TIMEOUT_SECS", 120)?,
            port: vars.parse("PORT", 8000)?,
            rust_log: vars.or("RUST_LOG", "info"),
        };

        ensure!(config.question_limit >= 1, "QUESTION_LIMIT must be at least 1");
        ensure!(config.llm_max_attempts >= 1, "LLM_MAX_ATTEMPTS must be at least 1");

        Ok(config)
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn require(&self, key: &str) -> Result<String> {
        (self.0)(key).with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match (self.0)(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
            None => Ok(default),
        }
    }
}

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
/// The pipeline itself never touches the environment — everything it needs
/// is injected from here at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub model: String,
    pub llm_timeout_secs: u64,
    pub airtable_token: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_table: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            model: std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
            airtable_token: std::env::var("AIRTABLE_TOKEN").ok(),
            airtable_base_id: std::env::var("AIRTABLE_BASE_ID").ok(),
            airtable_table: std::env::var("AIRTABLE_TABLE_NAME")
                .unwrap_or_else(|_| "Candidates".to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Whether the Airtable sink has enough configuration to go live.
    pub fn airtable_configured(&self) -> bool {
        self.airtable_token.is_some() && self.airtable_base_id.is_some()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

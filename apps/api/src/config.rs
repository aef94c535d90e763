use anyhow::{Context, Result};

use crate::github::DEFAULT_API_URL;
use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Variables the service starts without but cannot do live work without.
const RECOMMENDED_VARS: [&str; 2] = ["GITHUB_TOKEN", "OPENROUTER_API_KEY"];

/// Application configuration loaded from environment variables.
/// Only a malformed `PORT` aborts startup; missing keys degrade at request time.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub ai_model: String,
    pub demo_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            github_token: optional_env("GITHUB_TOKEN"),
            github_api_url: optional_env("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            openrouter_base_url: optional_env("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ai_model: optional_env("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            demo_mode: optional_env("DEMO_MODE").is_some_and(|v| parse_flag(&v)),
        })
    }

    /// Names of recommended variables that are unset, in declaration order.
    pub fn missing_recommended(&self) -> Vec<&'static str> {
        RECOMMENDED_VARS
            .into_iter()
            .filter(|key| match *key {
                "GITHUB_TOKEN" => self.github_token.is_none(),
                "OPENROUTER_API_KEY" => self.openrouter_api_key.is_none(),
                _ => false,
            })
            .collect()
    }
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

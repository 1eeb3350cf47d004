use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream opportunity backend.
    pub backend_api_url: String,
    /// Directory holding `{codeset}_{lang}.json` lookup tables.
    pub codeset_dir: PathBuf,
    /// Directory holding `{lang}/{namespace}.json` translation catalogs,
    /// used by the i18n-scan tool.
    pub locales_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_api_url: require_env("BACKEND_API_URL")?,
            codeset_dir: PathBuf::from(require_env("CODESET_DIR")?),
            locales_dir: std::env::var("LOCALES_DIR")
                .unwrap_or_else(|_| "locales".to_string())
                .into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub database_path: PathBuf,
    pub subject_rules_path: PathBuf,
    pub universities_path: PathBuf,
    pub colleges_path: PathBuf,
    pub payment_details: String,
    /// Shared secret for the payment webhook; `None` leaves it open.
    pub payment_webhook_secret: Option<String>,
    pub poll_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value lookup.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            telegram_token: get("TELEGRAM_TOKEN")
                .context("Required environment variable 'TELEGRAM_TOKEN' is not set")?,
            telegram_api_url: or("TELEGRAM_API_URL", "https://api.telegram.org"),
            database_path: or("DATABASE_PATH", "database.json").into(),
            subject_rules_path: or("SUBJECT_RULES_PATH", "data/subject_rules.json").into(),
            universities_path: or("UNIVERSITIES_PATH", "data/universities.json").into(),
            colleges_path: or("COLLEGES_PATH", "data/colleges.json").into(),
            payment_details: or("PAYMENT_DETAILS", "Kaspi Gold: 8702 *** ****"),
            payment_webhook_secret: get("PAYMENT_WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            poll_timeout_secs: or("POLL_TIMEOUT_SECS", "30")
                .parse()
                .context("POLL_TIMEOUT_SECS must be a whole number of seconds")?,
            port: or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or("RUST_LOG", "info"),
        })
    }
}

use anyhow::{Context, Result};
use std::env;

/// Default local database file, created on first run.
const DEFAULT_DATABASE_URL: &str = "sqlite://wg-gesucht-analysis.sqlite?mode=rwc";

/// Runtime configuration, loaded from the environment (a `.env` file in the
/// working directory is honored).
#[derive(Debug, Clone)]
pub struct Config {
    /// WG-Gesucht account email or username
    pub username: String,
    /// WG-Gesucht account password
    pub password: String,
    /// Where to persist scraped conversations
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            username: env::var("WG_GESUCHT_USERNAME")
                .context("WG_GESUCHT_USERNAME is not set")?,
            password: env::var("WG_GESUCHT_PASSWORD")
                .context("WG_GESUCHT_PASSWORD is not set")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
        })
    }
}

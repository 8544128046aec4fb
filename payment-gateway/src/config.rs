use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bank_url: String,
    pub bank_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8087".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;
        let bank_url = env::var("BANK_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let bank_timeout_secs = env::var("BANK_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(10);

        Ok(Self {
            host,
            port,
            bank_url,
            bank_timeout: Duration::from_secs(bank_timeout_secs.max(1)),
        })
    }
}

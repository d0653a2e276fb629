use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1/";
pub const DEFAULT_AUTH_BASE: &str = "https://accounts.spotify.com/";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_CONCURRENCY: usize = 8;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub api_base: String,
    /// Accounts service root; the token endpoint is `api/token` under it.
    pub auth_base: String,
    pub bind_addr: String,
    /// Upper bound on concurrent track-detail requests per collection.
    pub max_concurrency: usize,
    pub request_timeout: Duration,
}

impl Config {
    /// Builds a config with the given credentials and default endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            spotify_client_id: client_id.into(),
            spotify_client_secret: client_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let spotify_client_id = std::env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| AppError::Config("SPOTIFY_CLIENT_ID not set".into()))?;

        let spotify_client_secret = std::env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| AppError::Config("SPOTIFY_CLIENT_SECRET not set".into()))?;

        let mut config = Self::new(spotify_client_id, spotify_client_secret);

        if let Ok(api_base) = std::env::var("SPOTIFY_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(auth_base) = std::env::var("SPOTIFY_AUTH_BASE") {
            config.auth_base = auth_base;
        }
        if let Ok(bind_addr) = std::env::var("TRACKRANK_BIND_ADDR") {
            config.bind_addr = bind_addr;
        }
        if let Ok(value) = std::env::var("TRACKRANK_MAX_CONCURRENCY") {
            config.max_concurrency = parse_positive("TRACKRANK_MAX_CONCURRENCY", &value)?;
        }
        if let Ok(value) = std::env::var("TRACKRANK_REQUEST_TIMEOUT_SECS") {
            let secs = parse_positive("TRACKRANK_REQUEST_TIMEOUT_SECS", &value)?;
            config.request_timeout = Duration::from_secs(secs as u64);
        }

        Ok(config)
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET".to_string());
        }

        missing
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::Config(format!(
            "{} must be a positive integer, got '{}'",
            name, value
        ))),
    }
}

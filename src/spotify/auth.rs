use chrono::{DateTime, TimeDelta, Utc};
use rspotify::http::HttpError;
use rspotify::{ClientCredsSpotify, ClientError, Credentials, Token};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Tokens are refreshed this long before they actually expire.
const REFRESH_AHEAD_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

fn is_fresh(token: &Token, now: DateTime<Utc>) -> bool {
    token
        .expires_at
        .is_some_and(|expires_at| now + TimeDelta::seconds(REFRESH_AHEAD_SECS) < expires_at)
}

/// Client-credentials token source shared by every request in the process.
///
/// The token lives in the rspotify client, which every catalog call reads
/// from. Refreshes are serialized, so callers that arrive while a token is
/// being exchanged wait for that exchange instead of starting their own.
pub struct TokenProvider {
    spotify: ClientCredsSpotify,
    refresh: Mutex<()>,
}

impl TokenProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let missing = config.get_missing_config();
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing Spotify credentials: {}",
                missing.join(", ")
            )));
        }

        let creds = Credentials::new(&config.spotify_client_id, &config.spotify_client_secret);
        let spotify_config = rspotify::Config {
            api_base_url: config.api_base.clone(),
            auth_base_url: config.auth_base.clone(),
            // refresh-ahead happens in access_token
            token_refreshing: false,
            ..Default::default()
        };

        Ok(Self {
            spotify: ClientCredsSpotify::with_config(creds, spotify_config),
            refresh: Mutex::new(()),
        })
    }

    pub fn spotify(&self) -> &ClientCredsSpotify {
        &self.spotify
    }

    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.fresh_token().await? {
            return Ok(token.access_token);
        }

        let _refresh = self.refresh.lock().await;
        // another caller may have refreshed while this one waited
        if let Some(token) = self.fresh_token().await? {
            return Ok(token.access_token);
        }

        if let Err(err) = self.spotify.request_token().await {
            return Err(token_error(err).await);
        }

        let token = self.cached_token().await?.ok_or_else(|| AppError::Auth {
            status: None,
            message: "token endpoint returned no token".into(),
        })?;
        info!(
            "Obtained Spotify access token (expires in {}s)",
            token.expires_in.num_seconds()
        );
        Ok(token.access_token)
    }

    /// Drops the cached token so the next caller re-authenticates.
    pub async fn invalidate(&self) {
        if let Ok(mut token) = self.spotify.token.lock().await {
            if token.take().is_some() {
                debug!("Discarded cached Spotify access token");
            }
        }
    }

    async fn cached_token(&self) -> Result<Option<Token>> {
        let token = self.spotify.token.lock().await.map_err(|_| AppError::Auth {
            status: None,
            message: "token cache unavailable".into(),
        })?;
        Ok(token.clone())
    }

    async fn fresh_token(&self) -> Result<Option<Token>> {
        Ok(self
            .cached_token()
            .await?
            .filter(|token| is_fresh(token, Utc::now())))
    }
}

async fn token_error(err: ClientError) -> AppError {
    match err {
        ClientError::Http(http) => match *http {
            HttpError::StatusCode(response) => {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                warn!("Spotify token request failed ({}): {}", status, error_text);
                AppError::Auth {
                    status: Some(status.as_u16()),
                    message: token_error_message(&error_text),
                }
            }
            HttpError::Client(e) => AppError::Http(e),
        },
        other => AppError::Auth {
            status: None,
            message: format!("Failed to obtain token: {}", other),
        },
    }
}

fn token_error_message(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => err.error_description.unwrap_or(err.error),
        Err(_) if body.is_empty() => "token request rejected".to_string(),
        Err(_) => body.to_string(),
    }
}

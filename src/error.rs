use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spotify authentication failed: {message}")]
    Auth { status: Option<u16>, message: String },

    #[error("Spotify API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// HTTP status reported to callers at the boundary.
    ///
    /// Upstream failures mirror the provider's status; anything without a
    /// known status is a generic server error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Upstream { status, .. } => *status,
            AppError::Auth {
                status: Some(status),
                ..
            } => *status,
            AppError::Http(e) => e.status().map(|s| s.as_u16()).unwrap_or(500),
            AppError::Auth { status: None, .. }
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Json(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

use thiserror::Error;

use crate::domain::selection::Rejection;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Session expired or not logged in, please log in again")]
    Unauthorized,

    #[error("Property not found: {id}")]
    PropertyNotFound { id: String },

    #[error("Invalid parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("Please select both check-in and check-out dates")]
    MissingSelection,

    #[error("User ID is missing. Please log in again.")]
    MissingUserId,

    #[error("Property ID is missing.")]
    MissingPropertyId,

    #[error("Date selection rejected: {0}")]
    Selection(#[from] Rejection),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl BookingError {
    /// Validation and selection errors are the caller's to fix; nothing is
    /// gained by sending the same request again.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParams { .. }
                | Self::MissingSelection
                | Self::MissingUserId
                | Self::MissingPropertyId
                | Self::Selection(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

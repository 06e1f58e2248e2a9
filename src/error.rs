//! Error types for CropSync

use std::time::Duration;
use thiserror::Error;

use crate::sync::MutationKind;

/// Result type alias for CropSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl Error {
    /// Whether a failed remote mutation may succeed if replayed later.
    ///
    /// Only remote failures are retryable; anything raised locally is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(err) => err.is_retryable(),
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Whether the API applied the request even though the call failed.
    pub fn reached_server(&self) -> bool {
        matches!(self, Error::Api(ApiError::UnreadableBody(_)))
    }

    /// Wait the server asked for before the next request, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Api(ApiError::RateLimit(after)) => Some(*after),
            _ => None,
        }
    }
}

/// API-related errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check `api_token` in your cropsync config.")]
    Unauthorized,

    #[error("Access denied. You don't have permission to access this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Success status with a body that could not be decoded
    #[error("The API accepted the request but its response could not be read: {0}")]
    UnreadableBody(String),
}

impl ApiError {
    /// 4xx-equivalent failures will never succeed on replay; everything else might.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_)
            | ApiError::ServerError(_)
            | ApiError::RateLimit(_)
            | ApiError::InvalidResponse(_) => true,
            ApiError::Unauthorized
            | ApiError::Forbidden
            | ApiError::NotFound(_)
            | ApiError::BadRequest(_)
            | ApiError::Rejected { .. }
            | ApiError::UnreadableBody(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Errors raised by the offline synchronization core
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No cached data available for '{key}' while offline")]
    NoCachedData { key: String },

    #[error("Gave up on {operation} #{id} after {attempts} failed attempts")]
    RetryExhausted {
        id: u64,
        operation: MutationKind,
        attempts: u32,
    },

    #[error("The API rejected {operation} #{id}: {reason}")]
    Rejected {
        id: u64,
        operation: MutationKind,
        reason: String,
    },

    #[error("{0} change(s) could not be synced and will be discarded on exit")]
    Unsynced(usize),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Create ~/.cropsync/config.yaml or pass --config.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("No farm selected. Pass --farm <ID> or set `farm_id` in the config.")]
    MissingFarmId,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

//! Error types for route preloading

use thiserror::Error;

/// Result type for preload operations
pub type Result<T> = std::result::Result<T, PreloadError>;

/// Errors that can occur while configuring or running route preloads
#[derive(Error, Debug)]
pub enum PreloadError {
    /// Route module failed to load (chunk-load error)
    #[error("Route module failed to load: {0}")]
    LoadFailed(String),

    /// Network error while fetching a route module
    #[error("Network error: {0}")]
    Network(String),

    /// Fetch was aborted by the host
    #[error("Preload aborted")]
    Aborted,

    /// Route key or prefix registered twice
    #[error("Route already registered: {0}")]
    DuplicateRoute(String),

    /// Path prefix is not an absolute path
    #[error("Invalid route prefix: {0}")]
    InvalidPrefix(String),

    /// Route key not present in the registry
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreloadError {
    /// Check if this error came out of a load attempt.
    ///
    /// Load failures are contained by the scheduler and only cause the
    /// route to become eligible for another preload.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            PreloadError::LoadFailed(_) | PreloadError::Network(_) | PreloadError::Aborted
        )
    }
}

impl From<url::ParseError> for PreloadError {
    fn from(e: url::ParseError) -> Self {
        PreloadError::InvalidUrl(e.to_string())
    }
}

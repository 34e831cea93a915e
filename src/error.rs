//! Error types for the drive_sync crate.

use thiserror::Error;

/// Errors that abort a sync run.
///
/// Per-file problems during the sync itself are reported as
/// [`SyncOutcome`](crate::sync::SyncOutcome) values instead.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid client secret: {0}")]
    InvalidClientSecretError(String),

    #[error("Unable to persist token to {path}: {message}")]
    TokenPersistError { path: String, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("No folder named '{0}' found")]
    FolderNotFound(String),

    #[error("No files found in folder '{0}'")]
    EmptyFolder(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),
}

impl DriveError {
    /// Errors that make every further request pointless, so a sync stops
    /// instead of recording them per file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationError(_)
                | Self::TokenRefreshError(_)
                | Self::TokenPersistError { .. }
        )
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;

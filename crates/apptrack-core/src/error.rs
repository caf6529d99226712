//! Error types for AppTrack.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AppTrackError>;

#[derive(Debug, Error)]
pub enum AppTrackError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

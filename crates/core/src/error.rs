//! Error types for the core crate

use thiserror::Error;

/// Result type alias using [`CoreError`]
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid inline audio: {0}")]
    InvalidAudio(#[from] base64::DecodeError),

    #[error("No playable audio for model: {0}")]
    NoAudio(String),
}

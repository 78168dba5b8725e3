//! Synthesis backend client
//!
//! The backend is consumed through the [`TtsBackend`] trait so the
//! dispatcher can run against the real HTTP API or an in-memory fake.

pub mod backend;
pub mod http;

pub use backend::TtsBackend;
pub use http::HttpBackend;

use std::fmt;

use thiserror::Error;

/// Backend operation, used to phrase failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchCatalog,
    Synthesize,
    SynthesizeBatch,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self {
            Operation::FetchCatalog => "Failed to fetch catalog",
            Operation::Synthesize => "Synthesize failed",
            Operation::SynthesizeBatch => "Batch synthesize failed",
        };
        f.write_str(prefix)
    }
}

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{operation}: {status}")]
    Status { operation: Operation, status: u16 },

    #[error("{operation}: {message}")]
    Transport { operation: Operation, message: String },

    #[error("{operation}: invalid response body: {message}")]
    Decode { operation: Operation, message: String },

    #[error("Invalid backend base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// Classify a reqwest failure
    pub(crate) fn from_reqwest(operation: Operation, err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode {
                operation,
                message: err.to_string(),
            }
        } else {
            ClientError::Transport {
                operation,
                message: err.to_string(),
            }
        }
    }
}

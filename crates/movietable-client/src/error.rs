//! Error types for Movies table operations.

use std::path::PathBuf;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

use crate::record::MovieKey;

/// Errors returned by `MovieClient` and `TableStore` methods.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("movie not found: {0}")]
    NotFound(MovieKey),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Wrap an SDK failure, keeping the full error chain in the message.
    pub(crate) fn service<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        ClientError::Service {
            operation,
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

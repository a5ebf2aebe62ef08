//! Centralized error types for mailbot.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailbot library.
#[derive(Error, Debug)]
pub enum MailbotError {
    /// A mail server could not be reached or dropped the session.
    #[error("Connection to '{server}' failed: {reason}")]
    Connection { server: String, reason: String },

    /// A mail server rejected the credentials.
    #[error("Authentication on '{server}' failed: {reason}")]
    Auth { server: String, reason: String },

    /// An outbound message could not be built or transmitted.
    #[error("Send error: {0}")]
    Send(String),

    /// A message part could not be turned into text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The configuration file is missing, unreadable or invalid.
    #[error("Invalid configuration '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The notification endpoint could not be called.
    #[error("Notification error: {0}")]
    Notify(String),
}

/// Convenience alias for `Result<T, MailbotError>`.
pub type Result<T> = std::result::Result<T, MailbotError>;

impl MailbotError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Config` variant from a path and any displayable reason.
    pub fn config(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for failures that mean the remote server is unusable this cycle.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Auth { .. } | Self::Send(_)
        )
    }
}

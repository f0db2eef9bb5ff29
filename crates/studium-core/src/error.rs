//! Error types for the Studium client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Studium client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum StudiumError {
    /// Input rejected by client-side validation; no network call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A request with the same fingerprint is already pending.
    #[error("Request already in progress: {fingerprint}")]
    DuplicateInFlight { fingerprint: String },

    /// Transport-level failure (connection, timeout, protocol).
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    /// Backend responded with an error status; `detail` carries the
    /// backend's own message when one was provided.
    #[error("Backend error ({status}): {detail}")]
    Backend { status: u16, detail: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudiumError {
    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a DuplicateInFlight error
    pub fn duplicate_in_flight(fingerprint: impl Into<String>) -> Self {
        Self::DuplicateInFlight {
            fingerprint: fingerprint.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>, retryable: bool) -> Self {
        Self::Network {
            message: message.into(),
            retryable,
        }
    }

    /// Creates a Backend error
    pub fn backend(status: u16, detail: impl Into<String>) -> Self {
        Self::Backend {
            status,
            detail: detail.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a validation error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a duplicate-submission rejection
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateInFlight { .. })
    }

    /// Check if this is a transport-level failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this error came back from the backend with a status code
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// The message shown to the user when this error resolves a chat turn
    /// or an upload.
    ///
    /// Backend detail strings are propagated verbatim when available;
    /// everything else falls back to a readable description.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::DuplicateInFlight { .. } => {
                "Question already being processed. Please wait.".to_string()
            }
            Self::Network { message, .. } => {
                format!("Could not reach the study backend: {message}")
            }
            Self::Backend { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            Self::Backend { status, .. } => {
                format!("The study backend returned an error (status {status})")
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for StudiumError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StudiumError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StudiumError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, StudiumError>`.
pub type Result<T> = std::result::Result<T, StudiumError>;

//! Error types and handling for Ecoguard
//!
//! This module defines the error types used throughout the crate. The
//! variants follow how a refresh cycle reacts to a failure: authentication
//! failures are surfaced distinctly, transport failures may be retried next
//! cycle, protocol and data-format failures only skip the affected sub-fetch
//! or row.

use thiserror::Error;

/// Result type alias for Ecoguard operations
pub type Result<T> = std::result::Result<T, EcoguardError>;

/// Main error type for Ecoguard
#[derive(Debug, Error)]
pub enum EcoguardError {
    /// Credentials rejected by the portal
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Network or HTTP status failure
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Unexpected page or document structure
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Unparseable numeric or date text
    #[error("Data format error: {message}")]
    DataFormat { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl EcoguardError {
    /// Create a new authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        EcoguardError::Authentication {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        EcoguardError::Transport {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        EcoguardError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new data format error
    pub fn data_format<S: Into<String>>(message: S) -> Self {
        EcoguardError::DataFormat {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        EcoguardError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        EcoguardError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        EcoguardError::Io {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        EcoguardError::Serialization {
            message: message.into(),
        }
    }

    /// Message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            EcoguardError::Authentication { message }
            | EcoguardError::Transport { message }
            | EcoguardError::Protocol { message }
            | EcoguardError::DataFormat { message }
            | EcoguardError::Config { message }
            | EcoguardError::Validation { message, .. }
            | EcoguardError::Io { message }
            | EcoguardError::Serialization { message } => message,
        }
    }

    /// Whether the portal rejected the credentials
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, EcoguardError::Authentication { .. })
    }

    /// Whether a later attempt may succeed without user intervention
    pub fn is_retryable(&self) -> bool {
        matches!(self, EcoguardError::Transport { .. })
    }
}

impl From<std::io::Error> for EcoguardError {
    fn from(err: std::io::Error) -> Self {
        EcoguardError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for EcoguardError {
    fn from(err: serde_yaml::Error) -> Self {
        EcoguardError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EcoguardError {
    fn from(err: serde_json::Error) -> Self {
        EcoguardError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for EcoguardError {
    fn from(err: reqwest::Error) -> Self {
        EcoguardError::transport(err.to_string())
    }
}

impl From<chrono::ParseError> for EcoguardError {
    fn from(err: chrono::ParseError) -> Self {
        EcoguardError::data_format(err.to_string())
    }
}

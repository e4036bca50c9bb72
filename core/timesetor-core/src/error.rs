//! Error types for timesetor-core operations.
//!
//! `ClientError` is the rich internal error. Store operations hand callers an
//! `ActionError` instead: the same failure, reduced to the message a user
//! should see.

use serde::Serialize;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur while talking to the backend or touching local
/// storage.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    // ─────────────────────────────────────────────────────────────────────
    // Network Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("HTTP {status} from {path}{}", message_suffix(.message))]
    Http {
        status: u16,
        path: String,
        /// The `error` field of the response body, when the backend sent one.
        message: Option<String>,
    },

    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {path}: {details}")]
    Decode { path: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("No tokio runtime available to run {0}")]
    NoRuntime(&'static str),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl ClientError {
    /// The message the backend attached to a failed response, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// HTTP status of a failed response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Store-level Error
// ═══════════════════════════════════════════════════════════════════════════════

/// A failed store operation, carrying the user-visible message.
///
/// The message is the backend's own text when it sent one, otherwise the
/// localized default for the operation.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    #[source]
    source: Option<ClientError>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn from_client(err: ClientError, default_message: &str) -> Self {
        let message = err
            .server_message()
            .unwrap_or(default_message)
            .to_string();
        Self {
            message,
            source: Some(err),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn client_error(&self) -> Option<&ClientError> {
        self.source.as_ref()
    }
}

/// Result of a store operation.
pub type ActionResult<T = ()> = std::result::Result<T, ActionError>;

/// Serializable `{success, error}` view of an [`ActionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    /// Builds the outcome of any fallible operation from its error's display
    /// text.
    pub fn of<T, E: std::fmt::Display>(result: &std::result::Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome {
                success: true,
                error: None,
            },
            Err(err) => Outcome {
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}

impl<T> From<&ActionResult<T>> for Outcome {
    fn from(result: &ActionResult<T>) -> Self {
        Outcome::of(result)
    }
}

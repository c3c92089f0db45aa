//! Error types for the client SDK

use crate::jsonpath::PathError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by describe, fetch, mapping and auth operations
#[derive(Debug, Error)]
pub enum Error {
    /// A result type's zoom steps or field bindings are unusable.
    /// Raised by `describe`, before any request is sent.
    #[error("Invalid result configuration for {type_name}: {reason}")]
    Configuration {
        type_name: &'static str,
        reason: String,
    },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client itself could not be set up
    #[error("Failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request to {url} failed: {status}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to parse response JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A bound path did not resolve against the fetched document
    #[error("Field '{field}' could not be read with '{expression}': {source}")]
    Extraction {
        field: String,
        expression: String,
        #[source]
        source: PathError,
    },

    #[error("Cannot instantiate {type_name}: {reason}")]
    Instantiation {
        type_name: &'static str,
        reason: String,
    },
}

impl Error {
    pub(crate) fn configuration(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            type_name,
            reason: reason.into(),
        }
    }

    /// True for connection failures and non-success statuses
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }

    /// HTTP status of a rejected request, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status(),
            _ => None,
        }
    }
}

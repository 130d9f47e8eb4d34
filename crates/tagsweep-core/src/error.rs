//! Error types for tagsweep

use thiserror::Error;

/// Errors that can occur while configuring or running a sweep
#[derive(Error, Debug)]
pub enum SweepError {
    /// A required setting is missing or empty
    #[error("missing required setting: {var}")]
    MissingConfig { var: &'static str },

    /// A setting is present but unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request could not be built, sent, or its body read
    #[error("HTTP error while {context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Registry answered with a status the operation does not accept
    #[error("unexpected status {status} while {context}")]
    UnexpectedStatus { context: String, status: u16 },

    /// Response body was not the expected JSON shape
    #[error("failed to decode response while {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON encoding error (report output)
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SweepError {
    pub(crate) fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        SweepError::Http {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        SweepError::Decode {
            context: context.into(),
            source,
        }
    }
}

/// Result type for tagsweep operations.
pub type Result<T> = std::result::Result<T, SweepError>;

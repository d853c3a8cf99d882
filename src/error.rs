//! Error types for save operations.
//!
//! Follows the What/Why/Fix pattern: every variant carries enough context to
//! tell the caller what failed and how to get past it. None of these ever
//! cross the public [`Saver::save_as`](crate::Saver::save_as) boundary; the
//! orchestrator logs them and moves on to the next strategy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`Host`](crate::host::Host) implementation.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host does not know the element handle it was given
    #[error("unknown element #{id}\n  Suggestion: create elements through the same host that uses them")]
    UnknownElement {
        /// Raw handle value
        id: u64,
    },

    /// The element exists but is the wrong kind for the operation
    #[error("element #{id} cannot {operation}: it is not a {expected}")]
    WrongElementKind {
        /// Raw handle value
        id: u64,
        /// What the caller tried to do
        operation: &'static str,
        /// Element kind the operation needs
        expected: &'static str,
    },

    /// The host refused a navigation target
    #[error("invalid navigation target '{target}': {reason}")]
    InvalidTarget {
        /// The rejected URI, truncated for display
        target: String,
        /// Why it was rejected
        reason: String,
    },

    /// The host capability exists but the operation failed
    #[error("host operation '{operation}' failed: {reason}\n  Suggestion: {suggestion}")]
    OperationFailed {
        /// The host operation that failed
        operation: &'static str,
        /// Why it failed
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// Writing a materialized download failed
    #[error("failed to write '{path}': {source}")]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    /// Creates an `InvalidTarget` error, keeping at most 64 chars of the target.
    #[must_use]
    pub fn invalid_target(target: &str, reason: &str) -> Self {
        Self::InvalidTarget {
            target: target.chars().take(64).collect(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `OperationFailed` error.
    #[must_use]
    pub fn operation_failed(operation: &'static str, reason: &str) -> Self {
        Self::OperationFailed {
            operation,
            reason: reason.to_string(),
            suggestion: "Check that the host supports this capability".to_string(),
        }
    }
}

/// Errors that can occur while a strategy attempts a save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// A host call failed mid-strategy
    #[error("strategy '{strategy}' failed: {source}")]
    Host {
        /// Name of the strategy that was running
        strategy: &'static str,
        /// Underlying host error
        #[source]
        source: HostError,
    },

    /// A data URI could not be decoded
    #[error("malformed data URI: {reason}\n  Suggestion: expected 'data:charset=utf-8,<percent-encoded text>'")]
    MalformedDataUri {
        /// Why decoding failed
        reason: String,
    },

    /// Configuration values are out of range
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig {
        /// Config field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl SaveError {
    /// Wraps a host error with the name of the strategy that hit it.
    #[must_use]
    pub fn host(strategy: &'static str, source: HostError) -> Self {
        Self::Host { strategy, source }
    }

    /// Creates a `MalformedDataUri` error.
    #[must_use]
    pub fn malformed_data_uri(reason: &str) -> Self {
        Self::MalformedDataUri {
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

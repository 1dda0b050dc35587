//! Error types for Worm.
//!
//! This module provides the broker's error hierarchy using `thiserror`.
//! The `Display` text of every variant doubles as the reply sent back to the
//! caller, so messages are written to be read by a human on the other end.

use thiserror::Error;

use crate::types::Outcome;

/// Result type alias using `WormError`.
pub type Result<T> = std::result::Result<T, WormError>;

/// Main error type for all Worm operations.
#[derive(Debug, Error)]
pub enum WormError {
    // ═══════════════════════════════════════════════════════════════════════════
    // RESOLUTION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The directory has no entry for the symbolic name.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The directory backend itself failed.
    #[error("directory lookup failed for '{name}': {reason}")]
    DirectoryError {
        /// Name being resolved
        name: String,
        /// What the directory reported
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // DISPATCH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The resolved transport kind has no registered implementation.
    #[error("unsupported transport type: {0}")]
    UnsupportedTransport(String),

    /// The endpoint cannot be turned into a request target.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as resolved
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Network, connection, or protocol failure during a send.
    #[error("error sending via {transport} to {endpoint}: {reason}")]
    TransportFailed {
        /// Transport that attempted the send
        transport: String,
        /// Destination of the send
        endpoint: String,
        /// Error and its source chain
        reason: String,
    },

    /// The outbound call did not finish within the configured timeout.
    #[error("request via {transport} to {endpoint} timed out after {seconds}s")]
    TransportTimeout {
        /// Transport that attempted the send
        transport: String,
        /// Destination of the send
        endpoint: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUT & CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The inbound request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WormError {
    /// Builds a [`WormError::TransportFailed`] from any error, keeping its
    /// whole source chain so the reply is enough to diagnose the failure.
    pub fn transport(
        transport: impl Into<String>,
        endpoint: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        WormError::TransportFailed {
            transport: transport.into(),
            endpoint: endpoint.into(),
            reason: error_chain(err),
        }
    }

    /// Returns true if a later attempt might succeed.
    ///
    /// The broker itself never retries; this is for callers that want to.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WormError::TransportFailed { .. }
                | WormError::TransportTimeout { .. }
                | WormError::DirectoryError { .. }
                | WormError::NodeNotFound(_)
        )
    }

    /// Returns true if the failure happened while talking to the endpoint.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            WormError::TransportFailed { .. }
                | WormError::TransportTimeout { .. }
                | WormError::InvalidEndpoint { .. }
        )
    }

    /// Returns true if the failure happened while resolving the name.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            WormError::NodeNotFound(_) | WormError::DirectoryError { .. }
        )
    }

    /// Classifies the error as the outcome reported to the caller.
    pub fn outcome(&self) -> Outcome {
        match self {
            WormError::NodeNotFound(_) => Outcome::NotFound,
            WormError::DirectoryError { .. } => Outcome::DirectoryFailed,
            WormError::UnsupportedTransport(_) => Outcome::UnsupportedTransport,
            WormError::TransportFailed { .. }
            | WormError::TransportTimeout { .. }
            | WormError::InvalidEndpoint { .. } => Outcome::TransportFailed,
            WormError::InvalidRequest(_) => Outcome::Rejected,
            WormError::ConfigError(_) | WormError::JsonError(_) | WormError::IoError(_) => {
                Outcome::Internal
            }
        }
    }
}

/// Renders an error and all of its sources as `outer: inner: root`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

//! How a relayed request ended.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal state of a request handled by the broker.
///
/// Every request ends in exactly one of these, and every one of them still
/// produces a reply for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The endpoint answered; the reply is its response body.
    Delivered,
    /// The directory does not know the name.
    NotFound,
    /// The directory backend failed.
    DirectoryFailed,
    /// No transport is registered for the resolved kind.
    UnsupportedTransport,
    /// The transport could not complete the call.
    TransportFailed,
    /// The inbound request was malformed.
    Rejected,
    /// Anything else.
    Internal,
}

impl Outcome {
    /// Stable identifier, used in headers and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Delivered => "delivered",
            Outcome::NotFound => "not_found",
            Outcome::DirectoryFailed => "directory_failed",
            Outcome::UnsupportedTransport => "unsupported_transport",
            Outcome::TransportFailed => "transport_failed",
            Outcome::Rejected => "rejected",
            Outcome::Internal => "internal",
        }
    }

    /// Returns true if the payload reached the endpoint.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

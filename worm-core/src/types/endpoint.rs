//! Addressing types: where a payload goes and how it gets there.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{TRANSPORT_ANONYMIZED, TRANSPORT_DIRECT};

// ═══════════════════════════════════════════════════════════════════════════════
// ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque connection string (`host:port`, an overlay address, ...).
///
/// The broker never looks inside it; only the transport selected for it
/// gives it meaning.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    /// Wraps an endpoint string.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    /// Returns the raw endpoint string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the endpoint string is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Endpoint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPORT KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// Tag selecting a transport implementation.
///
/// Open set: any tag can be registered. Tags are compared after trimming and
/// lowercasing, so `"TCP"` and `"tcp"` select the same transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TransportKind(String);

impl TransportKind {
    /// Creates a normalized transport kind.
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self(kind.as_ref().trim().to_lowercase())
    }

    /// The transport that connects straight to the endpoint.
    pub fn direct() -> Self {
        Self(TRANSPORT_DIRECT.to_string())
    }

    /// The transport that routes through the anonymizing overlay.
    pub fn anonymized() -> Self {
        Self(TRANSPORT_ANONYMIZED.to_string())
    }

    /// Returns the normalized tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the tag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransportKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TransportKind {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<TransportKind> for String {
    fn from(kind: TransportKind) -> Self {
        kind.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// A successful directory lookup: where to send, and over what.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Address handed to the transport
    pub endpoint: Endpoint,
    /// Transport that handles the send
    pub transport: TransportKind,
}

impl Resolution {
    /// Creates a resolution.
    pub fn new(endpoint: impl Into<Endpoint>, transport: impl Into<TransportKind>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: transport.into(),
        }
    }
}

/// Normalizes a symbolic name for use as a lookup key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

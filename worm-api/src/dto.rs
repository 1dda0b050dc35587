//! DTOs for API requests and responses.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use worm_broker::{CacheEntry, Reply};
use worm_core::types::Outcome;

/// Request to relay a payload to a named node.
#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    /// Symbolic name of the target node
    pub name: String,
    /// Payload forwarded verbatim
    #[serde(default)]
    pub payload: String,
}

/// Result of a relay.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Response from the node, or why there is none
    pub reply: String,
    /// How the request ended
    pub outcome: Outcome,
    /// Whether the resolution came from the cache
    pub from_cache: bool,
}

impl From<Reply> for RelayResponse {
    fn from(reply: Reply) -> Self {
        Self {
            reply: reply.body,
            outcome: reply.outcome,
            from_cache: reply.from_cache,
        }
    }
}

/// A cached resolution.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntryDto {
    /// Normalized symbolic name
    pub name: String,
    /// Resolved endpoint
    pub endpoint: String,
    /// Resolved transport kind
    pub transport: String,
    /// When the resolution was cached
    pub resolved_at: DateTime<Utc>,
    /// Validity window
    pub ttl_seconds: u64,
    /// Seconds until expiry
    pub expires_in_seconds: u64,
}

impl CacheEntryDto {
    /// Converts an entry, computing its remaining lifetime at `now`.
    pub fn from_entry(entry: CacheEntry, now: Instant) -> Self {
        Self {
            expires_in_seconds: entry.remaining_at(now).as_secs(),
            ttl_seconds: entry.ttl.as_secs(),
            name: entry.name,
            endpoint: entry.endpoint.to_string(),
            transport: entry.transport.to_string(),
            resolved_at: entry.resolved_at,
        }
    }
}

/// Listing of cached resolutions.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheListResponse {
    /// Valid entries, sorted by name
    pub entries: Vec<CacheEntryDto>,
    /// Number of entries listed
    pub total: usize,
}

/// Response for health check.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Registered transport kinds
    pub transports: Vec<String>,
    /// Valid cached resolutions
    pub cached_entries: usize,
}

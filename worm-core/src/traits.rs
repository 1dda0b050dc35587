//! Common traits for Worm.
//!
//! These are the two seams the broker is built around: where names are
//! resolved, and how payloads travel. Both are object-safe so implementations
//! can be swapped at runtime and stubbed in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Endpoint, Resolution};

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTORY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for symbolic-name resolution.
///
/// Implementations might use:
/// - A static table (for development and tests)
/// - A DNS-like lookup service
/// - A distributed ledger
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolves a symbolic name to an endpoint and transport kind.
    ///
    /// Returns `Ok(None)` when the name is unknown. `Err` is reserved for
    /// failures of the directory itself.
    async fn resolve(&self, name: &str) -> Result<Option<Resolution>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPORT TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A network backend able to deliver a payload to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short label used in logs and error replies.
    fn kind(&self) -> &str;

    /// Sends `payload` to `endpoint` and returns the full response body.
    ///
    /// Blocks the calling task until the remote side answers, fails, or the
    /// implementation's timeout elapses.
    async fn send(&self, endpoint: &Endpoint, payload: &str) -> Result<String>;
}

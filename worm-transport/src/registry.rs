//! Transport kind → implementation registry.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use worm_core::constants::{TRANSPORT_ANONYMIZED, TRANSPORT_DIRECT, TRANSPORT_TCP, TRANSPORT_TOR};
use worm_core::error::{Result, WormError};
use worm_core::traits::Transport;
use worm_core::types::{Endpoint, TransportKind};

use crate::http::{HttpTransport, TransportConfig};

/// Registry of transports, keyed by transport kind.
///
/// Dispatch is a lookup followed by a delegate call; supporting a new network
/// means registering one more implementation. Several kinds may share one
/// implementation, which is how the `tcp` and `tor` aliases work.
pub struct TransportRegistry {
    transports: DashMap<TransportKind, Arc<dyn Transport>>,
}

impl TransportRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            transports: DashMap::new(),
        }
    }

    /// Creates a registry with the built-in transports.
    ///
    /// Registers `direct` (alias `tcp`) and `anonymized` (alias `tor`).
    pub fn with_defaults(config: &TransportConfig) -> Result<Self> {
        let registry = Self::new();

        let direct: Arc<dyn Transport> = Arc::new(HttpTransport::direct(config)?);
        registry.register(TRANSPORT_DIRECT, direct.clone());
        registry.register(TRANSPORT_TCP, direct);

        let anonymized: Arc<dyn Transport> = Arc::new(HttpTransport::anonymized(config)?);
        registry.register(TRANSPORT_ANONYMIZED, anonymized.clone());
        registry.register(TRANSPORT_TOR, anonymized);

        info!(kinds = ?registry.kinds(), proxy = %config.socks_proxy_url(), "Registered default transports");
        Ok(registry)
    }

    /// Registers `transport` under `kind`, returning the one it replaced.
    pub fn register(
        &self,
        kind: impl Into<TransportKind>,
        transport: Arc<dyn Transport>,
    ) -> Option<Arc<dyn Transport>> {
        let kind = kind.into();
        debug!(%kind, implementation = transport.kind(), "Registering transport");
        self.transports.insert(kind, transport)
    }

    /// Removes the transport registered under `kind`.
    pub fn unregister(&self, kind: &TransportKind) -> Option<Arc<dyn Transport>> {
        self.transports.remove(kind).map(|(_, transport)| transport)
    }

    /// Looks up the transport for `kind`.
    pub fn get(&self, kind: &TransportKind) -> Option<Arc<dyn Transport>> {
        self.transports.get(kind).map(|entry| entry.value().clone())
    }

    /// Returns true if `kind` has a transport.
    pub fn contains(&self, kind: &TransportKind) -> bool {
        self.transports.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<TransportKind> {
        let mut kinds: Vec<TransportKind> =
            self.transports.iter().map(|entry| entry.key().clone()).collect();
        kinds.sort();
        kinds
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.transports.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    /// Sends `payload` to `endpoint` over the transport registered for `kind`.
    ///
    /// Fails with [`WormError::UnsupportedTransport`] when `kind` is unknown.
    pub async fn send(
        &self,
        endpoint: &Endpoint,
        kind: &TransportKind,
        payload: &str,
    ) -> Result<String> {
        // Clone the handle out so no map guard is held across the await
        let transport = self
            .get(kind)
            .ok_or_else(|| WormError::UnsupportedTransport(kind.to_string()))?;

        transport.send(endpoint, payload).await
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

//! Request orchestration: cache lookup, resolution, transport dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use worm_cache::{CacheEntry, ResolutionCache};
use worm_core::error::{Result, WormError};
use worm_core::traits::Directory;
use worm_core::types::{Endpoint, Outcome, TransportKind};
use worm_transport::TransportRegistry;

use crate::config::BrokerConfig;

/// A resolution together with where it came from.
#[derive(Clone, Debug)]
pub struct Lookup {
    /// The cache entry used for dispatch
    pub entry: CacheEntry,
    /// Whether the entry was already cached
    pub from_cache: bool,
}

/// A payload that reached its endpoint.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Response body returned by the endpoint
    pub response: String,
    /// Endpoint the payload went to
    pub endpoint: Endpoint,
    /// Transport that carried it
    pub transport: TransportKind,
    /// Whether the resolution came from the cache
    pub from_cache: bool,
}

/// What the caller gets back, whatever happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Response body on success, human-readable failure otherwise
    pub body: String,
    /// How the request ended
    pub outcome: Outcome,
    /// Whether the resolution came from the cache
    pub from_cache: bool,
}

impl Reply {
    fn delivered(delivery: Delivery) -> Self {
        Self {
            body: delivery.response,
            outcome: Outcome::Delivered,
            from_cache: delivery.from_cache,
        }
    }

    fn failed(err: &WormError, from_cache: bool) -> Self {
        Self {
            body: err.to_string(),
            outcome: err.outcome(),
            from_cache,
        }
    }
}

/// Routes `(name, payload)` requests to their endpoints.
///
/// Per request:
/// 1. Look the name up in the cache
/// 2. On a miss, resolve it through the directory and cache the result
/// 3. Send the payload over the transport registered for the resolved kind
///
/// Nothing is retried, and unknown names are never cached: a name that is
/// missing now is asked for again on the next request.
///
/// All collaborators are shared behind `Arc`, so one dispatcher can serve any
/// number of concurrent requests.
pub struct Dispatcher {
    cache: Arc<ResolutionCache>,
    directory: Arc<dyn Directory>,
    transports: Arc<TransportRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher with a default cache.
    pub fn new(directory: Arc<dyn Directory>, transports: Arc<TransportRegistry>) -> Self {
        Self::with_cache(directory, transports, Arc::new(ResolutionCache::new()))
    }

    /// Creates a dispatcher around an existing cache.
    pub fn with_cache(
        directory: Arc<dyn Directory>,
        transports: Arc<TransportRegistry>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        Self {
            cache,
            directory,
            transports,
        }
    }

    /// Creates a dispatcher with the built-in transports and a cache sized
    /// from `config`.
    pub fn from_config(config: &BrokerConfig, directory: Arc<dyn Directory>) -> Result<Self> {
        config.validate()?;
        let transports = Arc::new(TransportRegistry::with_defaults(&config.transport)?);
        let cache = Arc::new(ResolutionCache::with_config(config.cache.clone()));
        Ok(Self::with_cache(directory, transports, cache))
    }

    /// The resolution cache.
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// The transport registry.
    pub fn transports(&self) -> &Arc<TransportRegistry> {
        &self.transports
    }

    /// Returns a valid resolution for `name`, from the cache or the directory.
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<Lookup> {
        if name.trim().is_empty() {
            return Err(WormError::InvalidRequest("name cannot be empty".into()));
        }

        if let Some(entry) = self.cache.get(name) {
            debug!(name, endpoint = %entry.endpoint, "Cache hit");
            return Ok(Lookup {
                entry,
                from_cache: true,
            });
        }

        debug!(name, "Cache miss, resolving");

        let resolution = match self.directory.resolve(name).await {
            Ok(Some(resolution)) if !resolution.endpoint.is_empty() => resolution,
            Ok(_) => return Err(WormError::NodeNotFound(name.to_string())),
            Err(err @ (WormError::DirectoryError { .. } | WormError::NodeNotFound(_))) => {
                return Err(err)
            }
            Err(err) => {
                return Err(WormError::DirectoryError {
                    name: name.to_string(),
                    reason: err.to_string(),
                })
            }
        };

        if resolution.transport.is_empty() {
            return Err(WormError::DirectoryError {
                name: name.to_string(),
                reason: format!("resolution for {} has no transport kind", resolution.endpoint),
            });
        }

        let entry = self.cache.put(name, resolution);
        info!(name, endpoint = %entry.endpoint, transport = %entry.transport, "Resolved node");

        Ok(Lookup {
            entry,
            from_cache: false,
        })
    }

    /// Resolves `name` and sends `payload` to it.
    ///
    /// Unlike [`handle`](Self::handle), failures come back as errors.
    #[instrument(skip(self, payload))]
    pub async fn dispatch(&self, name: &str, payload: &str) -> Result<Delivery> {
        let lookup = self.resolve(name).await?;
        self.send(lookup, payload).await
    }

    async fn send(&self, lookup: Lookup, payload: &str) -> Result<Delivery> {
        let Lookup { entry, from_cache } = lookup;

        let response = self
            .transports
            .send(&entry.endpoint, &entry.transport, payload)
            .await?;

        debug!(endpoint = %entry.endpoint, transport = %entry.transport, bytes = response.len(), "Delivered");

        Ok(Delivery {
            response,
            endpoint: entry.endpoint,
            transport: entry.transport,
            from_cache,
        })
    }

    /// Handles one request and reports how it ended.
    ///
    /// Never fails: every error is turned into a reply.
    #[instrument(skip(self, payload))]
    pub async fn handle_detailed(&self, name: &str, payload: &str) -> Reply {
        let lookup = match self.resolve(name).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(name, error = %err, outcome = %err.outcome(), "Resolution failed");
                return Reply::failed(&err, false);
            }
        };

        let from_cache = lookup.from_cache;
        match self.send(lookup, payload).await {
            Ok(delivery) => Reply::delivered(delivery),
            Err(err) => {
                warn!(name, error = %err, outcome = %err.outcome(), "Dispatch failed");
                Reply::failed(&err, from_cache)
            }
        }
    }

    /// Handles one request and returns the string to send back to the caller.
    pub async fn handle(&self, name: &str, payload: &str) -> String {
        self.handle_detailed(name, payload).await.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use wiremock::matchers::{body_string, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use worm_cache::{CacheConfig, ManualClock};
    use worm_core::traits::Transport;
    use worm_core::types::Resolution;
    use worm_directory::StaticDirectory;
    use worm_transport::{HttpTransport, TransportConfig};

    /// Directory stub that counts how often it is asked.
    struct CountingDirectory {
        inner: StaticDirectory,
        calls: AtomicUsize,
    }

    impl CountingDirectory {
        fn new(entries: Vec<(&str, Resolution)>) -> Arc<Self> {
            Arc::new(Self {
                inner: StaticDirectory::from_entries(entries),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Directory for CountingDirectory {
        async fn resolve(&self, name: &str) -> Result<Option<Resolution>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(name).await
        }
    }

    struct BrokenDirectory;

    #[async_trait]
    impl Directory for BrokenDirectory {
        async fn resolve(&self, _name: &str) -> Result<Option<Resolution>> {
            Err(WormError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "ledger unreachable",
            )))
        }
    }

    /// Directory that reports every name as unknown through an error.
    struct RejectingDirectory;

    #[async_trait]
    impl Directory for RejectingDirectory {
        async fn resolve(&self, name: &str) -> Result<Option<Resolution>> {
            Err(WormError::NodeNotFound(name.to_string()))
        }
    }

    struct Echo;

    #[async_trait]
    impl Transport for Echo {
        fn kind(&self) -> &str {
            "echo"
        }

        async fn send(&self, _endpoint: &Endpoint, payload: &str) -> Result<String> {
            Ok(payload.to_string())
        }
    }

    fn echo_registry() -> Arc<TransportRegistry> {
        let registry = TransportRegistry::new();
        registry.register("direct", Arc::new(Echo));
        Arc::new(registry)
    }

    fn manual_cache() -> (Arc<ResolutionCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResolutionCache::with_clock(CacheConfig::default(), clock.clone());
        (Arc::new(cache), clock)
    }

    fn closed_port() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    #[tokio::test]
    async fn test_end_to_end_cache_lifecycle() {
        let directory = CountingDirectory::new(vec![(
            "node.A",
            Resolution::new("203.0.113.5:9000", "direct"),
        )]);
        let (cache, clock) = manual_cache();
        let dispatcher = Dispatcher::with_cache(directory.clone(), echo_registry(), cache);

        assert_eq!(dispatcher.handle("node.A", "hello").await, "hello");
        assert_eq!(directory.calls(), 1);

        clock.advance(Duration::from_secs(60));
        assert_eq!(dispatcher.handle("node.A", "hello").await, "hello");
        assert_eq!(directory.calls(), 1);

        clock.advance(Duration::from_secs(300));
        assert_eq!(dispatcher.handle("node.A", "hello").await, "hello");
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_repeated_hits_never_resolve_again() {
        let directory = CountingDirectory::new(vec![(
            "node.A",
            Resolution::new("203.0.113.5:9000", "direct"),
        )]);
        let dispatcher = Dispatcher::new(directory.clone(), echo_registry());

        let first = dispatcher.handle_detailed("node.A", "ping").await;
        assert!(!first.from_cache);

        for _ in 0..10 {
            let reply = dispatcher.handle_detailed("node.A", "ping").await;
            assert_eq!(reply.outcome, Outcome::Delivered);
            assert!(reply.from_cache);
        }
        assert_eq!(directory.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_cached() {
        let directory = CountingDirectory::new(vec![]);
        let dispatcher = Dispatcher::new(directory.clone(), echo_registry());

        let reply = dispatcher.handle_detailed("node.ghost", "x").await;
        assert_eq!(reply.outcome, Outcome::NotFound);
        assert!(reply.body.contains("node not found"));
        assert!(!dispatcher.cache().contains("node.ghost"));

        dispatcher.handle("node.ghost", "x").await;
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_transport_keeps_cache_entry() {
        let directory = CountingDirectory::new(vec![(
            "node.pigeon",
            Resolution::new("loft:1", "carrier-pigeon"),
        )]);
        let dispatcher = Dispatcher::new(directory.clone(), echo_registry());

        let reply = dispatcher.handle_detailed("node.pigeon", "coo").await;
        assert_eq!(reply.outcome, Outcome::UnsupportedTransport);
        assert_eq!(reply.body, "unsupported transport type: carrier-pigeon");
        assert!(dispatcher.cache().get("node.pigeon").is_some());

        let again = dispatcher.handle_detailed("node.pigeon", "coo").await;
        assert_eq!(again.outcome, Outcome::UnsupportedTransport);
        assert!(again.from_cache);
        assert_eq!(directory.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_then_next_request_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string("second"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ack"))
            .mount(&server)
            .await;

        let directory = CountingDirectory::new(vec![
            ("node.down", Resolution::new(closed_port(), "direct")),
            ("node.up", Resolution::new(server.address().to_string(), "direct")),
        ]);
        let transports = Arc::new(TransportRegistry::new());
        transports.register(
            "direct",
            Arc::new(HttpTransport::direct(&TransportConfig::default()).unwrap()),
        );
        let dispatcher = Dispatcher::new(directory, transports);

        let failed = dispatcher.handle_detailed("node.down", "first").await;
        assert_eq!(failed.outcome, Outcome::TransportFailed);
        assert!(failed.body.starts_with("error sending via direct"));

        let ok = dispatcher.handle_detailed("node.up", "second").await;
        assert_eq!(ok.outcome, Outcome::Delivered);
        assert_eq!(ok.body, "ack");
    }

    #[tokio::test]
    async fn test_directory_failure_is_reported_and_not_cached() {
        let dispatcher = Dispatcher::new(Arc::new(BrokenDirectory), echo_registry());

        let reply = dispatcher.handle_detailed("node.A", "x").await;
        assert_eq!(reply.outcome, Outcome::DirectoryFailed);
        assert!(reply.body.contains("ledger unreachable"));
        assert!(dispatcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_directory_not_found_error_is_not_found() {
        let dispatcher = Dispatcher::new(Arc::new(RejectingDirectory), echo_registry());

        let reply = dispatcher.handle_detailed("node.x", "x").await;
        assert_eq!(reply.outcome, Outcome::NotFound);
        assert_eq!(reply.body, "node not found: node.x");
        assert!(dispatcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_resolution_without_transport_is_not_cached() {
        let directory = CountingDirectory::new(vec![(
            "node.bare",
            Resolution::new("203.0.113.5:9000", "  "),
        )]);
        let dispatcher = Dispatcher::new(directory.clone(), echo_registry());

        let reply = dispatcher.handle_detailed("node.bare", "x").await;
        assert_eq!(reply.outcome, Outcome::DirectoryFailed);
        assert!(reply.body.contains("no transport kind"));
        assert!(reply.body.contains("203.0.113.5:9000"));
        assert!(!dispatcher.cache().contains("node.bare"));

        dispatcher.handle("node.bare", "x").await;
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let directory = CountingDirectory::new(vec![]);
        let dispatcher = Dispatcher::new(directory.clone(), echo_registry());

        let reply = dispatcher.handle_detailed("  ", "x").await;
        assert_eq!(reply.outcome, Outcome::Rejected);
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_reports_delivery_details() {
        let directory = CountingDirectory::new(vec![(
            "node.A",
            Resolution::new("203.0.113.5:9000", "DIRECT"),
        )]);
        let dispatcher = Dispatcher::new(directory, echo_registry());

        let delivery = dispatcher.dispatch("node.A", "hello").await.unwrap();
        assert_eq!(delivery.response, "hello");
        assert_eq!(delivery.endpoint.as_str(), "203.0.113.5:9000");
        assert_eq!(delivery.transport, TransportKind::direct());
        assert!(!delivery.from_cache);

        let err = dispatcher.dispatch("node.B", "hello").await.unwrap_err();
        assert!(matches!(err, WormError::NodeNotFound(ref name) if name == "node.B"));
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let directory = CountingDirectory::new(vec![(
            "node.A",
            Resolution::new("203.0.113.5:9000", "direct"),
        )]);
        let dispatcher = Arc::new(Dispatcher::new(directory.clone(), echo_registry()));

        let tasks = (0..32).map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.handle("node.A", &format!("msg-{i}")).await })
        });
        let replies = futures::future::join_all(tasks).await;

        for (i, reply) in replies.into_iter().enumerate() {
            assert_eq!(reply.unwrap(), format!("msg-{i}"));
        }
        assert!(directory.calls() >= 1);
        assert_eq!(dispatcher.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_ttl() {
        let config = BrokerConfig {
            cache: CacheConfig {
                default_ttl_seconds: 42,
                ..Default::default()
            },
            ..Default::default()
        };
        let directory = CountingDirectory::new(vec![(
            "node.onion",
            Resolution::new("someonionaddress.onion", "tor"),
        )]);
        let dispatcher = Dispatcher::from_config(&config, directory).unwrap();

        assert!(dispatcher.transports().contains(&TransportKind::new("tor")));
        let lookup = dispatcher.resolve("node.onion").await.unwrap();
        assert_eq!(lookup.entry.ttl, Duration::from_secs(42));
    }
}

//! Broker-wide defaults.
//!
//! Every value here can be overridden through configuration; these are the
//! values used when nothing else is provided.

use std::net::{IpAddr, Ipv4Addr};

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Validity of a cached resolution, in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Maximum number of resolutions held in the cache.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;

/// Interval between background expiry sweeps, in seconds.
pub const DEFAULT_CACHE_SWEEP_SECONDS: u64 = 60;

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Tag of the transport that connects straight to the endpoint.
pub const TRANSPORT_DIRECT: &str = "direct";

/// Legacy alias for [`TRANSPORT_DIRECT`].
pub const TRANSPORT_TCP: &str = "tcp";

/// Tag of the transport that routes through the overlay SOCKS proxy.
pub const TRANSPORT_ANONYMIZED: &str = "anonymized";

/// Legacy alias for [`TRANSPORT_ANONYMIZED`].
pub const TRANSPORT_TOR: &str = "tor";

/// Local SOCKS5 proxy of the anonymizing overlay.
pub const DEFAULT_SOCKS_PROXY: &str = "127.0.0.1:9050";

/// Upper bound on a single outbound call, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Content type of relayed payloads.
pub const PAYLOAD_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

// ═══════════════════════════════════════════════════════════════════════════════
// INBOUND
// ═══════════════════════════════════════════════════════════════════════════════

/// Default listen interface of the inbound HTTP boundary (all interfaces).
pub const DEFAULT_LISTEN_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default listen port of the inbound HTTP boundary.
pub const DEFAULT_LISTEN_PORT: u16 = 5555;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_is_five_minutes() {
        assert_eq!(DEFAULT_CACHE_TTL_SECONDS, 5 * 60);
    }

    #[test]
    fn test_transport_tags_are_normalized() {
        for tag in [TRANSPORT_DIRECT, TRANSPORT_TCP, TRANSPORT_ANONYMIZED, TRANSPORT_TOR] {
            assert_eq!(tag, tag.trim().to_lowercase());
        }
    }
}

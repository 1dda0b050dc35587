//! TTL cache for Worm name resolutions.
//!
//! Thread-safe in-memory cache with configurable capacity and expiration,
//! plus the clock abstraction it reads time from.

mod cache;
mod clock;

pub use cache::{CacheConfig, CacheEntry, CacheStats, ResolutionCache};
pub use clock::{Clock, ManualClock, SystemClock};

//! Background removal of expired resolutions.
//!
//! Lookups already evict what they find expired; the sweeper keeps names that
//! are never asked for again from piling up until capacity forces them out.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use worm_cache::ResolutionCache;

/// Spawns a task that calls [`ResolutionCache::cleanup_expired`] every `every`.
///
/// A zero interval means sweeping is disabled: nothing is spawned and `None`
/// is returned. Otherwise the task runs until the returned handle is aborted
/// or the runtime shuts down.
pub fn spawn_sweeper(cache: Arc<ResolutionCache>, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        debug!("Sweep interval is zero, sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired();
            if removed > 0 {
                debug!(removed, remaining = cache.len(), "Swept expired resolutions");
            }
        }
    }))
}

//! Broker configuration: cache, transports, directory source.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use worm_cache::CacheConfig;
use worm_core::constants::DEFAULT_CACHE_SWEEP_SECONDS;
use worm_core::error::{Result, WormError};
use worm_core::traits::Directory;
use worm_directory::StaticDirectory;
use worm_transport::TransportConfig;

/// Everything the broker core needs to start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Resolution cache settings
    pub cache: CacheConfig,
    /// Outbound transport settings
    pub transport: TransportConfig,
    /// Seconds between background expiry sweeps; 0 disables the sweeper
    pub sweep_interval_seconds: u64,
    /// JSON name table to serve resolutions from
    pub directory_file: Option<PathBuf>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            transport: TransportConfig::default(),
            sweep_interval_seconds: DEFAULT_CACHE_SWEEP_SECONDS,
            directory_file: None,
        }
    }
}

impl BrokerConfig {
    /// Reads configuration from the environment, after loading `.env` if present.
    ///
    /// | Variable                        | Field                              |
    /// |---------------------------------|------------------------------------|
    /// | `WORM_CACHE_TTL_SECONDS`        | `cache.default_ttl_seconds`        |
    /// | `WORM_CACHE_MAX_ENTRIES`        | `cache.max_entries`                |
    /// | `WORM_CACHE_SWEEP_SECONDS`      | `sweep_interval_seconds`           |
    /// | `WORM_SOCKS_PROXY`              | `transport.socks_proxy`            |
    /// | `WORM_REQUEST_TIMEOUT_SECONDS`  | `transport.request_timeout_seconds`|
    /// | `WORM_DIRECTORY_FILE`           | `directory_file`                   |
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ttl) = parse_var(&lookup, "WORM_CACHE_TTL_SECONDS")? {
            config.cache.default_ttl_seconds = ttl;
        }
        if let Some(max) = parse_var(&lookup, "WORM_CACHE_MAX_ENTRIES")? {
            config.cache.max_entries = max;
        }
        if let Some(sweep) = parse_var(&lookup, "WORM_CACHE_SWEEP_SECONDS")? {
            config.sweep_interval_seconds = sweep;
        }
        if let Some(proxy) = lookup("WORM_SOCKS_PROXY").filter(|v| !v.trim().is_empty()) {
            config.transport.socks_proxy = proxy.trim().to_string();
        }
        if let Some(timeout) = parse_var(&lookup, "WORM_REQUEST_TIMEOUT_SECONDS")? {
            config.transport.request_timeout_seconds = timeout;
        }
        if let Some(path) = lookup("WORM_DIRECTORY_FILE").filter(|v| !v.trim().is_empty()) {
            config.directory_file = Some(PathBuf::from(path.trim()));
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the broker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.default_ttl_seconds == 0 {
            return Err(WormError::ConfigError("cache TTL must be at least 1 second".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(WormError::ConfigError("cache capacity must be at least 1".into()));
        }
        if self.transport.request_timeout_seconds == 0 {
            return Err(WormError::ConfigError("request timeout must be at least 1 second".into()));
        }
        if self.transport.socks_proxy.trim().is_empty() {
            return Err(WormError::ConfigError("SOCKS proxy address is empty".into()));
        }
        Ok(())
    }

    /// Loads the configured directory, or an empty one if none is set.
    pub async fn load_directory(&self) -> Result<Arc<dyn Directory>> {
        match &self.directory_file {
            Some(path) => Ok(Arc::new(StaticDirectory::from_file(path).await?)),
            None => {
                info!("No directory file configured, starting with an empty directory");
                Ok(Arc::new(StaticDirectory::new()))
            }
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| WormError::ConfigError(format!("{}='{}': {}", key, raw, e))),
        _ => Ok(None),
    }
}

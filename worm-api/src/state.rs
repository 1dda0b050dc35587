//! App state: dispatcher and config.

use std::net::SocketAddr;
use std::sync::Arc;

use worm_broker::{BrokerConfig, Dispatcher};
use worm_core::constants::{DEFAULT_LISTEN_IP, DEFAULT_LISTEN_PORT};
use worm_core::error::{Result, WormError};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address the HTTP listener binds to
    pub listen_addr: SocketAddr,
    /// Broker core settings
    pub broker: BrokerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(DEFAULT_LISTEN_IP, DEFAULT_LISTEN_PORT),
            broker: BrokerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Reads configuration from the environment (and `.env`).
    ///
    /// `WORM_LISTEN_ADDR` sets the listen address; everything else is read by
    /// [`BrokerConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let broker = BrokerConfig::from_env()?;
        Self::from_parts(broker, std::env::var("WORM_LISTEN_ADDR").ok())
    }

    /// Combines broker settings with an optional listen address override.
    pub fn from_parts(broker: BrokerConfig, listen_addr: Option<String>) -> Result<Self> {
        let listen_addr = match listen_addr.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|e| WormError::ConfigError(format!("WORM_LISTEN_ADDR='{}': {}", raw, e)))?,
            None => Self::default().listen_addr,
        };

        Ok(Self {
            listen_addr,
            broker,
        })
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Server configuration
    pub config: ApiConfig,
    /// The broker core
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Creates state around an existing dispatcher.
    pub fn new(config: ApiConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Loads the directory and builds the dispatcher from configuration.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let directory = config.broker.load_directory().await?;
        let dispatcher = Dispatcher::from_config(&config.broker, directory)?;
        Ok(Self::new(config, Arc::new(dispatcher)))
    }
}

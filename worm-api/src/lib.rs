//! # Worm API Server
//!
//! HTTP boundary in front of the broker's [`Dispatcher`]: callers hand in a
//! symbolic name and a payload, and get back whatever the resolved endpoint
//! answered, or a description of why it could not be reached.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/relay/:name` - Relay a plain-text body, reply as plain text
//! - `POST /api/v1/relay` - Relay `{name, payload}`, reply as JSON
//! - `GET /api/v1/cache` - List cached resolutions
//! - `GET /api/v1/cache/stats` - Cache statistics
//! - `DELETE /api/v1/cache/:name` - Drop one cached resolution
//! - `DELETE /api/v1/cache` - Drop all cached resolutions
//! - `GET /health` - Liveness and registered transports
//!
//! ## Example
//!
//! ```rust,ignore
//! use worm_api::{ApiServer, ApiConfig};
//!
//! let config = ApiConfig::from_env()?;
//! let server = ApiServer::from_config(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use worm_broker::{spawn_sweeper, Dispatcher};
use worm_core::error::Result;

/// API server for Worm.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around an existing dispatcher.
    pub fn new(config: ApiConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: Arc::new(AppState::new(config, dispatcher)),
        }
    }

    /// Builds the dispatcher, directory included, from configuration.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let state = AppState::from_config(config).await?;
        Ok(Self {
            state: Arc::new(state),
        })
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the configured address until it fails.
    ///
    /// Also starts the cache sweeper when a sweep interval is configured.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.state.config.listen_addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let sweeper = spawn_sweeper(
            self.state.dispatcher.cache().clone(),
            Duration::from_secs(self.state.config.broker.sweep_interval_seconds),
        );

        info!("Worm API server listening on {}", addr);

        let served = axum::serve(listener, self.router()).await;
        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        served
    }
}

//! # Worm Broker
//!
//! Turns `(name, payload)` into a reply.
//!
//! The [`Dispatcher`] looks the name up in its [`ResolutionCache`], asks the
//! [`Directory`] on a miss, caches what it gets back, and hands the payload to
//! the transport registered for the resolved kind. Every failure along the way
//! becomes a reply string instead of an error, so the caller always hears
//! back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use worm_broker::{BrokerConfig, Dispatcher};
//!
//! let config = BrokerConfig::from_env()?;
//! let directory = config.load_directory().await?;
//! let dispatcher = Dispatcher::from_config(&config, directory)?;
//! let reply = dispatcher.handle("node.amalgam", "hello").await;
//! ```
//!
//! [`ResolutionCache`]: worm_cache::ResolutionCache
//! [`Directory`]: worm_core::Directory

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod dispatcher;
mod sweeper;

pub use config::BrokerConfig;
pub use dispatcher::{Delivery, Dispatcher, Lookup, Reply};
pub use sweeper::spawn_sweeper;

pub use worm_cache::{CacheConfig, CacheEntry, CacheStats, ResolutionCache};
pub use worm_directory::StaticDirectory;
pub use worm_transport::{HttpTransport, TransportConfig, TransportRegistry};

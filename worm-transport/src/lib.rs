//! # Worm Transports
//!
//! Delivers payloads to resolved endpoints.
//!
//! - [`HttpTransport`]: HTTP POST, either straight to the endpoint or through
//!   the overlay's SOCKS proxy
//! - [`TransportRegistry`]: maps transport kinds to implementations; adding a
//!   network is a registration, not a change to dispatch

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod http;
mod registry;

pub use http::{HttpTransport, TransportConfig};
pub use registry::TransportRegistry;

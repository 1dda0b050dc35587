//! Domain types for Worm.
//!
//! - [`Endpoint`]: opaque address handed to a transport
//! - [`TransportKind`]: tag selecting the transport that handles a send
//! - [`Resolution`]: what a directory returns for a symbolic name
//! - [`Outcome`]: how a relayed request ended

mod endpoint;
mod outcome;

pub use endpoint::*;
pub use outcome::*;

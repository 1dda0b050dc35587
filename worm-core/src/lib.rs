//! # Worm Core
//!
//! Core types, errors, and traits for the Worm request broker.
//!
//! This crate provides the building blocks shared by every other Worm crate:
//!
//! - **Types**: endpoints, transport kinds, and directory resolutions
//! - **Errors**: one error hierarchy, mapped to caller-facing replies
//! - **Constants**: defaults for cache TTL, proxy address, and timeouts
//! - **Traits**: the directory and transport seams the broker is built on
//!
//! ## Example
//!
//! ```rust
//! use worm_core::{Resolution, TransportKind};
//!
//! let resolution = Resolution::new("127.0.0.1:8080", "TCP");
//! assert_eq!(resolution.transport, TransportKind::new("tcp"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, WormError};
pub use traits::*;
pub use types::*;

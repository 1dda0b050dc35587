//! # Worm Directory
//!
//! In-process implementation of the [`Directory`](worm_core::Directory) seam:
//! a name table that can be seeded in code or loaded from a JSON file.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod table;

pub use table::StaticDirectory;

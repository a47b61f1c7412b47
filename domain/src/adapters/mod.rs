//! In-process adapters that live inside the domain crate for convenience.
//!
//! These are intended for unit testing and local demos. Real adapters
//! (HTTP probe, mail API, REST catalog) live in separate crates.

pub mod doubles;
pub mod memory_catalog;

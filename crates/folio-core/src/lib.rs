//! Core types and trait definitions for the folio contact cache.
//!
//! This crate is deliberately free of database and collation
//! dependencies. All other crates depend on it; it depends on nothing
//! heavier than serde.

pub mod backend;
pub mod cancel;
pub mod cursor;
pub mod error;
pub mod field;
pub mod query;
pub mod record;

pub use error::{Error, Result};

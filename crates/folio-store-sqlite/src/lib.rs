//! SQLite backend for the folio contact cache.
//!
//! [`SqliteStore`] persists contact records with locale-derived sort
//! keys and filter indexes; [`Cursor`] pages over them. All calls are
//! synchronous and blocking — running them off the caller's thread is
//! the embedding dispatch layer's job.

mod cursor;
mod encode;
mod schema;
mod store;
mod translate;

pub mod error;

pub use cursor::Cursor;
pub use error::{Error, Result};
pub use store::{SqliteStore, StoreConfig};


#[cfg(test)]
mod cursor_tests;

//! The `ContactBackend` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `folio-store-sqlite`). Dispatch layers depend on this abstraction,
//! not on any concrete backend. Every method is synchronous and
//! blocking; running calls off the caller's thread is the dispatch
//! layer's business, not the backend's.

use crate::{
  cancel::CancellationToken,
  query::QueryExpr,
  record::ContactRecord,
};

/// Abstraction over a folio contact backend.
///
/// Opening a backend is construction (`SqliteStore::open` and
/// friends); the trait covers the per-record capability set.
pub trait ContactBackend {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new record. Fails if a record with the same uid already
  /// exists.
  fn create(&self, record: &ContactRecord) -> Result<(), Self::Error>;

  /// Replace an existing record. Fails if no record with the uid
  /// exists.
  fn modify(&self, record: &ContactRecord) -> Result<(), Self::Error>;

  /// Retrieve a record by uid.
  fn fetch(&self, uid: &str) -> Result<ContactRecord, Self::Error>;

  /// Return all records matching `query` (all records when `None`),
  /// in unspecified but stable order.
  fn list(
    &self,
    query: Option<&QueryExpr>,
    cancel: Option<&CancellationToken>,
  ) -> Result<Vec<ContactRecord>, Self::Error>;

  /// Delete a record by uid. Fails if no record with the uid exists.
  fn remove(&self, uid: &str) -> Result<(), Self::Error>;
}

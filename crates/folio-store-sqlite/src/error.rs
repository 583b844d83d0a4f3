//! Error type for `folio-store-sqlite`.
//!
//! This is the closed error taxonomy of the cache: every public
//! operation fails with one of these kinds, and RPC layers map them
//! onto their wire codes one-to-one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No record with the given uid.
  #[error("record not found: {0:?}")]
  NotFound(String),

  /// A uniqueness constraint was violated — detected at commit, not
  /// prevented, when writers race outside this process.
  #[error("constraint violated: {0}")]
  Constraint(String),

  /// Malformed query expression, unknown sort field, or an
  /// out-of-range alphabetic bucket index.
  #[error("invalid query: {0}")]
  InvalidQuery(String),

  /// The cursor position was invalidated (e.g. by a locale change)
  /// and must be re-established via Begin, End, or an alphabetic
  /// target.
  #[error("stale cursor position")]
  InvalidCursorState,

  #[error(transparent)]
  UnsupportedLocale(#[from] folio_collate::Error),

  #[error("operation cancelled")]
  Cancelled,

  /// Generic storage failure (I/O, corruption, schema mismatch).
  #[error("storage error: {0}")]
  Query(String),
}

impl From<folio_core::Error> for Error {
  fn from(e: folio_core::Error) -> Self {
    Self::InvalidQuery(e.to_string())
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    match &e {
      rusqlite::Error::SqliteFailure(inner, _)
        if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Self::Constraint(e.to_string())
      }
      _ => Self::Query(e.to_string()),
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Query(format!("summary encoding: {e}"))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

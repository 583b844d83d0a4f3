//! Error types for `folio-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A query expression references a summary field the store does not
  /// carry.
  #[error("unknown summary field: {0:?}")]
  UnknownField(String),

  /// A query expression applies a comparator to a field of an
  /// incompatible kind (e.g. `Contains` on a boolean field).
  #[error("invalid query: {0}")]
  InvalidQuery(String),

  /// A summary field name is not a valid identifier.
  #[error("invalid summary field name: {0:?}")]
  InvalidFieldName(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

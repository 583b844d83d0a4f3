//! Error type for `folio-collate`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The locale string could not be parsed into a language and
  /// optional territory, so no collator can be configured for it.
  #[error("unsupported locale: {0:?}")]
  UnsupportedLocale(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

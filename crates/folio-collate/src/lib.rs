//! Locale-aware collation for the folio contact cache.
//!
//! A [`Collator`] turns strings into memcmp-comparable sort keys and
//! partitions the sort order into locale-defined alphabetic index
//! buckets ("A", "B", ... plus underflow and overflow). Sort keys are
//! what stores persist and range-scan; they are meaningful only under
//! the collator that produced them and must be regenerated when the
//! locale changes.

pub mod error;
pub mod index;
pub mod key;
pub mod locale;

pub use error::{Error, Result};
pub use key::Collator;
pub use locale::Locale;

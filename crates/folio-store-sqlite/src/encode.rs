//! Encoding helpers between domain types and SQLite columns.
//!
//! The authoritative copy of a record's summary values is the JSON
//! `summary` column; the per-field columns are case-folded projections
//! of it used only for filtering and ordering. Matching is
//! case-insensitive throughout, so filter columns and query operands
//! both pass through [`fold`].

use std::collections::BTreeMap;

use folio_core::record::{ContactRecord, FieldValue};

use crate::Result;

// ─── Case folding ────────────────────────────────────────────────────────────

/// Normalized form stored in filter columns and applied to operands.
pub fn fold(s: &str) -> String {
  s.to_lowercase()
}

/// Folded and reversed, for suffix-index columns.
pub fn reverse_fold(s: &str) -> String {
  fold(s).chars().rev().collect()
}

// ─── Summary JSON ────────────────────────────────────────────────────────────

pub fn encode_summary(fields: &BTreeMap<String, FieldValue>) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_summary(s: &str) -> Result<BTreeMap<String, FieldValue>> {
  Ok(serde_json::from_str(s)?)
}

/// The text stored under `name`, or `""` when absent or not text —
/// the input shape sort-key derivation expects.
pub fn summary_text<'a>(
  fields: &'a BTreeMap<String, FieldValue>,
  name: &str,
) -> &'a str {
  fields.get(name).and_then(FieldValue::as_text).unwrap_or("")
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub uid:     String,
  pub data:    String,
  pub summary: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<ContactRecord> {
    Ok(ContactRecord {
      uid:    self.uid,
      data:   self.data,
      fields: decode_summary(&self.summary)?,
    })
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

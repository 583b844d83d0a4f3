//! Summary field definitions.
//!
//! A summary field is a projected, optionally indexed column mirroring
//! part of a full contact record. The active set is fixed per store at
//! open time and persisted alongside the data, so a store always knows
//! which columns it carries.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The value shape of a summary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  /// A single string (e.g. family name).
  Text,
  /// Zero or more strings (e.g. email addresses).
  TextList,
  /// A boolean flag (e.g. "is a distribution list").
  Bool,
}

// ─── SummaryField ────────────────────────────────────────────────────────────

/// A named, typed summary column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryField {
  pub name:           String,
  pub kind:           FieldKind,
  /// Maintain a prefix-ordered index over the (case-folded) value.
  pub indexed:        bool,
  /// Additionally maintain a reversed-value index so suffix matches
  /// get a prefix-shaped plan.
  pub suffix_indexed: bool,
  /// Maintain a locale-dependent sort-key column; only `Text` fields
  /// can be sortable.
  pub sortable:       bool,
}

impl SummaryField {
  pub fn text(name: &str) -> Self {
    Self {
      name:           name.to_owned(),
      kind:           FieldKind::Text,
      indexed:        false,
      suffix_indexed: false,
      sortable:       false,
    }
  }

  pub fn text_list(name: &str) -> Self {
    Self { kind: FieldKind::TextList, ..Self::text(name) }
  }

  pub fn boolean(name: &str) -> Self {
    Self { kind: FieldKind::Bool, ..Self::text(name) }
  }

  pub fn indexed(mut self) -> Self {
    self.indexed = true;
    self
  }

  pub fn suffix_indexed(mut self) -> Self {
    self.suffix_indexed = true;
    self
  }

  pub fn sortable(mut self) -> Self {
    self.sortable = true;
    self
  }
}

// ─── Field set ───────────────────────────────────────────────────────────────

/// The default address-book summary configuration.
pub fn default_fields() -> Vec<SummaryField> {
  vec![
    SummaryField::text("family_name").indexed().sortable(),
    SummaryField::text("given_name").indexed().sortable(),
    SummaryField::text("file_as").sortable(),
    SummaryField::text("full_name").indexed(),
    SummaryField::text("nickname"),
    SummaryField::text_list("email").indexed().suffix_indexed(),
    SummaryField::text_list("phone").indexed(),
    SummaryField::boolean("is_list"),
  ]
}

/// Validate a field set: identifier-safe names, no duplicates, and
/// `sortable`/`suffix_indexed` only where they make sense.
pub fn validate_fields(fields: &[SummaryField]) -> Result<()> {
  let mut seen = std::collections::BTreeSet::new();

  for field in fields {
    if !is_identifier(&field.name) {
      return Err(Error::InvalidFieldName(field.name.clone()));
    }
    if !seen.insert(field.name.as_str()) {
      return Err(Error::InvalidFieldName(format!(
        "duplicate field {:?}",
        field.name
      )));
    }
    if field.sortable && field.kind != FieldKind::Text {
      return Err(Error::InvalidQuery(format!(
        "field {:?} is sortable but not a text field",
        field.name
      )));
    }
    if field.suffix_indexed && field.kind == FieldKind::Bool {
      return Err(Error::InvalidQuery(format!(
        "field {:?} is suffix-indexed but boolean",
        field.name
      )));
    }
  }

  Ok(())
}

/// Field names become SQL column and table names, so they are
/// restricted to `[a-z_][a-z0-9_]*`.
fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_lowercase() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ─── Tests ───────────────────────────────────────────────────────────────────

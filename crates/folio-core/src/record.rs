//! Contact records.
//!
//! A record is a unique uid, an opaque serialized representation (the
//! codec that produces it is outside this crate), and the summary
//! values projected from it. The store persists `data` verbatim and
//! never interprets it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── FieldValue ──────────────────────────────────────────────────────────────

/// A summary value. The JSON shapes (string / array / bool) are
/// disjoint, so the untagged representation round-trips unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
  Text(String),
  TextList(Vec<String>),
  Bool(bool),
}

impl FieldValue {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_text_list(&self) -> Option<&[String]> {
    match self {
      Self::TextList(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }
}

// ─── ContactRecord ───────────────────────────────────────────────────────────

/// A stored contact.
///
/// `uid` is immutable and unique for the lifetime of the record; a
/// record with a given uid is replaced, never duplicated, on re-add.
/// Summary fields not present in `fields` are treated as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
  pub uid:    String,
  /// Opaque full representation (e.g. vCard text), stored verbatim.
  pub data:   String,
  pub fields: BTreeMap<String, FieldValue>,
}

impl ContactRecord {
  pub fn new(uid: impl Into<String>, data: impl Into<String>) -> Self {
    Self {
      uid:    uid.into(),
      data:   data.into(),
      fields: BTreeMap::new(),
    }
  }

  /// Builder-style setter used pervasively by callers and tests.
  pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
    self.fields.insert(name.to_owned(), value);
    self
  }

  pub fn with_text(self, name: &str, value: &str) -> Self {
    self.with_field(name, FieldValue::Text(value.to_owned()))
  }

  pub fn field(&self, name: &str) -> Option<&FieldValue> {
    self.fields.get(name)
  }

  /// The stored text for `name`, or `""` when absent — the shape the
  /// sort-key derivation wants, since missing values collate first.
  pub fn text_or_empty(&self, name: &str) -> &str {
    self.field(name).and_then(FieldValue::as_text).unwrap_or("")
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_value_untagged_roundtrip() {
    for value in [
      FieldValue::Text("Liddell".into()),
      FieldValue::TextList(vec!["a@x.org".into(), "b@x.org".into()]),
      FieldValue::Bool(true),
    ] {
      let json = serde_json::to_string(&value).unwrap();
      let back: FieldValue = serde_json::from_str(&json).unwrap();
      assert_eq!(back, value);
    }
  }

  #[test]
  fn text_or_empty_defaults_missing_fields() {
    let rec = ContactRecord::new("uid-1", "BEGIN:VCARD...")
      .with_text("family_name", "Liddell");
    assert_eq!(rec.text_or_empty("family_name"), "Liddell");
    assert_eq!(rec.text_or_empty("given_name"), "");
  }
}

//! The declarative contact query language.
//!
//! A query is a tree of field tests combined with boolean operators.
//! Validation against a store's summary field set happens here;
//! turning a validated expression into an executable predicate is the
//! storage backend's job.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  field::{FieldKind, SummaryField},
  record::FieldValue,
};

// ─── Comparator ──────────────────────────────────────────────────────────────

/// How a field test compares the stored value against the operand.
/// All string comparators match case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
  /// Exact match.
  Is,
  /// Substring match; never index-accelerated.
  Contains,
  BeginsWith,
  EndsWith,
  /// The field has a (non-null) value; takes no operand.
  Exists,
}

// ─── QueryExpr ───────────────────────────────────────────────────────────────

/// A query expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QueryExpr {
  Field {
    field: String,
    cmp:   Comparator,
    /// Absent only for [`Comparator::Exists`].
    value: Option<FieldValue>,
  },
  And(Vec<QueryExpr>),
  Or(Vec<QueryExpr>),
  Not(Box<QueryExpr>),
}

impl QueryExpr {
  /// `field is value` test over a text field.
  pub fn is(field: &str, value: &str) -> Self {
    Self::field_test(field, Comparator::Is, FieldValue::Text(value.into()))
  }

  pub fn contains(field: &str, value: &str) -> Self {
    Self::field_test(field, Comparator::Contains, FieldValue::Text(value.into()))
  }

  pub fn begins_with(field: &str, value: &str) -> Self {
    Self::field_test(field, Comparator::BeginsWith, FieldValue::Text(value.into()))
  }

  pub fn ends_with(field: &str, value: &str) -> Self {
    Self::field_test(field, Comparator::EndsWith, FieldValue::Text(value.into()))
  }

  pub fn is_bool(field: &str, value: bool) -> Self {
    Self::field_test(field, Comparator::Is, FieldValue::Bool(value))
  }

  pub fn exists(field: &str) -> Self {
    Self::Field { field: field.to_owned(), cmp: Comparator::Exists, value: None }
  }

  fn field_test(field: &str, cmp: Comparator, value: FieldValue) -> Self {
    Self::Field { field: field.to_owned(), cmp, value: Some(value) }
  }

  /// Check the expression is well-formed against `fields`. Malformed
  /// expressions fail here, at construction time, never during
  /// execution.
  pub fn validate(&self, fields: &[SummaryField]) -> Result<()> {
    match self {
      Self::Field { field, cmp, value } => {
        let def = fields
          .iter()
          .find(|f| f.name == *field)
          .ok_or_else(|| Error::UnknownField(field.clone()))?;
        validate_test(def, *cmp, value.as_ref())
      }
      Self::And(children) | Self::Or(children) => {
        if children.is_empty() {
          return Err(Error::InvalidQuery(
            "empty boolean combination".to_owned(),
          ));
        }
        children.iter().try_for_each(|c| c.validate(fields))
      }
      Self::Not(inner) => inner.validate(fields),
    }
  }
}

fn validate_test(
  def:   &SummaryField,
  cmp:   Comparator,
  value: Option<&FieldValue>,
) -> Result<()> {
  match (cmp, value) {
    (Comparator::Exists, None) => Ok(()),
    (Comparator::Exists, Some(_)) => Err(Error::InvalidQuery(format!(
      "exists test on {:?} takes no operand",
      def.name
    ))),
    (_, None) => Err(Error::InvalidQuery(format!(
      "comparator on {:?} requires an operand",
      def.name
    ))),
    (Comparator::Is, Some(FieldValue::Bool(_))) if def.kind == FieldKind::Bool => {
      Ok(())
    }
    (_, Some(FieldValue::Text(_)))
      if matches!(def.kind, FieldKind::Text | FieldKind::TextList) =>
    {
      Ok(())
    }
    (cmp, Some(value)) => Err(Error::InvalidQuery(format!(
      "comparator {cmp:?} with operand {value:?} does not apply to field {:?} of kind {:?}",
      def.name, def.kind
    ))),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

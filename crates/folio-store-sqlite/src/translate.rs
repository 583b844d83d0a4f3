//! Query translation: [`QueryExpr`] → an executable SQL predicate.
//!
//! Expressions are validated structurally first (in `folio-core`),
//! then lowered to a WHERE fragment over the filter columns. When the
//! referenced field is indexed the fragment takes an index-friendly
//! shape (equality, prefix pattern, or a prefix over the reversed
//! suffix column); otherwise it degrades to a LIKE scan, which is
//! still correct, just not accelerated.

use folio_core::{
  field::{FieldKind, SummaryField},
  query::{Comparator, QueryExpr},
  record::FieldValue,
};
use rusqlite::types::Value;

use crate::{
  Error, Result,
  encode::{fold, reverse_fold},
};

// ─── Predicate ───────────────────────────────────────────────────────────────

/// A WHERE fragment with its bound parameters. `r` is the records
/// table alias the fragment assumes.
#[derive(Debug, Clone)]
pub struct SqlPredicate {
  pub sql:          String,
  pub params:       Vec<Value>,
  /// Whether the whole predicate can be driven from indexes; purely
  /// advisory (logged, never changes results).
  pub index_backed: bool,
}

/// Translate a validated expression against `fields`.
pub fn translate(expr: &QueryExpr, fields: &[SummaryField]) -> Result<SqlPredicate> {
  expr.validate(fields)?;

  let mut params = Vec::new();
  let (sql, index_backed) = lower(expr, fields, &mut params)?;
  Ok(SqlPredicate { sql, params, index_backed })
}

fn lower(
  expr:   &QueryExpr,
  fields: &[SummaryField],
  params: &mut Vec<Value>,
) -> Result<(String, bool)> {
  match expr {
    QueryExpr::Field { field, cmp, value } => {
      // Lookup cannot fail post-validation, but stay total.
      let def = fields
        .iter()
        .find(|f| f.name == *field)
        .ok_or_else(|| Error::InvalidQuery(format!("unknown field {field:?}")))?;
      Ok(lower_test(def, *cmp, value.as_ref(), params))
    }
    QueryExpr::And(children) => {
      let lowered = children
        .iter()
        .map(|c| lower(c, fields, params))
        .collect::<Result<Vec<_>>>()?;
      let sql = join(&lowered, " AND ");
      // One indexed conjunct is enough to avoid a full scan.
      let indexed = lowered.iter().any(|(_, i)| *i);
      Ok((sql, indexed))
    }
    QueryExpr::Or(children) => {
      let lowered = children
        .iter()
        .map(|c| lower(c, fields, params))
        .collect::<Result<Vec<_>>>()?;
      let sql = join(&lowered, " OR ");
      // A disjunction scans unless every branch is indexed.
      let indexed = lowered.iter().all(|(_, i)| *i);
      Ok((sql, indexed))
    }
    QueryExpr::Not(inner) => {
      let (sql, _) = lower(inner, fields, params)?;
      Ok((format!("NOT ({sql})"), false))
    }
  }
}

fn join(lowered: &[(String, bool)], sep: &str) -> String {
  let parts: Vec<String> =
    lowered.iter().map(|(sql, _)| format!("({sql})")).collect();
  parts.join(sep)
}

// ─── Field tests ─────────────────────────────────────────────────────────────

fn lower_test(
  def:    &SummaryField,
  cmp:    Comparator,
  value:  Option<&FieldValue>,
  params: &mut Vec<Value>,
) -> (String, bool) {
  if def.kind == FieldKind::TextList {
    let (inner, indexed) =
      value_test("aux.value", "aux.value_rev", def, cmp, value, params);
    let sql = format!(
      "EXISTS (SELECT 1 FROM records_{f} aux WHERE aux.uid = r.uid AND {inner})",
      f = def.name
    );
    return (sql, indexed);
  }

  if def.kind == FieldKind::Bool {
    return match (cmp, value) {
      (Comparator::Exists, _) => (format!("r.{} IS NOT NULL", def.name), true),
      (_, Some(FieldValue::Bool(b))) => {
        params.push(Value::Integer(i64::from(*b)));
        (format!("r.{} = ?", def.name), true)
      }
      // Unreachable post-validation.
      _ => ("0".to_owned(), true),
    };
  }

  let column = format!("r.{}", def.name);
  let rev_column = format!("r.{}_rev", def.name);
  value_test(&column, &rev_column, def, cmp, value, params)
}

fn value_test(
  column:     &str,
  rev_column: &str,
  def:        &SummaryField,
  cmp:        Comparator,
  value:      Option<&FieldValue>,
  params:     &mut Vec<Value>,
) -> (String, bool) {
  let operand = value.and_then(FieldValue::as_text).unwrap_or("");

  match cmp {
    Comparator::Exists => (format!("{column} IS NOT NULL"), true),
    Comparator::Is => {
      params.push(Value::Text(fold(operand)));
      (format!("{column} = ?"), def.indexed)
    }
    Comparator::BeginsWith => {
      params.push(Value::Text(format!("{}%", like_escape(&fold(operand)))));
      (format!("{column} LIKE ? ESCAPE '\\'"), def.indexed)
    }
    Comparator::EndsWith if def.suffix_indexed => {
      params.push(Value::Text(format!(
        "{}%",
        like_escape(&reverse_fold(operand))
      )));
      (format!("{rev_column} LIKE ? ESCAPE '\\'"), true)
    }
    Comparator::EndsWith => {
      params.push(Value::Text(format!("%{}", like_escape(&fold(operand)))));
      (format!("{column} LIKE ? ESCAPE '\\'"), false)
    }
    Comparator::Contains => {
      params.push(Value::Text(format!("%{}%", like_escape(&fold(operand)))));
      (format!("{column} LIKE ? ESCAPE '\\'"), false)
    }
  }
}

/// Escape LIKE metacharacters in an operand.
fn like_escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use folio_core::field::default_fields;

  #[test]
  fn prefix_on_indexed_field_is_index_backed() {
    let p =
      translate(&QueryExpr::begins_with("family_name", "Li"), &default_fields())
        .unwrap();
    assert!(p.index_backed);
    assert_eq!(p.params, vec![Value::Text("li%".into())]);
  }

  #[test]
  fn suffix_uses_reversed_column_when_available() {
    let p = translate(&QueryExpr::ends_with("email", ".COM"), &default_fields())
      .unwrap();
    assert!(p.index_backed);
    assert!(p.sql.contains("aux.value_rev LIKE"));
    assert_eq!(p.params, vec![Value::Text("moc.%".into())]);
  }

  #[test]
  fn suffix_without_index_falls_back_to_scan() {
    let p = translate(&QueryExpr::ends_with("nickname", "ie"), &default_fields())
      .unwrap();
    assert!(!p.index_backed);
    assert_eq!(p.params, vec![Value::Text("%ie".into())]);
  }

  #[test]
  fn contains_is_never_index_backed() {
    let p =
      translate(&QueryExpr::contains("full_name", "ann"), &default_fields())
        .unwrap();
    assert!(!p.index_backed);
  }

  #[test]
  fn like_metacharacters_are_escaped() {
    let p = translate(
      &QueryExpr::contains("full_name", "100%_done"),
      &default_fields(),
    )
    .unwrap();
    assert_eq!(p.params, vec![Value::Text("%100\\%\\_done%".into())]);
  }

  #[test]
  fn malformed_expression_fails_translation() {
    let err = translate(&QueryExpr::is("no_such", "x"), &default_fields())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidQuery(_)));
  }
}

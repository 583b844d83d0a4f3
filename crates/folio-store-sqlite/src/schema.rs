//! SQL schema for the folio SQLite store.
//!
//! Unlike a fixed DDL constant, most of the schema is generated from
//! the configured summary field set: one filter column per scalar
//! field, a reversed copy for suffix-indexed fields, a sort-key column
//! for sortable fields, and an auxiliary table per list field. The
//! meta table pins the field spec and active locale so reopening a
//! store sees the same shape. Future migrations gate on
//! `PRAGMA user_version`.

use folio_core::field::{FieldKind, SummaryField};

/// Fixed prelude; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const PRELUDE: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS folio_meta (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);

PRAGMA user_version = 1;
";

pub const META_LOCALE: &str = "locale";
pub const META_FIELDS: &str = "fields";

/// Generate the records table, per-list-field auxiliary tables, and
/// all indexes for `fields`.
pub fn generate_ddl(fields: &[SummaryField]) -> String {
  let mut ddl = String::new();

  // Main table. `summary` holds the full field map as JSON; the
  // per-field columns are case-folded filter projections of it.
  ddl.push_str(
    "CREATE TABLE IF NOT EXISTS records (\n    \
     uid      TEXT PRIMARY KEY,\n    \
     data     TEXT NOT NULL,\n    \
     summary  TEXT NOT NULL",
  );
  for field in fields {
    match field.kind {
      FieldKind::Text => {
        ddl.push_str(&format!(",\n    {} TEXT", field.name));
        if field.suffix_indexed {
          ddl.push_str(&format!(",\n    {}_rev TEXT", field.name));
        }
        if field.sortable {
          ddl.push_str(&format!(
            ",\n    {}_key TEXT NOT NULL DEFAULT ''",
            field.name
          ));
        }
      }
      FieldKind::Bool => {
        ddl.push_str(&format!(",\n    {} INTEGER", field.name));
      }
      FieldKind::TextList => {}
    }
  }
  ddl.push_str("\n);\n");

  // One auxiliary table per list field; rows die with their record.
  for field in fields {
    if field.kind != FieldKind::TextList {
      continue;
    }
    ddl.push_str(&format!(
      "CREATE TABLE IF NOT EXISTS records_{f} (\n    \
       uid    TEXT NOT NULL REFERENCES records(uid) ON DELETE CASCADE,\n    \
       value  TEXT NOT NULL{rev}\n);\n\
       CREATE INDEX IF NOT EXISTS records_{f}_uid_idx ON records_{f}(uid);\n",
      f = field.name,
      rev = if field.suffix_indexed { ",\n    value_rev TEXT NOT NULL" } else { "" },
    ));
  }

  // Filter and sort indexes.
  for field in fields {
    let f = &field.name;
    match field.kind {
      FieldKind::TextList => {
        if field.indexed {
          ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS records_{f}_value_idx ON records_{f}(value);\n"
          ));
        }
        if field.suffix_indexed {
          ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS records_{f}_rev_idx ON records_{f}(value_rev);\n"
          ));
        }
      }
      _ => {
        if field.indexed {
          ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS records_{f}_idx ON records({f});\n"
          ));
        }
        if field.suffix_indexed {
          ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS records_{f}_rev_idx ON records({f}_rev);\n"
          ));
        }
        if field.sortable {
          ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS records_{f}_key_idx ON records({f}_key);\n"
          ));
        }
      }
    }
  }

  ddl
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use folio_core::field::default_fields;

  #[test]
  fn default_ddl_covers_all_projections() {
    let ddl = generate_ddl(&default_fields());

    assert!(ddl.contains("family_name TEXT"));
    assert!(ddl.contains("family_name_key TEXT NOT NULL DEFAULT ''"));
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS records_email"));
    assert!(ddl.contains("value_rev TEXT NOT NULL"));
    assert!(ddl.contains("records_email_rev_idx"));
    assert!(ddl.contains("is_list INTEGER"));
    // Unsortable fields get no key column.
    assert!(!ddl.contains("nickname_key"));
  }
}

//! [`SqliteStore`] — the summary store over a single SQLite file.
//!
//! Mutations (`add_or_replace`, `delete`, `set_locale`) serialize on
//! the connection mutex; the active collator sits behind its own lock
//! so a locale swap is atomic from readers' perspective. Cursor state
//! validity is tracked with a locale epoch that bumps on every
//! successful migration.

use std::{
  path::Path,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
  },
};

use rusqlite::{
  Connection, OptionalExtension as _, Transaction, params, params_from_iter,
  types::Value,
};
use tracing::{debug, info};

use folio_collate::{Collator, Locale};
use folio_core::{
  backend::ContactBackend,
  cancel::CancellationToken,
  field::{FieldKind, SummaryField, default_fields, validate_fields},
  query::QueryExpr,
  record::{ContactRecord, FieldValue},
};

use crate::{
  Error, Result,
  encode::{
    RawRecord, decode_summary, encode_summary, fold, reverse_fold, summary_text,
  },
  schema::{self, META_FIELDS, META_LOCALE},
  translate::translate,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Summary configuration a store is created with. Immutable for the
/// store's lifetime except the locale, which `set_locale` migrates.
#[derive(Debug, Clone)]
pub struct StoreConfig {
  pub fields: Vec<SummaryField>,
  /// Initial locale; ignored when reopening a store that already
  /// persisted one.
  pub locale: Locale,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      fields: default_fields(),
      locale: Locale {
        language:  "en".to_owned(),
        territory: Some("US".to_owned()),
      },
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A contact summary store backed by a single SQLite file.
///
/// Cloning is cheap — all clones share the same connection and
/// collator.
#[derive(Clone)]
pub struct SqliteStore {
  inner: Arc<Inner>,
}

struct Inner {
  conn:     Mutex<Connection>,
  collator: RwLock<Collator>,
  fields:   Vec<SummaryField>,
  /// Bumped on every successful locale migration; cursors compare
  /// against the epoch they established their position under.
  epoch:    AtomicU64,
}

pub(crate) fn check_cancel(cancel: Option<&CancellationToken>) -> Result<()> {
  match cancel {
    Some(token) if token.is_cancelled() => Err(Error::Cancelled),
    _ => Ok(()),
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
    Self::init(Connection::open(path)?, config)
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory(config: StoreConfig) -> Result<Self> {
    Self::init(Connection::open_in_memory()?, config)
  }

  fn init(conn: Connection, config: StoreConfig) -> Result<Self> {
    validate_fields(&config.fields)?;
    conn.execute_batch(schema::PRELUDE)?;

    // The persisted field spec is authoritative: opening with a
    // different spec is a hard error, not a silent re-index.
    let locale = match meta_get(&conn, META_FIELDS)? {
      Some(json) => {
        let stored: Vec<SummaryField> = serde_json::from_str(&json)?;
        if stored != config.fields {
          return Err(Error::Query(
            "summary configuration does not match the on-disk store".to_owned(),
          ));
        }
        let spelled = meta_get(&conn, META_LOCALE)?.ok_or_else(|| {
          Error::Query("store meta is missing its locale".to_owned())
        })?;
        spelled.parse::<Locale>()?
      }
      None => {
        meta_set(&conn, META_FIELDS, &serde_json::to_string(&config.fields)?)?;
        meta_set(&conn, META_LOCALE, &config.locale.to_string())?;
        config.locale.clone()
      }
    };

    conn.execute_batch(&schema::generate_ddl(&config.fields))?;
    info!(locale = %locale, "opened contact store");

    Ok(Self {
      inner: Arc::new(Inner {
        conn:     Mutex::new(conn),
        collator: RwLock::new(Collator::new(locale)),
        fields:   config.fields,
        epoch:    AtomicU64::new(0),
      }),
    })
  }

  pub fn fields(&self) -> &[SummaryField] {
    &self.inner.fields
  }

  /// A snapshot of the active collator. Taken under the read lock, so
  /// callers never observe a half-swapped collator.
  pub fn collator(&self) -> Collator {
    self
      .inner
      .collator
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn locale(&self) -> Locale {
    self.collator().locale().clone()
  }

  pub(crate) fn locale_epoch(&self) -> u64 {
    self.inner.epoch.load(Ordering::Acquire)
  }

  pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
    self.inner.conn.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// Insert a record, or replace the record with the same uid. All
  /// sort keys and index projections are recomputed.
  pub fn add_or_replace(
    &self,
    record: &ContactRecord,
    cancel: Option<&CancellationToken>,
  ) -> Result<()> {
    check_cancel(cancel)?;
    let collator = self.collator();
    let mut conn = self.conn();
    let tx = conn.transaction()?;
    write_record(&tx, &self.inner.fields, &collator, record, true)?;
    tx.commit()?;
    debug!(uid = %record.uid, "stored record");
    Ok(())
  }

  /// Retrieve a record by uid.
  pub fn get(&self, uid: &str) -> Result<ContactRecord> {
    let conn = self.conn();
    let raw = conn
      .query_row(
        "SELECT uid, data, summary FROM records WHERE uid = ?1",
        params![uid],
        |row| {
          Ok(RawRecord {
            uid:     row.get(0)?,
            data:    row.get(1)?,
            summary: row.get(2)?,
          })
        },
      )
      .optional()?;

    raw.ok_or_else(|| Error::NotFound(uid.to_owned()))?.into_record()
  }

  /// Delete a record by uid.
  pub fn delete(
    &self,
    uid: &str,
    cancel: Option<&CancellationToken>,
  ) -> Result<()> {
    check_cancel(cancel)?;
    let conn = self.conn();
    let deleted = conn.execute("DELETE FROM records WHERE uid = ?1", params![uid])?;
    if deleted == 0 {
      return Err(Error::NotFound(uid.to_owned()));
    }
    debug!(uid = %uid, "deleted record");
    Ok(())
  }

  /// Return all records matching `query` (all records when `None`),
  /// ordered by uid.
  pub fn list(
    &self,
    query: Option<&QueryExpr>,
    cancel: Option<&CancellationToken>,
  ) -> Result<Vec<ContactRecord>> {
    check_cancel(cancel)?;

    let predicate = query
      .map(|q| translate(q, &self.inner.fields))
      .transpose()?;
    if let Some(p) = &predicate {
      if !p.index_backed {
        debug!("filter has no indexed strategy; scanning");
      }
    }

    let (where_clause, bound) = match &predicate {
      Some(p) => (format!("WHERE {}", p.sql), p.params.clone()),
      None => (String::new(), Vec::new()),
    };
    let sql = format!(
      "SELECT r.uid, r.data, r.summary FROM records r {where_clause} ORDER BY r.uid"
    );

    let conn = self.conn();
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(bound), |row| {
        Ok(RawRecord {
          uid:     row.get(0)?,
          data:    row.get(1)?,
          summary: row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    check_cancel(cancel)?;
    raws.into_iter().map(RawRecord::into_record).collect()
  }

  // ── Locale migration ──────────────────────────────────────────────────────

  /// Switch the active locale, regenerating every stored sort key
  /// under the new collator. All-or-nothing: on any failure
  /// (including cancellation) the previous locale and keys remain.
  /// Live cursors established under the old locale are invalidated.
  pub fn set_locale(
    &self,
    locale: &str,
    cancel: Option<&CancellationToken>,
  ) -> Result<()> {
    check_cancel(cancel)?;
    let parsed: Locale = locale.parse()?;
    if parsed == self.locale() {
      debug!(locale = %parsed, "locale unchanged");
      return Ok(());
    }

    let collator = Collator::new(parsed.clone());
    let sortable: Vec<&SummaryField> =
      self.inner.fields.iter().filter(|f| f.sortable).collect();

    let mut conn = self.conn();
    let tx = conn.transaction()?;
    let mut migrated = 0_usize;
    {
      if !sortable.is_empty() {
        let mut read = tx.prepare("SELECT uid, summary FROM records")?;
        let rows = read
          .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let assignments: Vec<String> =
          sortable.iter().map(|f| format!("{}_key = ?", f.name)).collect();
        let update_sql =
          format!("UPDATE records SET {} WHERE uid = ?", assignments.join(", "));
        let mut update = tx.prepare(&update_sql)?;

        for (uid, summary) in rows {
          // Dropping the transaction on the error path rolls every
          // key back.
          check_cancel(cancel)?;
          let fields = decode_summary(&summary)?;
          let mut bound: Vec<Value> = sortable
            .iter()
            .map(|f| Value::Text(collator.sort_key(summary_text(&fields, &f.name))))
            .collect();
          bound.push(Value::Text(uid));
          update.execute(params_from_iter(bound))?;
          migrated += 1;
        }
      }

      tx.execute(
        "INSERT OR REPLACE INTO folio_meta (key, value) VALUES (?1, ?2)",
        params![META_LOCALE, parsed.to_string()],
      )?;
    }
    tx.commit()?;

    *self
      .inner
      .collator
      .write()
      .unwrap_or_else(PoisonError::into_inner) = collator;
    self.inner.epoch.fetch_add(1, Ordering::AcqRel);

    info!(locale = %parsed, records = migrated, "locale migrated");
    Ok(())
  }
}

// ─── Record writes ───────────────────────────────────────────────────────────

/// Write one record inside `tx`: the main row (with fold/reverse/key
/// projections) plus list-field auxiliary rows.
fn write_record(
  tx:       &Transaction<'_>,
  fields:   &[SummaryField],
  collator: &Collator,
  record:   &ContactRecord,
  replace:  bool,
) -> Result<()> {
  let mut columns: Vec<String> =
    vec!["uid".to_owned(), "data".to_owned(), "summary".to_owned()];
  let mut values: Vec<Value> = vec![
    Value::Text(record.uid.clone()),
    Value::Text(record.data.clone()),
    Value::Text(encode_summary(&record.fields)?),
  ];

  for field in fields {
    match field.kind {
      FieldKind::TextList => {}
      FieldKind::Bool => {
        columns.push(field.name.clone());
        values.push(
          match record.field(&field.name).and_then(FieldValue::as_bool) {
            Some(b) => Value::Integer(i64::from(b)),
            None => Value::Null,
          },
        );
      }
      FieldKind::Text => {
        // A value of the wrong shape projects as null; the summary
        // JSON still carries it verbatim.
        let text = record.field(&field.name).and_then(FieldValue::as_text);
        columns.push(field.name.clone());
        values.push(match text {
          Some(t) => Value::Text(fold(t)),
          None => Value::Null,
        });
        if field.suffix_indexed {
          columns.push(format!("{}_rev", field.name));
          values.push(match text {
            Some(t) => Value::Text(reverse_fold(t)),
            None => Value::Null,
          });
        }
        if field.sortable {
          columns.push(format!("{}_key", field.name));
          values.push(Value::Text(collator.sort_key(text.unwrap_or(""))));
        }
      }
    }
  }

  let placeholders = vec!["?"; columns.len()].join(", ");
  let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
  let sql = format!(
    "{verb} INTO records ({}) VALUES ({placeholders})",
    columns.join(", ")
  );
  tx.execute(&sql, params_from_iter(values))?;

  for field in fields {
    if field.kind != FieldKind::TextList {
      continue;
    }
    tx.execute(
      &format!("DELETE FROM records_{} WHERE uid = ?1", field.name),
      params![record.uid],
    )?;
    let Some(items) = record.field(&field.name).and_then(FieldValue::as_text_list)
    else {
      continue;
    };
    for item in items {
      if field.suffix_indexed {
        tx.execute(
          &format!(
            "INSERT INTO records_{} (uid, value, value_rev) VALUES (?1, ?2, ?3)",
            field.name
          ),
          params![record.uid, fold(item), reverse_fold(item)],
        )?;
      } else {
        tx.execute(
          &format!(
            "INSERT INTO records_{} (uid, value) VALUES (?1, ?2)",
            field.name
          ),
          params![record.uid, fold(item)],
        )?;
      }
    }
  }

  Ok(())
}

// ─── Meta helpers ────────────────────────────────────────────────────────────

fn meta_get(conn: &Connection, key: &str) -> Result<Option<String>> {
  Ok(
    conn
      .query_row(
        "SELECT value FROM folio_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
      )
      .optional()?,
  )
}

fn meta_set(conn: &Connection, key: &str, value: &str) -> Result<()> {
  conn.execute(
    "INSERT OR REPLACE INTO folio_meta (key, value) VALUES (?1, ?2)",
    params![key, value],
  )?;
  Ok(())
}

// ─── ContactBackend impl ─────────────────────────────────────────────────────

impl ContactBackend for SqliteStore {
  type Error = Error;

  fn create(&self, record: &ContactRecord) -> Result<()> {
    let collator = self.collator();
    let mut conn = self.conn();
    let tx = conn.transaction()?;
    write_record(&tx, &self.inner.fields, &collator, record, false)?;
    tx.commit()?;
    debug!(uid = %record.uid, "created record");
    Ok(())
  }

  fn modify(&self, record: &ContactRecord) -> Result<()> {
    let collator = self.collator();
    let mut conn = self.conn();
    let tx = conn.transaction()?;

    let exists: bool = tx
      .query_row(
        "SELECT 1 FROM records WHERE uid = ?1",
        params![record.uid],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false);
    if !exists {
      return Err(Error::NotFound(record.uid.clone()));
    }

    write_record(&tx, &self.inner.fields, &collator, record, true)?;
    tx.commit()?;
    debug!(uid = %record.uid, "modified record");
    Ok(())
  }

  fn fetch(&self, uid: &str) -> Result<ContactRecord> {
    self.get(uid)
  }

  fn list(
    &self,
    query: Option<&QueryExpr>,
    cancel: Option<&CancellationToken>,
  ) -> Result<Vec<ContactRecord>> {
    SqliteStore::list(self, query, cancel)
  }

  fn remove(&self, uid: &str) -> Result<()> {
    self.delete(uid, None)
  }
}

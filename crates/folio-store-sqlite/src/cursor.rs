//! The paging [`Cursor`] over a store's filtered, ordered view.
//!
//! A cursor never holds a SQLite statement open between calls. Its
//! position is the ordering tuple (sort keys plus uid) of the last
//! record it stepped onto, or a sentinel before/after the whole view;
//! each step translates that position into a keyset boundary predicate
//! and runs a fresh bounded query. Concurrent writes therefore never
//! wedge a cursor — new rows simply appear in, or vanish from, the
//! pages around its position.

use rusqlite::{params_from_iter, types::Value};
use tracing::debug;

use folio_core::{
  cancel::CancellationToken,
  cursor::{CursorPlacement, Origin, SortDirection, SortField, StepMode, StepOutcome},
  query::QueryExpr,
  record::ContactRecord,
};

use crate::{
  Error, Result, SqliteStore,
  encode::RawRecord,
  store::check_cancel,
  translate::{SqlPredicate, translate},
};

// ─── State ───────────────────────────────────────────────────────────────────

/// Where the cursor sits in its total order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Anchor {
  /// Sentinel before the first record. Also the initial state.
  Before,
  /// Sentinel after the last record.
  After,
  /// The ordering tuple of the last record stepped onto. The tuple
  /// remains a valid boundary even after that record is deleted.
  At { keys: Vec<String>, uid: String },
}

#[derive(Debug, Clone)]
struct State {
  anchor: Anchor,
  /// Locale epoch the anchor's keys were produced under.
  epoch:  u64,
}

/// One row pulled by a step query.
struct Row {
  uid:     String,
  keys:    Vec<String>,
  /// `(data, summary)` — present only when the step fetches.
  payload: Option<(String, String)>,
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

pub struct Cursor {
  store:  SqliteStore,
  sort:   Vec<SortField>,
  filter: Option<SqlPredicate>,
  state:  State,
}

impl SqliteStore {
  /// Create a cursor over this store. `sort` must name at least one
  /// sortable summary field; `filter` restricts the view.
  pub fn cursor(
    &self,
    sort: Vec<SortField>,
    filter: Option<&QueryExpr>,
  ) -> Result<Cursor> {
    if sort.is_empty() {
      return Err(Error::InvalidQuery(
        "cursor requires at least one sort field".to_owned(),
      ));
    }
    for sf in &sort {
      let known = self
        .fields()
        .iter()
        .any(|f| f.name == sf.field && f.sortable);
      if !known {
        return Err(Error::InvalidQuery(format!(
          "field `{}` is not sortable",
          sf.field
        )));
      }
    }

    let filter = filter.map(|q| translate(q, self.fields())).transpose()?;

    Ok(Cursor {
      store: self.clone(),
      sort,
      filter,
      state: State { anchor: Anchor::Before, epoch: self.locale_epoch() },
    })
  }
}

impl Cursor {
  /// Move and/or fetch up to `count.abs()` records from `origin`,
  /// forward for positive counts and backward for negative ones.
  ///
  /// Traversing fewer records than requested means the view was
  /// exhausted; a moving step then parks on the sentinel past that
  /// end. Fetched records always come back in canonical forward
  /// order. `Origin::Current` on a cursor positioned under a locale
  /// since migrated fails with [`Error::InvalidCursorState`].
  pub fn step(
    &mut self,
    mode: StepMode,
    origin: Origin,
    count: i64,
    cancel: Option<&CancellationToken>,
  ) -> Result<StepOutcome<ContactRecord>> {
    check_cancel(cancel)?;

    let epoch = self.store.locale_epoch();
    let anchor = self.resolve_origin(origin, epoch)?;
    let forward = count >= 0;
    let limit = count.unsigned_abs().min(i64::MAX as u64) as i64;

    if limit == 0 {
      // A zero-count step still re-anchors on Begin/End.
      if mode.moves() {
        self.state = State { anchor, epoch };
      }
      return Ok(StepOutcome::default());
    }

    let rows = self.select_rows(&anchor, forward, limit, mode.fetches())?;
    check_cancel(cancel)?;

    let traversed = rows.len();
    debug!(?origin, count, traversed, "cursor step");

    if mode.moves() {
      let anchor = match rows.last() {
        Some(row) => Anchor::At { keys: row.keys.clone(), uid: row.uid.clone() },
        None if forward => Anchor::After,
        None => Anchor::Before,
      };
      self.state = State { anchor, epoch };
    }

    let mut records = Vec::new();
    if mode.fetches() {
      records = rows
        .into_iter()
        .map(|row| {
          let (data, summary) = row.payload.unwrap_or_default();
          RawRecord { uid: row.uid, data, summary }.into_record()
        })
        .collect::<Result<Vec<_>>>()?;
      if !forward {
        records.reverse();
      }
    }

    Ok(StepOutcome { traversed, records })
  }

  /// Position the cursor just before the first record of the given
  /// alphabetic index bucket, so a forward step fetches that bucket's
  /// first members and a backward step fetches the records preceding
  /// it.
  pub fn set_target_alphabetic_index(&mut self, bucket: usize) -> Result<()> {
    let epoch = self.store.locale_epoch();
    let collator = self.store.collator();
    let boundary = collator.boundary_key(bucket).ok_or_else(|| {
      Error::InvalidQuery(format!(
        "alphabetic bucket {bucket} out of range for locale {} ({} buckets)",
        collator.locale(),
        collator.bucket_count()
      ))
    })?;

    // The boundary tuple collates strictly before every tuple of a
    // record in the bucket and strictly after every record of earlier
    // buckets, because real primary keys are never empty and real
    // uids are non-empty.
    let mut keys = vec![boundary];
    keys.resize(self.sort.len(), String::new());
    self.state =
      State { anchor: Anchor::At { keys, uid: String::new() }, epoch };
    Ok(())
  }

  /// Total record count of the view and the cursor's 1-based position
  /// within it, in one consistent snapshot.
  pub fn calculate(
    &self,
    cancel: Option<&CancellationToken>,
  ) -> Result<CursorPlacement> {
    check_cancel(cancel)?;
    if self.state.epoch != self.store.locale_epoch() {
      return Err(Error::InvalidCursorState);
    }

    let conn = self.store.conn();

    let count = |boundary: Option<&Anchor>| -> Result<usize> {
      let mut conds: Vec<String> = Vec::new();
      let mut bound: Vec<Value> = Vec::new();
      if let Some(f) = &self.filter {
        conds.push(format!("({})", f.sql));
        bound.extend(f.params.iter().cloned());
      }
      if let Some(Anchor::At { keys, uid }) = boundary {
        // Count records at or before the anchor: tuple <= anchor.
        conds.push(self.boundary_sql(keys, uid, false, true, &mut bound));
      }
      let where_clause = if conds.is_empty() {
        String::new()
      } else {
        format!("WHERE {}", conds.join(" AND "))
      };
      let sql = format!("SELECT COUNT(*) FROM records r {where_clause}");
      let n: i64 =
        conn.query_row(&sql, params_from_iter(bound), |row| row.get(0))?;
      Ok(n as usize)
    };

    let total = count(None)?;
    check_cancel(cancel)?;
    let position = match &self.state.anchor {
      Anchor::Before => 0,
      Anchor::After => total + 1,
      at @ Anchor::At { .. } => count(Some(at))?,
    };

    Ok(CursorPlacement { total, position })
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn resolve_origin(&self, origin: Origin, epoch: u64) -> Result<Anchor> {
    match origin {
      Origin::Begin => Ok(Anchor::Before),
      Origin::End => Ok(Anchor::After),
      Origin::Current => {
        if self.state.epoch != epoch {
          return Err(Error::InvalidCursorState);
        }
        Ok(self.state.anchor.clone())
      }
    }
  }

  fn select_rows(
    &self,
    anchor:  &Anchor,
    forward: bool,
    limit:   i64,
    fetch:   bool,
  ) -> Result<Vec<Row>> {
    // Stepping away from the sentinel at the travelled-toward end
    // yields nothing.
    match (anchor, forward) {
      (Anchor::After, true) | (Anchor::Before, false) => return Ok(Vec::new()),
      _ => {}
    }

    let mut conds: Vec<String> = Vec::new();
    let mut bound: Vec<Value> = Vec::new();
    if let Some(f) = &self.filter {
      conds.push(format!("({})", f.sql));
      bound.extend(f.params.iter().cloned());
    }
    if let Anchor::At { keys, uid } = anchor {
      conds.push(self.boundary_sql(keys, uid, forward, false, &mut bound));
    }
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let key_cols: Vec<String> =
      self.sort.iter().map(|sf| format!("r.{}_key", sf.field)).collect();
    let select_cols = if fetch {
      format!("r.uid, r.data, r.summary, {}", key_cols.join(", "))
    } else {
      format!("r.uid, {}", key_cols.join(", "))
    };

    // Backward steps flip every direction; the result set is then in
    // reverse canonical order, which `step` un-reverses for fetches.
    let mut order: Vec<String> = self
      .sort
      .iter()
      .map(|sf| {
        let asc = matches!(sf.direction, SortDirection::Ascending) == forward;
        format!("r.{}_key {}", sf.field, if asc { "ASC" } else { "DESC" })
      })
      .collect();
    order.push(format!("r.uid {}", if forward { "ASC" } else { "DESC" }));

    bound.push(Value::Integer(limit));
    let sql = format!(
      "SELECT {select_cols} FROM records r {where_clause} ORDER BY {} LIMIT ?",
      order.join(", ")
    );

    let conn = self.store.conn();
    let mut stmt = conn.prepare(&sql)?;
    let n_sort = self.sort.len();
    let rows = stmt
      .query_map(params_from_iter(bound), |row| {
        if fetch {
          let uid: String = row.get(0)?;
          let data: String = row.get(1)?;
          let summary: String = row.get(2)?;
          let mut keys = Vec::with_capacity(n_sort);
          for i in 0..n_sort {
            keys.push(row.get::<_, String>(3 + i)?);
          }
          Ok(Row { uid, keys, payload: Some((data, summary)) })
        } else {
          let uid: String = row.get(0)?;
          let mut keys = Vec::with_capacity(n_sort);
          for i in 0..n_sort {
            keys.push(row.get::<_, String>(1 + i)?);
          }
          Ok(Row { uid, keys, payload: None })
        }
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
  }

  /// The keyset boundary predicate for the given anchor tuple, built
  /// innermost-out:
  ///
  /// `(k1 > ?  OR (k1 = ? AND (k2 > ? OR (k2 = ? AND uid > ?))))`
  ///
  /// Each comparison flips with the field's direction and the travel
  /// direction; `include_equal` relaxes only the final uid comparison,
  /// turning "strictly past the anchor" into "at or past it".
  fn boundary_sql(
    &self,
    keys:          &[String],
    uid:           &str,
    forward:       bool,
    include_equal: bool,
    bound:         &mut Vec<Value>,
  ) -> String {
    let uid_op = match (forward, include_equal) {
      (true, false) => ">",
      (true, true) => ">=",
      (false, false) => "<",
      (false, true) => "<=",
    };
    let mut clause = format!("r.uid {uid_op} ?");
    let mut tail: Vec<Value> = vec![Value::Text(uid.to_owned())];

    for (sf, key) in self.sort.iter().zip(keys).rev() {
      let past = matches!(sf.direction, SortDirection::Ascending) == forward;
      let op = if past { ">" } else { "<" };
      let col = format!("r.{}_key", sf.field);
      clause = format!("({col} {op} ? OR ({col} = ? AND {clause}))");
      let mut with_key =
        vec![Value::Text(key.clone()), Value::Text(key.clone())];
      with_key.extend(tail);
      tail = with_key;
    }

    bound.extend(tail);
    clause
  }
}

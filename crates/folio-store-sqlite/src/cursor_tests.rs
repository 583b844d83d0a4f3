use folio_core::{
  cancel::CancellationToken,
  cursor::{Origin, SortField, StepMode},
  query::QueryExpr,
  record::ContactRecord,
};

use crate::{Cursor, Error, SqliteStore, StoreConfig};

// ─── Fixture ─────────────────────────────────────────────────────────────────

// Twenty contacts exercising the interesting collation shapes: a
// missing family name, the Muffler/Müller pivot (English interleaves
// them, German phonebook pulls the umlauts ahead), and the Rosén/Rösen
// accent pair whose relative order differs between English and French.
const PEOPLE: &[(u32, &str, &str)] = &[
  (1, "Apted", "Mary"),
  (2, "Badger", "Owen"),
  (3, "Muffler", "Zelda"),
  (4, "Muffler", "Agnes"),
  (5, "Boggs", "Elena"),
  (6, "Brown", "Ada"),
  (7, "Müller", "Anna"),
  (8, "Müller", "Bernd"),
  (9, "Sanchez", "Luz"),
  (10, "Quincey", "Hugh"),
  (11, "", "Aaron"),
  (12, "Rosén", "Nils"),
  (13, "Rösen", "Karl"),
  (14, "Reid", "Iris"),
  (15, "Nagy", "Ilona"),
  (16, "Owens", "Gil"),
  (17, "Novak", "Petra"),
  (18, "Pratt", "Sam"),
  (19, "Tate", "Finn"),
  (20, "Zimmer", "Else"),
];

const EN_ORDER: &[u32] =
  &[11, 1, 2, 5, 6, 4, 3, 7, 8, 15, 17, 16, 18, 10, 14, 12, 13, 9, 19, 20];
const FR_ORDER: &[u32] =
  &[11, 1, 2, 5, 6, 4, 3, 7, 8, 15, 17, 16, 18, 10, 14, 13, 12, 9, 19, 20];
const DE_ORDER: &[u32] =
  &[11, 1, 2, 5, 6, 7, 8, 4, 3, 15, 17, 16, 18, 10, 14, 13, 12, 9, 19, 20];

fn uid(id: u32) -> String {
  format!("c{id:02}")
}

fn uids(ids: &[u32]) -> Vec<String> {
  ids.iter().map(|&id| uid(id)).collect()
}

fn fixture_store(locale: &str) -> SqliteStore {
  let config = StoreConfig {
    locale: locale.parse().unwrap(),
    ..StoreConfig::default()
  };
  let store = SqliteStore::open_in_memory(config).unwrap();
  for &(id, family, given) in PEOPLE {
    let mut rec = ContactRecord::new(uid(id), format!("vcard:{id}"))
      .with_text("given_name", given);
    if !family.is_empty() {
      rec = rec.with_text("family_name", family);
    }
    store.add_or_replace(&rec, None).unwrap();
  }
  store
}

fn by_name(store: &SqliteStore) -> Cursor {
  store
    .cursor(
      vec![
        SortField::ascending("family_name"),
        SortField::ascending("given_name"),
      ],
      None,
    )
    .unwrap()
}

fn fetched_uids(cursor: &mut Cursor, origin: Origin, count: i64) -> Vec<String> {
  cursor
    .step(StepMode::MoveAndFetch, origin, count, None)
    .unwrap()
    .records
    .into_iter()
    .map(|r| r.uid)
    .collect()
}

// ─── Order ───────────────────────────────────────────────────────────────────

#[test]
fn english_order() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  assert_eq!(fetched_uids(&mut cursor, Origin::Begin, 100), uids(EN_ORDER));
}

#[test]
fn french_order_swaps_the_accent_pair() {
  let store = fixture_store("fr_FR.UTF-8");
  let mut cursor = by_name(&store);
  assert_eq!(fetched_uids(&mut cursor, Origin::Begin, 100), uids(FR_ORDER));
}

#[test]
fn german_phonebook_order_expands_umlauts() {
  let store = fixture_store("de_DE.UTF-8");
  let mut cursor = by_name(&store);
  assert_eq!(fetched_uids(&mut cursor, Origin::Begin, 100), uids(DE_ORDER));
}

#[test]
fn descending_sort_reverses_the_view() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = store
    .cursor(
      vec![
        SortField::descending("family_name"),
        SortField::descending("given_name"),
      ],
      None,
    )
    .unwrap();

  let mut expected = uids(EN_ORDER);
  expected.reverse();
  assert_eq!(fetched_uids(&mut cursor, Origin::Begin, 100), expected);
}

// ─── Paging ──────────────────────────────────────────────────────────────────

#[test]
fn forward_pages_are_gap_free() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);

  let mut seen = fetched_uids(&mut cursor, Origin::Begin, 7);
  loop {
    let page = fetched_uids(&mut cursor, Origin::Current, 7);
    if page.is_empty() {
      break;
    }
    seen.extend(page);
  }
  assert_eq!(seen, uids(EN_ORDER));
}

#[test]
fn first_two_pages_per_locale() {
  for (locale, order) in [
    ("en_US.UTF-8", EN_ORDER),
    ("de_DE.UTF-8", DE_ORDER),
  ] {
    let store = fixture_store(locale);
    let mut cursor = by_name(&store);
    assert_eq!(fetched_uids(&mut cursor, Origin::Begin, 5), uids(&order[..5]));
    assert_eq!(
      fetched_uids(&mut cursor, Origin::Current, 6),
      uids(&order[5..11])
    );
  }
}

#[test]
fn backward_steps_return_forward_order() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);

  // Last five from the end sentinel, still in canonical order.
  assert_eq!(
    fetched_uids(&mut cursor, Origin::End, -5),
    uids(&EN_ORDER[15..])
  );
  // And the five before those.
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, -5),
    uids(&EN_ORDER[10..15])
  );
}

#[test]
fn direction_reversal_is_consistent() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);

  assert_eq!(fetched_uids(&mut cursor, Origin::Begin, 4), uids(&EN_ORDER[..4]));
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 4),
    uids(&EN_ORDER[4..8])
  );
  // Reversing re-traverses through the anchored record's predecessors
  // and lands one short of where the forward pass started.
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, -4),
    uids(&EN_ORDER[3..7])
  );
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 4),
    uids(&EN_ORDER[4..8])
  );
}

#[test]
fn exhaustion_parks_on_the_sentinel() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);

  let out = cursor.step(StepMode::MoveAndFetch, Origin::Begin, 50, None).unwrap();
  assert_eq!(out.traversed, 20);

  // Past the end: nothing forward, but backward picks up the tail.
  let out = cursor.step(StepMode::MoveAndFetch, Origin::Current, 5, None).unwrap();
  assert_eq!(out.traversed, 0);
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, -3),
    uids(&EN_ORDER[17..])
  );
}

#[test]
fn empty_view_steps_traverse_nothing() {
  let store = SqliteStore::open_in_memory(StoreConfig::default()).unwrap();
  let mut cursor = by_name(&store);

  assert_eq!(cursor.step(StepMode::MoveAndFetch, Origin::Begin, 5, None).unwrap().traversed, 0);
  assert_eq!(cursor.step(StepMode::MoveAndFetch, Origin::End, -5, None).unwrap().traversed, 0);
  // The last step was backward, so the cursor parks before the
  // (empty) view.
  let placement = cursor.calculate(None).unwrap();
  assert_eq!((placement.total, placement.position), (0, 0));
}

// ─── Step modes ──────────────────────────────────────────────────────────────

#[test]
fn fetch_only_does_not_advance() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  cursor.step(StepMode::MoveOnly, Origin::Begin, 3, None).unwrap();

  let page = |c: &mut Cursor| {
    c.step(StepMode::FetchOnly, Origin::Current, 4, None)
      .unwrap()
      .records
      .into_iter()
      .map(|r| r.uid)
      .collect::<Vec<_>>()
  };
  let first = page(&mut cursor);
  assert_eq!(first, uids(&EN_ORDER[3..7]));
  assert_eq!(page(&mut cursor), first);
}

#[test]
fn move_only_advances_without_records() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);

  let out = cursor.step(StepMode::MoveOnly, Origin::Begin, 10, None).unwrap();
  assert_eq!(out.traversed, 10);
  assert!(out.records.is_empty());
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 3),
    uids(&EN_ORDER[10..13])
  );
}

#[test]
fn zero_count_step_re_anchors() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  cursor.step(StepMode::MoveOnly, Origin::End, 0, None).unwrap();
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, -2),
    uids(&EN_ORDER[18..])
  );
}

// ─── Alphabetic index ────────────────────────────────────────────────────────

#[test]
fn alphabetic_target_lands_before_the_bucket() {
  let store = fixture_store("en_US.UTF-8");
  let labels = store.collator().labels();
  let m = labels.iter().position(|l| l == "M").unwrap();

  let mut cursor = by_name(&store);
  cursor.set_target_alphabetic_index(m).unwrap();
  // Forward: the M bucket's first members.
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 4),
    uids(&[4, 3, 7, 8])
  );

  cursor.set_target_alphabetic_index(m).unwrap();
  // Backward: the records just before the bucket.
  assert_eq!(fetched_uids(&mut cursor, Origin::Current, -2), uids(&[5, 6]));
}

#[test]
fn alphabetic_target_respects_the_locale() {
  let store = fixture_store("de_DE.UTF-8");
  let labels = store.collator().labels();
  let m = labels.iter().position(|l| l == "M").unwrap();

  let mut cursor = by_name(&store);
  cursor.set_target_alphabetic_index(m).unwrap();
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 4),
    uids(&[7, 8, 4, 3])
  );
}

#[test]
fn out_of_range_bucket_is_rejected() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  let err = cursor
    .set_target_alphabetic_index(store.collator().bucket_count())
    .unwrap_err();
  assert!(matches!(err, Error::InvalidQuery(_)));
}

// ─── Locale invalidation ─────────────────────────────────────────────────────

#[test]
fn locale_change_invalidates_the_position() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  fetched_uids(&mut cursor, Origin::Begin, 5);

  store.set_locale("de_DE.UTF-8", None).unwrap();

  assert!(matches!(
    cursor.step(StepMode::MoveAndFetch, Origin::Current, 5, None),
    Err(Error::InvalidCursorState)
  ));
  assert!(matches!(cursor.calculate(None), Err(Error::InvalidCursorState)));

  // Re-establishing from an endpoint recovers, under the new order.
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Begin, 9),
    uids(&DE_ORDER[..9])
  );
  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 3),
    uids(&DE_ORDER[9..12])
  );
}

// ─── Placement ───────────────────────────────────────────────────────────────

#[test]
fn calculate_tracks_position() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);

  let p = cursor.calculate(None).unwrap();
  assert_eq!((p.total, p.position), (20, 0));

  cursor.step(StepMode::MoveOnly, Origin::Begin, 5, None).unwrap();
  let p = cursor.calculate(None).unwrap();
  assert_eq!((p.total, p.position), (20, 5));

  cursor.step(StepMode::MoveOnly, Origin::End, 0, None).unwrap();
  let p = cursor.calculate(None).unwrap();
  assert_eq!((p.total, p.position), (20, 21));
}

#[test]
fn calculate_survives_anchor_deletion() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  cursor.step(StepMode::MoveOnly, Origin::Begin, 5, None).unwrap();

  // EN_ORDER[4] is the anchored record; the tuple remains a valid
  // boundary after it is gone.
  store.delete(&uid(EN_ORDER[4]), None).unwrap();
  let p = cursor.calculate(None).unwrap();
  assert_eq!((p.total, p.position), (19, 4));

  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 2),
    uids(&EN_ORDER[5..7])
  );
}

// ─── Filtered cursors ────────────────────────────────────────────────────────

#[test]
fn filtered_cursor_pages_the_restricted_view() {
  let store = fixture_store("en_US.UTF-8");
  let filter = QueryExpr::begins_with("family_name", "m");
  let mut cursor = store
    .cursor(
      vec![
        SortField::ascending("family_name"),
        SortField::ascending("given_name"),
      ],
      Some(&filter),
    )
    .unwrap();

  assert_eq!(
    fetched_uids(&mut cursor, Origin::Begin, 10),
    uids(&[4, 3, 7, 8])
  );
  let p = cursor.calculate(None).unwrap();
  assert_eq!((p.total, p.position), (4, 4));
}

#[test]
fn cursor_rejects_unsortable_fields() {
  let store = fixture_store("en_US.UTF-8");
  assert!(matches!(
    store.cursor(vec![SortField::ascending("email")], None),
    Err(Error::InvalidQuery(_))
  ));
  assert!(matches!(
    store.cursor(vec![], None),
    Err(Error::InvalidQuery(_))
  ));
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[test]
fn cancelled_step_leaves_the_position_alone() {
  let store = fixture_store("en_US.UTF-8");
  let mut cursor = by_name(&store);
  fetched_uids(&mut cursor, Origin::Begin, 5);

  let token = CancellationToken::new();
  token.cancel();
  assert!(matches!(
    cursor.step(StepMode::MoveAndFetch, Origin::Current, 5, Some(&token)),
    Err(Error::Cancelled)
  ));

  assert_eq!(
    fetched_uids(&mut cursor, Origin::Current, 3),
    uids(&EN_ORDER[5..8])
  );
}

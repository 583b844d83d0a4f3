//! Cursor vocabulary shared between callers and storage backends.
//!
//! The cursor object itself lives with the backend that executes it;
//! these are the types that appear in its public contract.

use serde::{Deserialize, Serialize};

// ─── Sort configuration ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Ascending,
  Descending,
}

/// One component of a cursor's total order. The uid tie-breaker is
/// always appended by the backend and is not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
  pub field:     String,
  pub direction: SortDirection,
}

impl SortField {
  pub fn ascending(field: &str) -> Self {
    Self { field: field.to_owned(), direction: SortDirection::Ascending }
  }

  pub fn descending(field: &str) -> Self {
    Self { field: field.to_owned(), direction: SortDirection::Descending }
  }
}

// ─── Step parameters ─────────────────────────────────────────────────────────

/// The reference point a move is measured from.
///
/// `Begin` and `End` reset the cursor to the corresponding sentinel
/// before moving; `Current` moves relative to the last-established
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  Begin,
  End,
  Current,
}

/// What a step call does with the records it traverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
  /// Advance position without materializing records.
  MoveOnly,
  /// Return records without advancing position.
  FetchOnly,
  MoveAndFetch,
}

impl StepMode {
  pub fn moves(self) -> bool {
    matches!(self, Self::MoveOnly | Self::MoveAndFetch)
  }

  pub fn fetches(self) -> bool {
    matches!(self, Self::FetchOnly | Self::MoveAndFetch)
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// What a step call traversed and, when fetching, returned.
///
/// `traversed` counts every record the step passed over, which may be
/// fewer than requested when the view is exhausted in that direction.
/// For move-only steps `records` is empty but `traversed` is still
/// exact.
#[derive(Debug, Clone)]
pub struct StepOutcome<R> {
  pub traversed: usize,
  /// Always in the cursor's canonical forward order, even for
  /// backward steps.
  pub records:   Vec<R>,
}

impl<R> Default for StepOutcome<R> {
  fn default() -> Self {
    Self { traversed: 0, records: Vec::new() }
  }
}

/// A cursor's place within its filtered, ordered view.
///
/// `position` is the 1-based index of the last-stepped record; 0 means
/// before the first record and `total + 1` means after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPlacement {
  pub total:    usize,
  pub position: usize,
}

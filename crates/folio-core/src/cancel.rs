//! Cooperative cancellation for blocking store operations.
//!
//! Every store and cursor operation accepts an optional token. A
//! cancelled operation fails with the backend's `Cancelled` error and
//! leaves all observable state unchanged, as if the call had not been
//! made. Dispatch layers that run store calls on worker threads hold a
//! clone and trip it from the requesting side.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

/// A cheaply clonable cancellation flag. All clones observe the same
/// flag; cancellation is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

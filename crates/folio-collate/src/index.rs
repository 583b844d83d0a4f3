//! Locale-driven alphabetic index buckets.
//!
//! The bucket set partitions the sort-key space for scrollbar-style
//! jump navigation: an underflow bucket for strings collating before
//! any letter (digits, punctuation, the empty string), one bucket per
//! letter of the locale's alphabet, and an overflow bucket. The set is
//! derived from the collator's tailoring, never hardcoded.

use crate::key::Collator;

/// Label of the underflow bucket (index 0).
const UNDERFLOW: &str = "#";
/// Label of the overflow bucket (last index).
const OVERFLOW: &str = "\u{2026}";

impl Collator {
  /// Bucket labels in collation order. Index positions are stable for
  /// the lifetime of the collator and feed
  /// `Cursor::set_target_alphabetic_index`.
  pub fn labels(&self) -> Vec<String> {
    let mut labels = Vec::with_capacity(28 + self.tailoring().extra_labels.len());
    labels.push(UNDERFLOW.to_owned());
    labels.extend((b'A'..=b'Z').map(|c| char::from(c).to_string()));
    labels.extend(self.tailoring().extra_labels.iter().map(|&l| l.to_owned()));
    labels.push(OVERFLOW.to_owned());
    labels
  }

  pub fn bucket_count(&self) -> usize {
    28 + self.tailoring().extra_labels.len()
  }

  /// The bucket a string belongs to, judged by the first primary
  /// weight of its sort key.
  pub fn bucket_of(&self, s: &str) -> usize {
    let key = self.sort_key(s);
    match key.as_bytes().first() {
      // Empty primary (the key starts with the level separator) or
      // anything collating before 'a'.
      None | Some(0x01) => 0,
      Some(b) if *b < b'a' => 0,
      Some(b @ b'a'..=b'z') => 1 + usize::from(b - b'a'),
      Some(b) => {
        let extra = usize::from(b.saturating_sub(b'{'));
        let n_extras = self.tailoring().extra_labels.len();
        if extra < n_extras {
          27 + extra
        } else {
          self.bucket_count() - 1
        }
      }
    }
  }

  /// A key prefix that collates strictly before every member of
  /// `bucket` and at-or-after every member of earlier buckets.
  /// `None` when the bucket index is out of range.
  pub fn boundary_key(&self, bucket: usize) -> Option<String> {
    let n_extras = self.tailoring().extra_labels.len();
    match bucket {
      0 => Some(String::new()),
      b @ 1..=26 => Some(char::from(b'a' + (b as u8 - 1)).to_string()),
      b if b - 27 < n_extras => Some(char::from(b'{' + (b as u8 - 27)).to_string()),
      b if b == self.bucket_count() - 1 => Some("~".to_owned()),
      _ => None,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

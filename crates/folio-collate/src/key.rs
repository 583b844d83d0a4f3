//! Sort-key generation.
//!
//! Keys have three levels, concatenated with `\x01` separators so a
//! plain byte comparison yields the collation order:
//!
//! - **primary**: case-folded base letters, with accents stripped and
//!   non-Latin scripts transliterated. Locale tailorings may expand a
//!   letter at this level (German phonebook `ä` → `ae`) or move it
//!   after `z` (Swedish `å`, `ä`, `ö`).
//! - **secondary**: one accent-class digit per source character.
//!   French compares accents from the end of the string, encoded here
//!   by reversing the digit sequence at key-build time.
//! - **tertiary**: one case digit per source character.
//!
//! The empty string keys as `\x01\x01`, which collates before every
//! non-empty key — records missing a sortable field sort first.

use std::cmp::Ordering;

use deunicode::deunicode_char;

use crate::locale::Locale;

// ─── Accent classes ──────────────────────────────────────────────────────────

// Secondary weights, ordered the way the base letter's variants
// collate: e < é < è < ê < ë.
const ACUTE: u8 = 1;
const GRAVE: u8 = 2;
const CIRCUMFLEX: u8 = 3;
const DIAERESIS: u8 = 4;
const TILDE: u8 = 5;
const RING: u8 = 6;
const CARON: u8 = 7;
const CEDILLA: u8 = 8;
const OTHER: u8 = 9;

/// Base letter and accent class for the Latin repertoire the summary
/// engine sees in practice. Anything else falls through to
/// transliteration with the `OTHER` accent class.
fn decompose(c: char) -> Option<(char, u8)> {
  let decomposed = match c {
    'á' => ('a', ACUTE),
    'à' => ('a', GRAVE),
    'â' => ('a', CIRCUMFLEX),
    'ä' => ('a', DIAERESIS),
    'ã' => ('a', TILDE),
    'å' => ('a', RING),
    'ç' => ('c', CEDILLA),
    'č' => ('c', CARON),
    'é' => ('e', ACUTE),
    'è' => ('e', GRAVE),
    'ê' => ('e', CIRCUMFLEX),
    'ë' => ('e', DIAERESIS),
    'ě' => ('e', CARON),
    'í' => ('i', ACUTE),
    'ì' => ('i', GRAVE),
    'î' => ('i', CIRCUMFLEX),
    'ï' => ('i', DIAERESIS),
    'ñ' => ('n', TILDE),
    'ó' => ('o', ACUTE),
    'ò' => ('o', GRAVE),
    'ô' => ('o', CIRCUMFLEX),
    'ö' => ('o', DIAERESIS),
    'õ' => ('o', TILDE),
    'ø' => ('o', OTHER),
    'ř' => ('r', CARON),
    'š' => ('s', CARON),
    'ú' => ('u', ACUTE),
    'ù' => ('u', GRAVE),
    'û' => ('u', CIRCUMFLEX),
    'ü' => ('u', DIAERESIS),
    'ý' => ('y', ACUTE),
    'ÿ' => ('y', DIAERESIS),
    'ž' => ('z', CARON),
    _ => return None,
  };
  Some(decomposed)
}

// ─── Tailorings ──────────────────────────────────────────────────────────────

/// Per-language collation tailoring. Unknown languages use the root
/// tailoring, matching how a missing locale-specific table falls back
/// in the collation data this models.
pub(crate) struct Tailoring {
  pub(crate) backward_secondary: bool,
  /// Primary-level rewrites applied before decomposition, with the
  /// secondary weight that distinguishes the rewrite from its
  /// spelled-out form (`ü` sorts after `ue`).
  pub(crate) primary_overrides:  &'static [(char, &'static str, u8)],
  /// Index labels for letters collating after `z`; the n-th label
  /// owns the primary weight `'{' + n`.
  pub(crate) extra_labels:       &'static [&'static str],
}

const ROOT: Tailoring = Tailoring {
  backward_secondary: false,
  primary_overrides:  &[],
  extra_labels:       &[],
};

const FRENCH: Tailoring = Tailoring {
  backward_secondary: true,
  primary_overrides:  &[],
  extra_labels:       &[],
};

// Phonebook order (DIN 5007-2): umlauts expand to vowel + e.
const GERMAN: Tailoring = Tailoring {
  backward_secondary: false,
  primary_overrides:  &[
    ('ä', "ae", DIAERESIS),
    ('ö', "oe", DIAERESIS),
    ('ü', "ue", DIAERESIS),
    ('ß', "ss", OTHER),
  ],
  extra_labels:       &[],
};

const SWEDISH: Tailoring = Tailoring {
  backward_secondary: false,
  primary_overrides:  &[('å', "{", 0), ('ä', "|", 0), ('ö', "}", 0)],
  extra_labels:       &["Å", "Ä", "Ö"],
};

const DANISH: Tailoring = Tailoring {
  backward_secondary: false,
  primary_overrides:  &[('æ', "{", 0), ('ø', "|", 0), ('å', "}", 0)],
  extra_labels:       &["Æ", "Ø", "Å"],
};

fn tailoring_for(language: &str) -> &'static Tailoring {
  match language {
    "fr" => &FRENCH,
    "de" => &GERMAN,
    "sv" => &SWEDISH,
    "da" | "nb" | "no" => &DANISH,
    _ => &ROOT,
  }
}

// ─── Collator ────────────────────────────────────────────────────────────────

/// A configured collator for one locale. Cheap to clone; stores swap
/// the active collator wholesale on locale change.
#[derive(Clone)]
pub struct Collator {
  locale:    Locale,
  tailoring: &'static Tailoring,
}

impl std::fmt::Debug for Collator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Collator").field("locale", &self.locale).finish()
  }
}

impl Collator {
  pub fn new(locale: Locale) -> Self {
    let tailoring = tailoring_for(&locale.language);
    Self { locale, tailoring }
  }

  pub fn locale(&self) -> &Locale {
    &self.locale
  }

  pub(crate) fn tailoring(&self) -> &'static Tailoring {
    self.tailoring
  }

  /// Build the persistent sort key for `s`.
  pub fn sort_key(&self, s: &str) -> String {
    let mut primary = String::with_capacity(s.len());
    let mut secondary = Vec::with_capacity(s.len());
    let mut tertiary = Vec::with_capacity(s.len());

    for source in s.chars() {
      let case_weight = u8::from(source.is_uppercase());

      for c in source.to_lowercase() {
        if let Some((expansion, weight)) = self.primary_override(c) {
          primary.push_str(expansion);
          secondary.push(weight);
          tertiary.push(case_weight);
        } else if let Some((base, accent)) = decompose(c) {
          primary.push(base);
          secondary.push(accent);
          tertiary.push(case_weight);
        } else if c.is_ascii() {
          primary.push(c);
          secondary.push(0);
          tertiary.push(case_weight);
        } else if let Some(folded) = deunicode_char(c) {
          let folded = folded.trim_end();
          if folded.is_empty() {
            continue;
          }
          primary.push_str(&folded.to_ascii_lowercase());
          secondary.push(OTHER);
          tertiary.push(case_weight);
        }
      }
    }

    if self.tailoring.backward_secondary {
      secondary.reverse();
    }

    let mut key =
      String::with_capacity(primary.len() + secondary.len() + tertiary.len() + 2);
    key.push_str(&primary);
    key.push('\x01');
    key.extend(secondary.iter().map(|w| char::from(b'0' + w)));
    key.push('\x01');
    key.extend(tertiary.iter().map(|w| char::from(b'0' + w)));
    key
  }

  pub fn compare(&self, a: &str, b: &str) -> Ordering {
    self.sort_key(a).cmp(&self.sort_key(b))
  }

  fn primary_override(&self, c: char) -> Option<(&'static str, u8)> {
    self
      .tailoring
      .primary_overrides
      .iter()
      .find(|(from, _, _)| *from == c)
      .map(|(_, to, weight)| (*to, *weight))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

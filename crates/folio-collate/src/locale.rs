//! Locale identifiers.
//!
//! Accepts the POSIX spelling used by the systems this cache serves:
//! `language[_TERRITORY][.codeset][@modifier]`, e.g. `fr_CA.UTF-8`.
//! The codeset and modifier are accepted and discarded; collation is
//! tailored by language.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
  pub language:  String,
  pub territory: Option<String>,
}

impl Locale {
  pub fn new(language: &str, territory: Option<&str>) -> Result<Self> {
    let spelled = match territory {
      Some(t) => format!("{language}_{t}"),
      None => language.to_owned(),
    };
    spelled.parse()
  }
}

impl FromStr for Locale {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let bad = || Error::UnsupportedLocale(s.to_owned());

    // Strip ".codeset" and "@modifier" suffixes.
    let bare = s.split(['.', '@']).next().unwrap_or("");

    let (language, territory) = match bare.split_once('_') {
      Some((lang, terr)) => (lang, Some(terr)),
      None => (bare, None),
    };

    if language.is_empty()
      || language.len() > 8
      || !language.chars().all(|c| c.is_ascii_lowercase())
    {
      return Err(bad());
    }

    if let Some(terr) = territory {
      if terr.is_empty()
        || terr.len() > 3
        || !terr.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
      {
        return Err(bad());
      }
    }

    Ok(Self {
      language:  language.to_owned(),
      territory: territory.map(str::to_owned),
    })
  }
}

impl fmt::Display for Locale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.territory {
      Some(terr) => write!(f, "{}_{terr}", self.language),
      None => write!(f, "{}", self.language),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

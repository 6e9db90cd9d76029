//! Localized strings used in rendered output (tooltips and the like).
//!
//! Loaded once at startup and passed by reference into whatever renders
//! localized text. Lookups fall back from the requested locale to the
//! default locale, then to the built-in English strings, then to the key.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Tooltip on links that only exist in the default locale.
pub const ONLY_IN_DEFAULT_LOCALE: &str = "only_in_default_locale";
/// Tooltip on cross-references to pages that do not exist.
pub const PAGE_NOT_CREATED: &str = "page_not_created";

const BUILTIN: &[(&str, &str)] = &[
  (ONLY_IN_DEFAULT_LOCALE, "Currently only available in English (US)"),
  (
    PAGE_NOT_CREATED,
    "The documentation about this has not yet been written; please consider \
     contributing!",
  ),
];

/// String tables keyed by locale and message key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localization {
  tables: HashMap<String, HashMap<String, String>>,
}

impl Localization {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from already-loaded tables.
  #[must_use]
  pub const fn from_tables(
    tables: HashMap<String, HashMap<String, String>>,
  ) -> Self {
    Self { tables }
  }

  /// Add or replace a single string.
  pub fn insert(&mut self, locale: &str, key: &str, value: &str) {
    self
      .tables
      .entry(locale.to_string())
      .or_default()
      .insert(key.to_string(), value.to_string());
  }

  /// Merge another set of tables on top of this one.
  pub fn extend(&mut self, other: Self) {
    for (locale, table) in other.tables {
      self.tables.entry(locale).or_default().extend(table);
    }
  }

  fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
    self
      .tables
      .iter()
      .find(|(name, _)| name.eq_ignore_ascii_case(locale))
      .and_then(|(_, table)| table.get(key))
      .map(String::as_str)
  }

  /// Look up `key` for `locale`, falling back to `default_locale`, the
  /// built-in strings, and finally the key itself.
  #[must_use]
  pub fn get<'a>(
    &'a self,
    locale: &str,
    default_locale: &str,
    key: &'a str,
  ) -> &'a str {
    self
      .lookup(locale, key)
      .or_else(|| self.lookup(default_locale, key))
      .or_else(|| {
        BUILTIN
          .iter()
          .find(|(name, _)| *name == key)
          .map(|(_, value)| *value)
      })
      .unwrap_or(key)
  }

  /// Locales with at least one string.
  #[must_use]
  pub fn locales(&self) -> Vec<&str> {
    let mut locales = self.tables.keys().map(String::as_str).collect::<Vec<_>>();
    locales.sort_unstable();
    locales
  }
}

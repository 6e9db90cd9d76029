//! Heading ids and fragment checks.
use std::collections::HashSet;

use log::debug;

use crate::{
  normalize::NormalizedSource,
  utils::{attribute, heading_slug, set_attribute},
};

/// Id given to headings whose text slugs to nothing.
const EMPTY_HEADING_ID: &str = "section";

/// Every element id of one document after heading ids were assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorSet {
  ids: Vec<String>,
}

impl AnchorSet {
  #[must_use]
  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  /// Find an id, preferring an exact match over a case-insensitive one.
  #[must_use]
  pub fn find(&self, fragment: &str) -> Option<&str> {
    find_id(&self.ids, fragment)
  }
}

fn find_id<'a>(ids: &'a [String], fragment: &str) -> Option<&'a str> {
  ids
    .iter()
    .find(|id| *id == fragment)
    .or_else(|| {
      let lowered = fragment.to_lowercase();
      ids.iter().find(|id| id.to_lowercase() == lowered)
    })
    .map(String::as_str)
}

/// Assign an id to every heading that lacks one and make heading ids unique,
/// ignoring case. Later duplicates get `_2`, `_3`, ... suffixes.
pub fn normalize_heading_ids(source: &NormalizedSource) -> AnchorSet {
  let mut seen = HashSet::new();

  for (node, _) in source.headings() {
    let element = &node.element;
    let base = attribute(element, "id")
      .map(|id| id.trim().to_string())
      .filter(|id| !id.is_empty())
      .unwrap_or_else(|| {
        let slug = heading_slug(&element.text_contents());
        if slug.is_empty() {
          EMPTY_HEADING_ID.to_string()
        } else {
          slug
        }
      });

    let mut id = base.clone();
    let mut counter = 2;
    while !seen.insert(id.to_lowercase()) {
      id = format!("{base}_{counter}");
      counter += 1;
    }
    if id != base {
      debug!("Renamed duplicate heading id {base} to {id}");
    }
    set_attribute(element, "id", id);
  }

  let ids = source
    .body
    .descendants()
    .filter_map(|node| attribute(&node, "id"))
    .filter(|id| !id.is_empty())
    .collect();
  AnchorSet { ids }
}

/// Outcome of checking a fragment against a set of known ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentCheck {
  /// The fragment names an id exactly, or nothing is known and it is
  /// already lowercase.
  Valid,
  /// The id exists under another casing.
  WrongCase { canonical: String },
  /// No such id. `closest` is an id that differs only in punctuation.
  Missing { closest: Option<String> },
}

/// Comparison key that ignores case and punctuation.
fn loose_key(value: &str) -> String {
  value
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(char::to_lowercase)
    .collect()
}

/// Check `fragment` against `ids`, or only its casing when `ids` is unknown.
#[must_use]
pub fn check_fragment(fragment: &str, ids: Option<&[String]>) -> FragmentCheck {
  let lowered = fragment.to_lowercase();
  let Some(ids) = ids else {
    return if fragment == lowered {
      FragmentCheck::Valid
    } else {
      FragmentCheck::WrongCase { canonical: lowered }
    };
  };

  match find_id(ids, fragment) {
    Some(id) if id == fragment => FragmentCheck::Valid,
    Some(id) => {
      FragmentCheck::WrongCase {
        canonical: id.to_string(),
      }
    },
    None => {
      let key = loose_key(fragment);
      let mut candidates = ids.iter().filter(|id| loose_key(id) == key);
      let closest = match (candidates.next(), candidates.next()) {
        (Some(only), None) if !key.is_empty() => Some(only.clone()),
        _ => None,
      };
      FragmentCheck::Missing { closest }
    },
  }
}

//! The site-wide URL index.
//!
//! Built once, before any document is resolved, from the full list of known
//! documents, static files and redirects. After construction it is read-only
//! and can be shared between threads freely.
//!
//! Lookups are case-insensitive, keyed by `(locale, slug)` with trailing
//! slashes removed, but every entry remembers its canonical casing so that
//! resolvers can suggest it.
use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
  error::IndexError,
  utils::{has_scheme, split_href, trim_trailing_slash},
};

/// Default bound on redirect chain length.
pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 16;

/// What an indexed URL points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  #[default]
  Document,
  /// Images and other attachments living next to a document.
  File,
}

/// One known URL, as listed by the corpus collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
  pub url:     String,
  #[serde(default)]
  pub title:   String,
  #[serde(default)]
  pub kind:    EntryKind,
  /// Heading ids of the document, when known.
  #[serde(default)]
  pub anchors: Option<Vec<String>>,
}

impl CorpusEntry {
  #[must_use]
  pub fn document(url: &str, title: &str) -> Self {
    Self {
      url:     url.to_string(),
      title:   title.to_string(),
      kind:    EntryKind::Document,
      anchors: None,
    }
  }

  #[must_use]
  pub fn file(url: &str) -> Self {
    Self {
      url:     url.to_string(),
      title:   String::new(),
      kind:    EntryKind::File,
      anchors: None,
    }
  }

  #[must_use]
  pub fn with_anchors<I, S>(mut self, anchors: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.anchors = Some(anchors.into_iter().map(Into::into).collect());
    self
  }
}

/// A moved-page pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
  pub from: String,
  pub to:   String,
}

impl Redirect {
  #[must_use]
  pub fn new(from: &str, to: &str) -> Self {
    Self {
      from: from.to_string(),
      to:   to.to_string(),
    }
  }
}

/// Parse a `_redirects.txt` style file: one `from<TAB>to` pair per line,
/// `#` comments and blank lines ignored.
///
/// # Errors
///
/// Returns [`IndexError::MalformedRedirect`] for a line that is not exactly
/// two whitespace-separated fields.
pub fn parse_redirects(content: &str) -> Result<Vec<Redirect>, IndexError> {
  let mut redirects = Vec::new();
  for (number, line) in content.lines().enumerate() {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }
    let fields = trimmed.split_whitespace().collect::<Vec<_>>();
    match fields.as_slice() {
      [from, to] => redirects.push(Redirect::new(from, to)),
      _ => {
        return Err(IndexError::MalformedRedirect {
          line:    number + 1,
          content: line.to_string(),
        });
      },
    }
  }
  Ok(redirects)
}

/// Split `/<locale>/docs/<slug>` into locale and slug. The `docs` segment is
/// matched case-insensitively; the slug may be empty.
#[must_use]
pub fn split_docs_url(url: &str) -> Option<(&str, &str)> {
  let rest = url.strip_prefix('/')?;
  let (locale, rest) = rest.split_once('/')?;
  if locale.is_empty()
    || !locale.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
  {
    return None;
  }
  let (docs, slug) = rest.split_once('/').unwrap_or((rest, ""));
  docs.eq_ignore_ascii_case("docs").then_some((locale, slug))
}

fn lookup_key(locale: &str, slug: &str) -> String {
  let slug = trim_trailing_slash(slug).trim_start_matches('/');
  format!("{}/{}", locale.to_lowercase(), slug.to_lowercase())
}

/// A known document or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
  pub locale:  String,
  /// Canonical URL in its authoritative casing.
  pub path:    String,
  pub kind:    EntryKind,
  pub title:   String,
  pub anchors: Option<Vec<String>>,
}

impl IndexEntry {
  /// Find `fragment` among the entry's anchors, ignoring case. Returns
  /// `None` when the anchors are unknown.
  #[must_use]
  pub fn find_anchor(&self, fragment: &str) -> Option<Option<&str>> {
    let anchors = self.anchors.as_ref()?;
    let lowered = fragment.to_lowercase();
    Some(
      anchors
        .iter()
        .find(|anchor| anchor.to_lowercase() == lowered)
        .map(String::as_str),
    )
  }
}

#[derive(Debug, Clone)]
struct RedirectEntry {
  from:   String,
  to:     String,
  /// Where the chain finally lands; `None` for cycles, dangling chains and
  /// chains longer than the hop bound.
  target: Option<String>,
}

/// Result of looking a URL up in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
  /// The URL as it was asked for.
  pub requested:     String,
  /// The live entry, when the URL names one directly.
  pub entry:         Option<&'a IndexEntry>,
  /// Final target when the URL is a redirect that resolves.
  pub redirected_to: Option<String>,
  /// Whether the matched key had exactly the requested casing.
  pub exact_case:    bool,
}

impl Resolution<'_> {
  #[must_use]
  pub const fn found(&self) -> bool {
    self.entry.is_some() || self.redirected_to.is_some()
  }

  /// The URL a correct link should use: the redirect target, the entry's
  /// canonical path, or the requested URL when nothing matched.
  #[must_use]
  pub fn canonical_path(&self) -> &str {
    if let Some(target) = &self.redirected_to {
      return target;
    }
    self
      .entry
      .map_or(self.requested.as_str(), |entry| entry.path.as_str())
  }

  /// Whether the link can stay as written.
  #[must_use]
  pub const fn is_exact(&self) -> bool {
    self.entry.is_some() && self.redirected_to.is_none() && self.exact_case
  }
}

/// Read-only mapping from `(locale, path)` to known documents.
#[derive(Debug, Clone)]
pub struct UrlIndex {
  entries:   HashMap<String, IndexEntry>,
  redirects: HashMap<String, RedirectEntry>,
  /// Lowercased slug to the keys of every locale's version of it.
  by_slug:   HashMap<String, Vec<String>>,
}

impl UrlIndex {
  /// Build the index from the corpus listing and the redirect list.
  ///
  /// # Errors
  ///
  /// Returns an error if the corpus is empty, an entry or redirect source is
  /// not a `/<locale>/docs/` URL, or two entries differ only by case.
  pub fn build(
    corpus: Vec<CorpusEntry>,
    redirects: Vec<Redirect>,
    max_redirect_hops: usize,
  ) -> Result<Self, IndexError> {
    if corpus.is_empty() {
      return Err(IndexError::EmptyCorpus);
    }

    let mut entries = HashMap::with_capacity(corpus.len());
    let mut by_slug: HashMap<String, Vec<String>> = HashMap::new();

    for item in corpus {
      let url = trim_trailing_slash(&item.url).to_string();
      let (locale, slug) = split_docs_url(&url)
        .ok_or_else(|| IndexError::InvalidUrl(item.url.clone()))?;
      let key = lookup_key(locale, slug);
      if entries.contains_key(&key) {
        return Err(IndexError::DuplicateEntry(item.url));
      }
      if item.kind == EntryKind::Document {
        by_slug
          .entry(slug.to_lowercase())
          .or_default()
          .push(key.clone());
      }
      entries.insert(key, IndexEntry {
        locale: locale.to_string(),
        path: url.clone(),
        kind: item.kind,
        title: item.title,
        anchors: item.anchors,
      });
    }

    let mut redirect_map = HashMap::with_capacity(redirects.len());
    for redirect in redirects {
      let from = trim_trailing_slash(&redirect.from);
      let (locale, slug) = split_docs_url(from)
        .ok_or_else(|| IndexError::InvalidUrl(redirect.from.clone()))?;
      let key = lookup_key(locale, slug);
      if entries.contains_key(&key) {
        warn!(
          "Ignoring redirect from {} because a document lives there",
          redirect.from
        );
        continue;
      }
      redirect_map.insert(key, RedirectEntry {
        from:   from.to_string(),
        to:     redirect.to,
        target: None,
      });
    }

    let mut index = Self {
      entries,
      redirects: redirect_map,
      by_slug,
    };

    let resolved = index
      .redirects
      .keys()
      .map(|key| (key.clone(), index.follow_chain(key, max_redirect_hops)))
      .collect::<Vec<_>>();
    for (key, target) in resolved {
      if target.is_none() {
        debug!("Redirect chain starting at {key} does not resolve");
      }
      if let Some(redirect) = index.redirects.get_mut(&key) {
        redirect.target = target;
      }
    }

    for keys in index.by_slug.values_mut() {
      keys.sort();
    }

    Ok(index)
  }

  /// Follow redirect pointers from `start` until a live entry, an external
  /// URL or a dead end. Cycles and chains longer than `max_hops` yield
  /// `None`.
  fn follow_chain(&self, start: &str, max_hops: usize) -> Option<String> {
    let mut visited = HashSet::from([start.to_string()]);
    let mut current = self.redirects.get(start)?.to.clone();

    for _ in 0..max_hops {
      if has_scheme(&current) || current.starts_with("//") {
        return Some(current);
      }

      let (path, query, fragment) = split_href(&current);
      let suffix = fragment.map_or_else(
        || query.to_string(),
        |fragment| format!("{query}#{fragment}"),
      );
      let Some((locale, slug)) = split_docs_url(trim_trailing_slash(path))
      else {
        // Not a docs URL; the site serves it some other way.
        return Some(current);
      };
      let key = lookup_key(locale, slug);

      if let Some(entry) = self.entries.get(&key) {
        return Some(format!("{}{suffix}", entry.path));
      }

      let next = self.redirects.get(&key)?;
      if !visited.insert(key) {
        return None;
      }
      current = if fragment.is_some() && !next.to.contains('#') {
        format!("{}{suffix}", next.to)
      } else {
        next.to.clone()
      };
    }

    None
  }

  /// Look up `slug` in `locale`.
  #[must_use]
  pub fn resolve(&self, locale: &str, slug: &str) -> Resolution<'_> {
    let slug = trim_trailing_slash(slug).trim_start_matches('/');
    let requested = format!("/{locale}/docs/{slug}");
    let key = lookup_key(locale, slug);

    if let Some(entry) = self.entries.get(&key) {
      return Resolution {
        exact_case: entry.path == requested,
        requested,
        entry: Some(entry),
        redirected_to: None,
      };
    }

    if let Some(redirect) = self.redirects.get(&key) {
      return Resolution {
        exact_case: redirect.from == requested,
        requested,
        entry: None,
        redirected_to: redirect.target.clone(),
      };
    }

    Resolution {
      requested,
      entry: None,
      redirected_to: None,
      exact_case: false,
    }
  }

  /// Look up a full `/<locale>/docs/<slug>` URL. Returns `None` for URLs
  /// outside the docs tree.
  #[must_use]
  pub fn resolve_url(&self, url: &str) -> Option<Resolution<'_>> {
    let (locale, slug) = split_docs_url(url)?;
    Some(self.resolve(locale, slug))
  }

  /// Direct access to a live entry.
  #[must_use]
  pub fn get(&self, url: &str) -> Option<&IndexEntry> {
    let (locale, slug) = split_docs_url(trim_trailing_slash(url))?;
    self.entries.get(&lookup_key(locale, slug))
  }

  /// The other locales' versions of a document, ordered by locale.
  #[must_use]
  pub fn translations(&self, locale: &str, slug: &str) -> Vec<&IndexEntry> {
    let own = lookup_key(locale, slug);
    let slug_key = trim_trailing_slash(slug).to_lowercase();
    self.by_slug.get(&slug_key).map_or_else(Vec::new, |keys| {
      keys
        .iter()
        .filter(|key| **key != own)
        .filter_map(|key| self.entries.get(key))
        .collect()
    })
  }

  /// Number of live entries (documents and files).
  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Number of redirects, resolvable or not.
  #[must_use]
  pub fn redirect_count(&self) -> usize {
    self.redirects.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_index() -> UrlIndex {
    UrlIndex::build(
      vec![
        CorpusEntry::document("/en-US/docs/Web/API/Blob", "Blob"),
        CorpusEntry::document("/en-US/docs/Web/CSS/number", "<number>"),
        CorpusEntry::document("/fr/docs/Web/API/Blob", "Blob"),
        CorpusEntry::file("/en-US/docs/Web/API/Blob/diagram.svg"),
      ],
      vec![
        Redirect::new("/en-US/docs/Web/API/OldBlob", "/en-US/docs/Web/API/Blob"),
        Redirect::new("/en-US/docs/Hop/One", "/en-US/docs/Hop/Two"),
        Redirect::new("/en-US/docs/Hop/Two", "/en-US/docs/Web/CSS/number"),
        Redirect::new("/en-US/docs/Loop/A", "/en-US/docs/Loop/B"),
        Redirect::new("/en-US/docs/Loop/B", "/en-US/docs/Loop/A"),
        Redirect::new("/en-US/docs/Away", "https://example.com/away"),
      ],
      DEFAULT_MAX_REDIRECT_HOPS,
    )
    .expect("index should build")
  }

  #[test]
  fn test_exact_lookup() {
    let index = sample_index();
    let resolution = index.resolve("en-US", "Web/API/Blob");
    assert!(resolution.found());
    assert!(resolution.is_exact());
    assert_eq!(resolution.canonical_path(), "/en-US/docs/Web/API/Blob");
  }

  #[test]
  fn test_case_insensitive_lookup_keeps_canonical_case() {
    let index = sample_index();
    let resolution = index
      .resolve_url("/en-us/DOCS/Web/api/BLOB")
      .expect("docs URL");
    assert!(resolution.found());
    assert!(!resolution.exact_case);
    assert_eq!(resolution.canonical_path(), "/en-US/docs/Web/API/Blob");
  }

  #[test]
  fn test_trailing_slash_is_ignored() {
    let index = sample_index();
    assert!(index.resolve("en-US", "Web/API/Blob/").is_exact());
  }

  #[test]
  fn test_redirect_chain_is_followed() {
    let index = sample_index();
    let resolution = index.resolve("en-US", "Hop/One");
    assert!(resolution.found());
    assert_eq!(
      resolution.redirected_to.as_deref(),
      Some("/en-US/docs/Web/CSS/number")
    );
  }

  #[test]
  fn test_redirect_cycle_is_unresolvable() {
    let index = sample_index();
    let resolution = index.resolve("en-US", "Loop/A");
    assert!(!resolution.found());
    assert_eq!(resolution.redirected_to, None);
  }

  #[test]
  fn test_redirect_bound_is_enforced() {
    let index = UrlIndex::build(
      vec![CorpusEntry::document("/en-US/docs/End", "End")],
      vec![
        Redirect::new("/en-US/docs/A", "/en-US/docs/B"),
        Redirect::new("/en-US/docs/B", "/en-US/docs/C"),
        Redirect::new("/en-US/docs/C", "/en-US/docs/End"),
      ],
      2,
    )
    .expect("index should build");
    assert!(!index.resolve("en-US", "A").found());
    assert!(index.resolve("en-US", "B").found());
  }

  #[test]
  fn test_external_redirect_target() {
    let index = sample_index();
    assert_eq!(
      index.resolve("en-US", "Away").redirected_to.as_deref(),
      Some("https://example.com/away")
    );
  }

  #[test]
  fn test_files_are_indexed() {
    let index = sample_index();
    let entry = index
      .get("/en-US/docs/Web/API/Blob/diagram.svg")
      .expect("file entry");
    assert_eq!(entry.kind, EntryKind::File);
  }

  #[test]
  fn test_translations() {
    let index = sample_index();
    let translations = index.translations("en-US", "Web/API/Blob");
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0].locale, "fr");
  }

  #[test]
  fn test_build_errors() {
    assert_eq!(
      UrlIndex::build(Vec::new(), Vec::new(), 4).err(),
      Some(IndexError::EmptyCorpus)
    );
    assert_eq!(
      UrlIndex::build(
        vec![CorpusEntry::document("/nowhere", "x")],
        Vec::new(),
        4
      )
      .err(),
      Some(IndexError::InvalidUrl("/nowhere".to_string()))
    );
    assert!(matches!(
      UrlIndex::build(
        vec![
          CorpusEntry::document("/en-US/docs/A", "a"),
          CorpusEntry::document("/en-US/docs/a", "a"),
        ],
        Vec::new(),
        4
      ),
      Err(IndexError::DuplicateEntry(_))
    ));
  }

  #[test]
  fn test_redirect_onto_document_is_ignored() {
    let index = UrlIndex::build(
      vec![CorpusEntry::document("/en-US/docs/Live", "Live")],
      vec![Redirect::new("/en-US/docs/Live", "/en-US/docs/Elsewhere")],
      4,
    )
    .expect("index should build");
    assert_eq!(index.redirect_count(), 0);
    assert!(index.resolve("en-US", "Live").is_exact());
  }

  #[test]
  fn test_parse_redirects() {
    let content = "# comment\n\n/en-US/docs/A\t/en-US/docs/B\n";
    let redirects = parse_redirects(content).expect("valid file");
    assert_eq!(redirects, vec![Redirect::new("/en-US/docs/A", "/en-US/docs/B")]);

    assert_eq!(
      parse_redirects("/en-US/docs/A\n"),
      Err(IndexError::MalformedRedirect {
        line:    1,
        content: "/en-US/docs/A".to_string(),
      })
    );
  }

  #[test]
  fn test_split_docs_url() {
    assert_eq!(
      split_docs_url("/en-US/docs/Web/API"),
      Some(("en-US", "Web/API"))
    );
    assert_eq!(split_docs_url("/en-US/docs"), Some(("en-US", "")));
    assert_eq!(split_docs_url("/en-US/blog/post"), None);
    assert_eq!(split_docs_url("relative/path"), None);
  }

  #[test]
  fn test_find_anchor() {
    let entry = CorpusEntry::document("/en-US/docs/A", "A")
      .with_anchors(["syntax", "Examples"]);
    let index =
      UrlIndex::build(vec![entry], Vec::new(), 4).expect("index should build");
    let entry = index.get("/en-US/docs/A").expect("entry");
    assert_eq!(entry.find_anchor("SYNTAX"), Some(Some("syntax")));
    assert_eq!(entry.find_anchor("examples"), Some(Some("Examples")));
    assert_eq!(entry.find_anchor("missing"), Some(None));
  }
}

//! State shared by the link, cross-reference and image resolvers while one
//! document is being built.
use url::Url;

use crate::{
  anchors::AnchorSet,
  index::UrlIndex,
  l10n::Localization,
  options::EngineOptions,
  utils::{decode, split_href},
};

/// Host used to resolve relative references; never shows up in output.
const BASE_HOST: &str = "https://quire.invalid";

pub struct ResolveContext<'a> {
  pub index:   &'a UrlIndex,
  pub options: &'a EngineOptions,
  pub l10n:    &'a Localization,
  /// URL of the document being built, as given.
  pub url:     &'a str,
  pub locale:  &'a str,
  pub anchors: &'a AnchorSet,
}

/// An internal reference made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsolutePath {
  /// Decoded, absolute path without query or fragment.
  pub path:     String,
  /// Query including its leading `?`, or empty.
  pub query:    String,
  pub fragment: Option<String>,
}

impl AbsolutePath {
  /// Rebuild `path?query#fragment` with a replacement path and fragment.
  #[must_use]
  pub fn with(&self, path: &str, fragment: Option<&str>) -> String {
    match fragment {
      Some(fragment) => format!("{path}{}#{fragment}", self.query),
      None => format!("{path}{}", self.query),
    }
  }

  /// The whole reference, with the fragment as written.
  #[must_use]
  pub fn full(&self) -> String {
    self.with(&self.path, self.fragment.as_deref())
  }
}

impl ResolveContext<'_> {
  #[must_use]
  pub fn is_translated(&self) -> bool {
    !self.options.is_default_locale(self.locale)
  }

  /// Resolve a site-internal reference against the current document.
  /// Returns `None` when the reference cannot be parsed.
  #[must_use]
  pub fn absolutize(&self, href: &str) -> Option<AbsolutePath> {
    let (path, query, fragment) = split_href(href);
    let path = if path.is_empty() {
      self.url.to_string()
    } else if path.starts_with('/') {
      decode(path).into_owned()
    } else {
      let base = Url::parse(&format!("{BASE_HOST}{}/", self.url)).ok()?;
      decode(base.join(path).ok()?.path()).into_owned()
    };
    Some(AbsolutePath {
      path,
      query: query.to_string(),
      fragment: fragment.map(|fragment| decode(fragment).into_owned()),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::index::{CorpusEntry, DEFAULT_MAX_REDIRECT_HOPS};

  #[test]
  fn test_absolutize() {
    let index = UrlIndex::build(
      vec![CorpusEntry::document("/en-US/docs/Web/Linked_to", "x")],
      Vec::new(),
      DEFAULT_MAX_REDIRECT_HOPS,
    )
    .expect("index should build");
    let options = EngineOptions::default();
    let l10n = Localization::new();
    let anchors = AnchorSet::default();
    let ctx = ResolveContext {
      index:   &index,
      options: &options,
      l10n:    &l10n,
      url:     "/en-US/docs/Web/Linked_to",
      locale:  "en-US",
      anchors: &anchors,
    };

    let dino = ctx.absolutize("dino.svg").expect("relative path");
    assert_eq!(dino.path, "/en-US/docs/Web/Linked_to/dino.svg");

    let sibling = ctx.absolutize("../Other?x=1#Top").expect("relative path");
    assert_eq!(sibling.path, "/en-US/docs/Web/Other");
    assert_eq!(sibling.full(), "/en-US/docs/Web/Other?x=1#Top");

    let encoded = ctx.absolutize("/en-US/docs/Caf%C3%A9").expect("absolute");
    assert_eq!(encoded.path, "/en-US/docs/Café");
    assert!(!ctx.is_translated());
  }
}

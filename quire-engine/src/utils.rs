//! Small helpers shared by the resolvers.
use std::{borrow::Cow, sync::LazyLock};

use kuchikikiki::NodeRef;
use markup5ever::local_name;
use percent_encoding::percent_decode_str;
use regex::Regex;

/// Create a regex that never matches anything.
///
/// Used as a fallback when a static pattern fails to compile, so callers
/// degrade to "no match" instead of panicking.
///
/// # Panics
///
/// Never in practice; the pattern is a constant empty character class.
#[must_use]
pub fn never_matching_regex() -> Regex {
  #[allow(
    clippy::expect_used,
    reason = "This pattern is guaranteed to be valid"
  )]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}

static HEADING_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r##"["#$%&+,/:;=?@\[\]^`{|}~')(\\<>!*]"##).unwrap_or_else(|e| {
    log::error!("Failed to compile HEADING_PUNCTUATION regex: {e}");
    never_matching_regex()
  })
});

/// Turn heading text into an anchor id.
///
/// Lowercases, drops URL-hostile punctuation and joins words with `_`, so
/// "Browser compatibility" becomes `browser_compatibility`.
#[must_use]
pub fn heading_slug(text: &str) -> String {
  let lowered = text.trim().to_lowercase();
  let stripped = HEADING_PUNCTUATION.replace_all(&lowered, "");
  stripped.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Split `path?query#fragment` into its three parts. The query keeps its
/// leading `?`; the fragment is returned without `#`.
#[must_use]
pub fn split_href(href: &str) -> (&str, &str, Option<&str>) {
  let (rest, fragment) = match href.split_once('#') {
    Some((rest, fragment)) => (rest, Some(fragment)),
    None => (href, None),
  };
  match rest.find('?') {
    Some(pos) => (&rest[..pos], &rest[pos..], fragment),
    None => (rest, "", fragment),
  }
}

/// Percent-decode a path or fragment, keeping the input when it is not valid
/// UTF-8 after decoding.
#[must_use]
pub fn decode(value: &str) -> Cow<'_, str> {
  percent_decode_str(value)
    .decode_utf8()
    .unwrap_or(Cow::Borrowed(value))
}

/// Drop trailing slashes, keeping a lone `/`.
#[must_use]
pub fn trim_trailing_slash(path: &str) -> &str {
  let trimmed = path.trim_end_matches('/');
  if trimmed.is_empty() { "/" } else { trimmed }
}

/// Whether `href` starts with a URL scheme such as `https:` or `mailto:`.
#[must_use]
pub fn has_scheme(href: &str) -> bool {
  let Some((scheme, _)) = href.split_once(':') else {
    return false;
  };
  let mut chars = scheme.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Read an attribute off an element node.
#[must_use]
pub fn attribute(node: &NodeRef, name: &str) -> Option<String> {
  node
    .as_element()
    .and_then(|element| element.attributes.borrow().get(name).map(ToString::to_string))
}

/// Set (or replace) an attribute on an element node.
pub fn set_attribute(node: &NodeRef, name: &str, value: impl Into<String>) {
  if let Some(element) = node.as_element() {
    element.attributes.borrow_mut().insert(name, value.into());
  }
}

/// Remove an attribute from an element node.
pub fn remove_attribute(node: &NodeRef, name: &str) {
  if let Some(element) = node.as_element() {
    element.attributes.borrow_mut().remove(name);
  }
}

/// Append a class to an element, keeping existing classes.
pub fn add_class(node: &NodeRef, class: &str) {
  let Some(element) = node.as_element() else {
    return;
  };
  let mut attributes = element.attributes.borrow_mut();
  let merged = match attributes.get(local_name!("class")) {
    Some(existing) if existing.split_whitespace().any(|c| c == class) => {
      return;
    },
    Some(existing) if !existing.trim().is_empty() => {
      format!("{} {class}", existing.trim())
    },
    _ => class.to_string(),
  };
  attributes.insert(local_name!("class"), merged);
}

/// Whether an element carries the given class.
#[must_use]
pub fn has_class(node: &NodeRef, class: &str) -> bool {
  attribute(node, "class")
    .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Tag name of an element node, if it is one.
#[must_use]
pub fn tag_name(node: &NodeRef) -> Option<String> {
  node
    .as_element()
    .map(|element| element.name.local.as_ref().to_string())
}

/// Heading level for `h1`..`h6` elements.
#[must_use]
pub fn heading_level(node: &NodeRef) -> Option<u8> {
  match tag_name(node)?.as_str() {
    "h1" => Some(1),
    "h2" => Some(2),
    "h3" => Some(3),
    "h4" => Some(4),
    "h5" => Some(5),
    "h6" => Some(6),
    _ => None,
  }
}

/// Serialize a node (and its subtree) back into HTML.
#[must_use]
pub fn serialize_node(node: &NodeRef) -> String {
  let mut out = Vec::new();
  if let Err(e) = node.serialize(&mut out) {
    log::warn!("Failed to serialize HTML node: {e}");
  }
  String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_heading_slug() {
    assert_eq!(heading_slug("Browser compatibility"), "browser_compatibility");
    assert_eq!(heading_slug("  Heading1 "), "heading1");
    assert_eq!(heading_slug("What's new?"), "whats_new");
    assert_eq!(heading_slug("<video> & <audio>"), "video_audio");
  }

  #[test]
  fn test_split_href() {
    assert_eq!(
      split_href("/en-US/docs/Web?a=1#Top"),
      ("/en-US/docs/Web", "?a=1", Some("Top"))
    );
    assert_eq!(split_href("#frag"), ("", "", Some("frag")));
    assert_eq!(split_href("/path"), ("/path", "", None));
  }

  #[test]
  fn test_has_scheme() {
    assert!(has_scheme("https://example.com"));
    assert!(has_scheme("mailto:someone@example.com"));
    assert!(!has_scheme("/en-US/docs/Web"));
    assert!(!has_scheme("dino.svg"));
    assert!(!has_scheme("1http://nope"));
  }

  #[test]
  fn test_trim_trailing_slash() {
    assert_eq!(trim_trailing_slash("/en-US/docs/Web/"), "/en-US/docs/Web");
    assert_eq!(trim_trailing_slash("/"), "/");
  }

  #[test]
  fn test_decode() {
    assert_eq!(decode("/docs/Caf%C3%A9"), "/docs/Café");
    assert_eq!(decode("plain"), "plain");
  }
}

//! Link and cross-reference resolution.
//!
//! Every link is classified once, in document order, into one of a few
//! outcomes: left alone, rewritten silently, rewritten to the default locale,
//! or flagged. Flags carry a suggestion when there is an unambiguous fix.
use log::trace;
use url::Url;

use crate::{
  anchors::{FragmentCheck, check_fragment},
  context::{AbsolutePath, ResolveContext},
  fallback::{default_locale_path, mark_default_locale, mark_page_not_created},
  flaws::FlawAggregator,
  index::{EntryKind, split_docs_url},
  normalize::{NodeKind, SourceNode, XREF_ATTRIBUTE},
  utils::{decode, has_scheme, remove_attribute, set_attribute, trim_trailing_slash},
};

pub const MALFORMED_URL: &str = "Not a valid link URL";
pub const HTTPS_UPGRADE: &str = "Is currently http:// but can become https://";
pub const ABSOLUTE_SITE_URL: &str =
  "Absolute URL to this site should be a relative path";
pub const SAME_PAGE_ANCHOR: &str =
  "No need for the pathname in anchor links if it's the same page";
pub const SELF_LINK: &str = "Link points to the page it's already on";
pub const ANCHOR_NOT_LOWERCASE: &str = "Anchor not lowercase";

/// "Can't resolve {href}".
#[must_use]
pub fn cant_resolve(href: &str) -> String {
  format!("Can't resolve {href}")
}

/// What to do with one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
  /// Leave the link exactly as written.
  Keep,
  /// Render a different href; nothing is wrong.
  Rewrite(String),
  /// The page only exists in the default locale.
  DefaultLocale(String),
  /// Something is wrong. `rewrite` replaces the rendered href, if set.
  Flaw {
    explanation: String,
    suggestion:  Option<String>,
    rewrite:     Option<String>,
  },
}

impl LinkOutcome {
  fn flaw(explanation: impl Into<String>, suggestion: Option<String>) -> Self {
    Self::Flaw {
      explanation: explanation.into(),
      suggestion,
      rewrite: None,
    }
  }

  /// Keep the link, unless it had to be made absolute.
  fn keep_or_rewrite(href: &str, absolute: String) -> Self {
    if href == absolute {
      Self::Keep
    } else {
      Self::Rewrite(absolute)
    }
  }
}

/// What to do with one cross reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossReferenceOutcome {
  Resolved(String),
  DefaultLocale(String),
  Missing,
}

/// `http://rest` becomes `https://rest`; the rest is kept byte for byte.
fn upgrade_to_https(href: &str) -> Option<String> {
  let (scheme, rest) = href.split_once("://")?;
  scheme
    .eq_ignore_ascii_case("http")
    .then(|| format!("https://{rest}"))
}

/// Classify an href found in the document described by `ctx`.
#[must_use]
pub fn classify_link(ctx: &ResolveContext<'_>, href: &str) -> LinkOutcome {
  let href = href.trim();
  if href.is_empty() {
    return LinkOutcome::Keep;
  }
  if let Some(fragment) = href.strip_prefix('#') {
    return classify_same_page_fragment(ctx, href, &decode(fragment));
  }

  if href.starts_with("//") {
    return match Url::parse(&format!("https:{href}")) {
      Ok(url) => classify_external(ctx, href, &url),
      Err(_) => LinkOutcome::flaw(MALFORMED_URL, None),
    };
  }

  if has_scheme(href) {
    let Ok(url) = Url::parse(href) else {
      return LinkOutcome::flaw(MALFORMED_URL, None);
    };
    return match url.scheme() {
      "http" | "https" => classify_external(ctx, href, &url),
      _ => LinkOutcome::Keep,
    };
  }

  match ctx.absolutize(href) {
    Some(absolute) => classify_internal(ctx, href, &absolute),
    None => LinkOutcome::flaw(MALFORMED_URL, None),
  }
}

fn classify_same_page_fragment(
  ctx: &ResolveContext<'_>,
  href: &str,
  fragment: &str,
) -> LinkOutcome {
  if fragment.is_empty() {
    return LinkOutcome::Keep;
  }
  match check_fragment(fragment, Some(ctx.anchors.ids())) {
    FragmentCheck::Valid => LinkOutcome::Keep,
    FragmentCheck::WrongCase { canonical } => {
      let fixed = format!("#{canonical}");
      LinkOutcome::Flaw {
        explanation: wrong_case_explanation(href, fragment),
        suggestion:  Some(fixed.clone()),
        rewrite:     Some(fixed),
      }
    },
    FragmentCheck::Missing { closest } => {
      LinkOutcome::Flaw {
        explanation: cant_resolve(href),
        suggestion:  closest.map(|id| format!("#{id}")),
        rewrite:     Some(format!("#{}", fragment.to_lowercase())),
      }
    },
  }
}

fn wrong_case_explanation(href: &str, fragment: &str) -> String {
  if fragment == fragment.to_lowercase() {
    cant_resolve(href)
  } else {
    ANCHOR_NOT_LOWERCASE.to_string()
  }
}

fn classify_external(
  ctx: &ResolveContext<'_>,
  href: &str,
  url: &Url,
) -> LinkOutcome {
  let Some(host) = url.host_str() else {
    return LinkOutcome::flaw(MALFORMED_URL, None);
  };

  if url.scheme() == "http"
    && ctx.options.https.is_upgradeable(host, &ctx.options.site_domains)
    && !ctx.options.is_site_domain(host)
  {
    return LinkOutcome::flaw(HTTPS_UPGRADE, upgrade_to_https(href));
  }

  if !ctx.options.is_site_domain(host) {
    return LinkOutcome::Keep;
  }

  let path = decode(url.path()).into_owned();
  let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();
  let fragment = url.fragment().map(|f| decode(f).into_owned());
  let relative = AbsolutePath {
    path,
    query,
    fragment,
  };

  let Some(resolution) = ctx.index.resolve_url(trim_trailing_slash(&relative.path))
  else {
    let fixed = relative.full();
    return LinkOutcome::Flaw {
      explanation: ABSOLUTE_SITE_URL.to_string(),
      suggestion:  Some(fixed.clone()),
      rewrite:     Some(fixed),
    };
  };

  if !resolution.found() {
    return LinkOutcome::Flaw {
      explanation: cant_resolve(href),
      suggestion:  None,
      rewrite:     Some(relative.full()),
    };
  }

  let fragment = relative.fragment.as_deref().map(|fragment| {
    resolution
      .entry
      .and_then(|entry| entry.find_anchor(fragment).flatten())
      .map_or_else(|| fragment.to_lowercase(), ToString::to_string)
  });
  let fixed = relative.with(resolution.canonical_path(), fragment.as_deref());
  LinkOutcome::Flaw {
    explanation: ABSOLUTE_SITE_URL.to_string(),
    suggestion:  Some(fixed.clone()),
    rewrite:     Some(fixed),
  }
}

fn classify_internal(
  ctx: &ResolveContext<'_>,
  href: &str,
  absolute: &AbsolutePath,
) -> LinkOutcome {
  let path = trim_trailing_slash(&absolute.path);
  let Some((locale, slug)) = split_docs_url(path) else {
    return LinkOutcome::keep_or_rewrite(href, absolute.full());
  };

  if path.eq_ignore_ascii_case(trim_trailing_slash(ctx.url)) {
    return match absolute.fragment.as_deref().filter(|f| !f.is_empty()) {
      Some(fragment) => {
        LinkOutcome::Flaw {
          explanation: SAME_PAGE_ANCHOR.to_string(),
          suggestion:  Some(format!("#{fragment}")),
          rewrite:     Some(format!("#{}", fragment.to_lowercase())),
        }
      },
      None => LinkOutcome::flaw(SELF_LINK, None),
    };
  }

  let resolution = ctx.index.resolve(locale, slug);

  if !resolution.found() {
    if let Some(fallback) = default_locale_path(ctx, locale, slug) {
      let fragment = absolute.fragment.as_deref().map(str::to_lowercase);
      return LinkOutcome::DefaultLocale(
        absolute.with(&fallback, fragment.as_deref()),
      );
    }
    return LinkOutcome::flaw(cant_resolve(href), None);
  }

  let canonical = resolution.canonical_path();
  let exact = resolution.redirected_to.is_none()
    && resolution.entry.is_some_and(|entry| entry.path == path);

  if !exact {
    let fragment = absolute.fragment.as_deref().map(|fragment| {
      resolution
        .entry
        .and_then(|entry| entry.find_anchor(fragment).flatten())
        .map_or_else(|| fragment.to_lowercase(), ToString::to_string)
    });
    let suggestion = if canonical.contains('#') {
      format!("{canonical}{}", absolute.query)
    } else {
      absolute.with(canonical, fragment.as_deref())
    };
    return LinkOutcome::flaw(cant_resolve(href), Some(suggestion));
  }

  let Some(entry) = resolution.entry else {
    return LinkOutcome::keep_or_rewrite(href, absolute.full());
  };
  let Some(fragment) = absolute.fragment.as_deref().filter(|f| !f.is_empty())
  else {
    return LinkOutcome::keep_or_rewrite(href, absolute.full());
  };
  if entry.kind == EntryKind::File {
    return LinkOutcome::keep_or_rewrite(href, absolute.full());
  }

  match check_fragment(fragment, entry.anchors.as_deref()) {
    FragmentCheck::Valid => LinkOutcome::keep_or_rewrite(href, absolute.full()),
    FragmentCheck::WrongCase { canonical: id } => {
      let fixed = absolute.with(&entry.path, Some(&id));
      LinkOutcome::Flaw {
        explanation: wrong_case_explanation(href, fragment),
        suggestion:  Some(fixed.clone()),
        rewrite:     Some(fixed),
      }
    },
    FragmentCheck::Missing { closest } => {
      if let Some(fallback) = default_locale_anchor(ctx, locale, slug, fragment)
      {
        return LinkOutcome::DefaultLocale(fallback);
      }
      LinkOutcome::Flaw {
        explanation: cant_resolve(href),
        suggestion:  closest.map(|id| absolute.with(&entry.path, Some(&id))),
        rewrite:     Some(
          absolute.with(&entry.path, Some(&fragment.to_lowercase())),
        ),
      }
    },
  }
}

/// The default-locale page carrying `fragment`, when a translation lacks it.
fn default_locale_anchor(
  ctx: &ResolveContext<'_>,
  locale: &str,
  slug: &str,
  fragment: &str,
) -> Option<String> {
  if !ctx.is_translated() || !locale.eq_ignore_ascii_case(ctx.locale) {
    return None;
  }
  let entry = ctx.index.resolve(&ctx.options.default_locale, slug).entry?;
  let id = entry.find_anchor(fragment)??;
  Some(format!("{}#{id}", entry.path))
}

/// Classify a macro-generated cross reference.
#[must_use]
pub fn classify_cross_reference(
  ctx: &ResolveContext<'_>,
  target: &str,
) -> CrossReferenceOutcome {
  let Some(absolute) = ctx.absolutize(target.trim()) else {
    return CrossReferenceOutcome::Missing;
  };
  let path = trim_trailing_slash(&absolute.path);
  let Some((locale, slug)) = split_docs_url(path) else {
    return CrossReferenceOutcome::Resolved(absolute.full());
  };

  let resolution = ctx.index.resolve(locale, slug);
  if resolution.found() {
    let fragment = absolute.fragment.as_deref().map(str::to_lowercase);
    return CrossReferenceOutcome::Resolved(
      absolute.with(resolution.canonical_path(), fragment.as_deref()),
    );
  }
  match default_locale_path(ctx, locale, slug) {
    Some(fallback) => {
      let fragment = absolute.fragment.as_deref().map(str::to_lowercase);
      CrossReferenceOutcome::DefaultLocale(
        absolute.with(&fallback, fragment.as_deref()),
      )
    },
    None => CrossReferenceOutcome::Missing,
  }
}

/// Resolve every link and cross reference in `nodes`, rewriting the tree in
/// place and recording flaws in document order.
pub fn resolve_links(
  ctx: &ResolveContext<'_>,
  nodes: &[SourceNode],
  flaws: &mut FlawAggregator,
) {
  for node in nodes {
    match &node.kind {
      NodeKind::Link { href } => {
        let outcome = classify_link(ctx, href);
        trace!("{href}: {outcome:?}");
        match outcome {
          LinkOutcome::Keep => {},
          LinkOutcome::Rewrite(new_href) => {
            set_attribute(&node.element, "href", new_href);
          },
          LinkOutcome::DefaultLocale(new_href) => {
            mark_default_locale(ctx, &node.element, &new_href);
          },
          LinkOutcome::Flaw {
            explanation,
            suggestion,
            rewrite,
          } => {
            if let Some(new_href) = rewrite {
              set_attribute(&node.element, "href", new_href);
            }
            flaws.broken_link(
              &node.element,
              href,
              node.position,
              explanation,
              suggestion,
            );
          },
        }
      },
      NodeKind::CrossReference { target } => {
        remove_attribute(&node.element, XREF_ATTRIBUTE);
        match classify_cross_reference(ctx, target) {
          CrossReferenceOutcome::Resolved(href) => {
            set_attribute(&node.element, "href", href);
          },
          CrossReferenceOutcome::DefaultLocale(href) => {
            mark_default_locale(ctx, &node.element, &href);
          },
          CrossReferenceOutcome::Missing => {
            mark_page_not_created(ctx, &node.element);
            flaws.broken_link(
              &node.element,
              target,
              node.position,
              cant_resolve(target),
              None,
            );
          },
        }
      },
      NodeKind::Image { .. } | NodeKind::Heading { .. } => {},
    }
  }
}

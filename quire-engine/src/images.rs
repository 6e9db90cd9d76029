//! Image resolution.
//!
//! Images must live next to the documents that use them. External images are
//! flagged, internal ones are checked against the index and made absolute.
//! Missing dimensions can be filled in by an [`ImageProber`].
use log::trace;
use url::Url;

use crate::{
  context::ResolveContext,
  flaws::FlawAggregator,
  index::split_docs_url,
  links::cant_resolve,
  normalize::{NodeKind, SourceNode},
  utils::{attribute, has_scheme, set_attribute, trim_trailing_slash},
};

pub const EXTERNAL_IMAGE: &str = "External image URL";
pub const MISSING_IMAGE: &str = "File not present on disk";
pub const MALFORMED_IMAGE_URL: &str = "Not a valid image URL";

/// Looks up intrinsic image dimensions. Implementations must be cheap to
/// share between the threads building documents.
pub trait ImageProber: Send + Sync {
  /// Width and height of the image at `url`, when known.
  fn dimensions(&self, url: &str) -> Option<(u32, u32)>;
}

/// A prober that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageProbe;

impl ImageProber for NoImageProbe {
  fn dimensions(&self, _url: &str) -> Option<(u32, u32)> {
    None
  }
}

/// What to do with one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
  Keep,
  /// Rendered `src` changes; nothing is wrong. Also used for images that
  /// fall back to the default locale.
  Rewrite(String),
  Flaw {
    explanation: String,
    suggestion:  Option<String>,
  },
}

impl ImageOutcome {
  fn flaw(explanation: impl Into<String>, suggestion: Option<String>) -> Self {
    Self::Flaw {
      explanation: explanation.into(),
      suggestion,
    }
  }
}

fn classify_external(ctx: &ResolveContext<'_>, src: &str, url: &Url) -> ImageOutcome {
  let upgrade = (url.scheme() == "http")
    .then(|| url.host_str())
    .flatten()
    .filter(|host| {
      ctx.options.https.is_upgradeable(host, &ctx.options.site_domains)
    })
    .and_then(|_| {
      src
        .split_once("://")
        .map(|(_, rest)| format!("https://{rest}"))
    });
  ImageOutcome::flaw(EXTERNAL_IMAGE, upgrade)
}

/// Classify an image `src` found in the document described by `ctx`.
#[must_use]
pub fn classify_image(ctx: &ResolveContext<'_>, src: &str) -> ImageOutcome {
  let src = src.trim();
  if src.is_empty() || src.starts_with("data:") {
    return ImageOutcome::Keep;
  }

  if src.starts_with("//") || has_scheme(src) {
    let candidate = if src.starts_with("//") {
      format!("https:{src}")
    } else {
      src.to_string()
    };
    return match Url::parse(&candidate) {
      Ok(url) if matches!(url.scheme(), "http" | "https") => {
        classify_external(ctx, src, &url)
      },
      Ok(_) => ImageOutcome::Keep,
      Err(_) => ImageOutcome::flaw(MALFORMED_IMAGE_URL, None),
    };
  }

  let Some(absolute) = ctx.absolutize(src) else {
    return ImageOutcome::flaw(MALFORMED_IMAGE_URL, None);
  };
  let path = trim_trailing_slash(&absolute.path);
  let Some((locale, slug)) = split_docs_url(path) else {
    return ImageOutcome::flaw(MISSING_IMAGE, None);
  };

  let resolution = ctx.index.resolve(locale, slug);
  if let Some(entry) = resolution.entry {
    if entry.path == path {
      return if src == absolute.full() {
        ImageOutcome::Keep
      } else {
        ImageOutcome::Rewrite(absolute.full())
      };
    }
    return ImageOutcome::flaw(cant_resolve(src), Some(entry.path.clone()));
  }

  if ctx.is_translated() && locale.eq_ignore_ascii_case(ctx.locale) {
    if let Some(entry) = ctx.index.resolve(&ctx.options.default_locale, slug).entry
    {
      return ImageOutcome::Rewrite(entry.path.clone());
    }
  }

  ImageOutcome::flaw(MISSING_IMAGE, None)
}

/// Resolve every image in `nodes`, rewriting `src`, filling in missing
/// dimensions and recording flaws in document order.
pub fn resolve_images(
  ctx: &ResolveContext<'_>,
  nodes: &[SourceNode],
  prober: &dyn ImageProber,
  flaws: &mut FlawAggregator,
) {
  for node in nodes {
    let NodeKind::Image { src } = &node.kind else {
      continue;
    };
    let outcome = classify_image(ctx, src);
    trace!("{src}: {outcome:?}");

    let rendered = match outcome {
      ImageOutcome::Keep => Some(src.clone()),
      ImageOutcome::Rewrite(new_src) => {
        set_attribute(&node.element, "src", new_src.as_str());
        Some(new_src)
      },
      ImageOutcome::Flaw {
        explanation,
        suggestion,
      } => {
        flaws.image(&node.element, src, node.position, explanation, suggestion);
        None
      },
    };

    let Some(rendered) = rendered else {
      continue;
    };
    if attribute(&node.element, "width").is_some()
      || attribute(&node.element, "height").is_some()
    {
      continue;
    }
    if let Some((width, height)) = prober.dimensions(&rendered) {
      set_attribute(&node.element, "width", width.to_string());
      set_attribute(&node.element, "height", height.to_string());
    }
  }
}

//! The per-document pipeline.
//!
//! normalize -> heading ids -> links and cross references -> images ->
//! sections -> assembled [`Document`]. Each stage works on the same parsed
//! tree; only the final record leaves this module.
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error};

use crate::{
  anchors::normalize_heading_ids,
  context::ResolveContext,
  error::BuildError,
  flaws::FlawAggregator,
  images::{ImageProber, NoImageProbe, resolve_images},
  index::{CorpusEntry, UrlIndex, split_docs_url},
  l10n::Localization,
  links::resolve_links,
  normalize::normalize,
  options::EngineOptions,
  sections::extract_sections,
  types::{Document, DocumentSource, SourceDocument, Translation},
  utils::trim_trailing_slash,
};

static NO_PROBE: NoImageProbe = NoImageProbe;

/// Validate a document URL and split it into `(url, locale, slug)`.
fn document_url(source: &SourceDocument) -> Result<(&str, &str, &str), BuildError> {
  let url = trim_trailing_slash(source.mdn_url.trim());
  let (locale, slug) = split_docs_url(url)
    .filter(|(_, slug)| !slug.is_empty())
    .ok_or_else(|| {
      BuildError::InvalidDocumentUrl {
        url: source.mdn_url.clone(),
      }
    })?;
  Ok((url, locale, slug))
}

/// The index entry for a source document: its URL, its title and every
/// element id it will carry once heading ids are assigned.
///
/// Run this over the whole corpus before building anything, so that
/// cross-document fragments can be checked.
///
/// # Errors
///
/// Same URL and source position errors as [`Engine::build`].
pub fn corpus_entry(source: &SourceDocument) -> Result<CorpusEntry, BuildError> {
  let (url, ..) = document_url(source)?;
  let normalized = normalize(source)?;
  let anchors = normalize_heading_ids(&normalized);
  Ok(CorpusEntry::document(url, &source.title).with_anchors(anchors.ids().iter()))
}

/// Builds documents against a shared index. Cheap to share across threads.
pub struct Engine<'a> {
  index:   &'a UrlIndex,
  options: &'a EngineOptions,
  l10n:    &'a Localization,
  prober:  &'a dyn ImageProber,
}

impl<'a> Engine<'a> {
  #[must_use]
  pub fn new(
    index: &'a UrlIndex,
    options: &'a EngineOptions,
    l10n: &'a Localization,
  ) -> Self {
    Self {
      index,
      options,
      l10n,
      prober: &NO_PROBE,
    }
  }

  /// Use `prober` to fill in missing image dimensions.
  #[must_use]
  pub fn with_prober(mut self, prober: &'a dyn ImageProber) -> Self {
    self.prober = prober;
    self
  }

  #[must_use]
  pub const fn options(&self) -> &EngineOptions {
    self.options
  }

  /// Build one document.
  ///
  /// # Errors
  ///
  /// Returns an error when the document URL is not a `/<locale>/docs/<slug>`
  /// URL or the content carries a malformed source position. Broken links
  /// and the like are never errors; they are reported as flaws.
  pub fn build(&self, source: &SourceDocument) -> Result<Document, BuildError> {
    let (url, locale, slug) = document_url(source)?;

    let normalized = normalize(source)?;
    let anchors = normalize_heading_ids(&normalized);

    let ctx = ResolveContext {
      index: self.index,
      options: self.options,
      l10n: self.l10n,
      url,
      locale,
      anchors: &anchors,
    };
    let mut flaws = FlawAggregator::new();
    resolve_links(&ctx, &normalized.nodes, &mut flaws);
    resolve_images(&ctx, &normalized.nodes, self.prober, &mut flaws);
    let body = extract_sections(&normalized.blocks, &mut flaws);

    if !flaws.is_empty() {
      debug!("{url}: {} flaws", flaws.len());
    }

    Ok(Document {
      title: source.title.clone(),
      page_title: self.page_title(&source.title, locale, slug),
      summary: source.summary.clone(),
      mdn_url: url.to_string(),
      locale: locale.to_string(),
      is_translated: !self.options.is_default_locale(locale),
      other_translations: self.other_translations(locale, slug),
      source: self.document_source(source),
      modified: source.modified,
      body,
      flaws: flaws.finish(),
    })
  }

  /// Build one document, turning a panic anywhere in the pipeline into a
  /// [`BuildError::Panicked`] so that one bad document cannot take the
  /// whole run down.
  ///
  /// # Errors
  ///
  /// Everything [`Engine::build`] returns, plus `Panicked`.
  pub fn build_with_recovery(
    &self,
    source: &SourceDocument,
  ) -> Result<Document, BuildError> {
    panic::catch_unwind(AssertUnwindSafe(|| self.build(source))).unwrap_or_else(
      |payload| {
        let reason = payload
          .downcast_ref::<&str>()
          .map(ToString::to_string)
          .or_else(|| payload.downcast_ref::<String>().cloned())
          .unwrap_or_else(|| "unknown panic".to_string());
        error!("Panic while building {}: {reason}", source.mdn_url);
        Err(BuildError::Panicked {
          url: source.mdn_url.clone(),
          reason,
        })
      },
    )
  }

  /// `{title} - {section} | {site}` where `{section}` is the title of the
  /// top-level area the page lives in, when that is a different page.
  fn page_title(&self, title: &str, locale: &str, slug: &str) -> String {
    let site = &self.options.site_name;
    let mut segments = slug.split('/');
    let root = match (segments.next(), segments.next()) {
      (Some(first), Some(second)) => format!("{first}/{second}"),
      _ => return format!("{title} | {site}"),
    };
    if root.eq_ignore_ascii_case(trim_trailing_slash(slug)) {
      return format!("{title} | {site}");
    }
    self
      .index
      .resolve(locale, &root)
      .entry
      .map(|entry| entry.title.as_str())
      .filter(|root_title| !root_title.is_empty() && *root_title != title)
      .map_or_else(
        || format!("{title} | {site}"),
        |root_title| format!("{title} - {root_title} | {site}"),
      )
  }

  fn other_translations(&self, locale: &str, slug: &str) -> Vec<Translation> {
    self
      .index
      .translations(locale, slug)
      .into_iter()
      .map(|entry| {
        Translation {
          locale: entry.locale.clone(),
          native: self.options.native_name(&entry.locale),
          title:  entry.title.clone(),
        }
      })
      .collect()
  }

  fn document_source(&self, source: &SourceDocument) -> DocumentSource {
    let github_url = self.options.repository_url.as_deref().map(|base| {
      let folder = source.folder.trim_matches('/');
      if folder.is_empty() {
        format!("{}/{}", base.trim_end_matches('/'), source.filename)
      } else {
        format!("{}/{folder}/{}", base.trim_end_matches('/'), source.filename)
      }
    });
    DocumentSource {
      folder: source.folder.clone(),
      filename: source.filename.clone(),
      github_url,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::index::{CorpusEntry, DEFAULT_MAX_REDIRECT_HOPS};

  fn index() -> UrlIndex {
    UrlIndex::build(
      vec![
        CorpusEntry::document("/en-US/docs/Web/API", "Web APIs"),
        CorpusEntry::document("/en-US/docs/Web/API/Blob", "Blob"),
        CorpusEntry::document("/fr/docs/Web/API/Blob", "Blob"),
        CorpusEntry::document("/ja/docs/Web/API/Blob", "Blob"),
      ],
      Vec::new(),
      DEFAULT_MAX_REDIRECT_HOPS,
    )
    .expect("index should build")
  }

  fn source(url: &str) -> SourceDocument {
    SourceDocument {
      mdn_url:    url.to_string(),
      title:      "Blob".to_string(),
      summary:    "A blob.".to_string(),
      html:       "<p>Hello</p>".to_string(),
      raw_source: None,
      folder:     "en-us/web/api/blob".to_string(),
      filename:   "index.md".to_string(),
      modified:   None,
    }
  }

  #[test]
  fn test_document_fields() {
    let index = index();
    let options = EngineOptions {
      repository_url: Some("https://github.com/mdn/content/blob/main/files".to_string()),
      ..EngineOptions::default()
    };
    let l10n = Localization::new();
    let engine = Engine::new(&index, &options, &l10n);

    let document = engine
      .build(&source("/en-US/docs/Web/API/Blob"))
      .expect("document should build");
    assert_eq!(document.page_title, "Blob - Web APIs | MDN");
    assert_eq!(document.locale, "en-US");
    assert!(!document.is_translated);
    assert_eq!(
      document
        .other_translations
        .iter()
        .map(|t| t.native.as_str())
        .collect::<Vec<_>>(),
      vec!["Français", "日本語"]
    );
    assert_eq!(
      document.source.github_url.as_deref(),
      Some(
        "https://github.com/mdn/content/blob/main/files/en-us/web/api/blob/index.md"
      )
    );
  }

  #[test]
  fn test_corpus_entry_collects_heading_ids() {
    let mut blob = source("/en-US/docs/Web/API/Blob/");
    blob.html =
      r#"<h2>Syntax</h2><p id="note">x</p><h2 id="Examples">Examples</h2>"#
        .to_string();
    let entry = corpus_entry(&blob).expect("entry should build");
    assert_eq!(entry.url, "/en-US/docs/Web/API/Blob");
    assert_eq!(entry.title, "Blob");
    let anchors = entry.anchors.expect("documents carry anchors");
    assert!(anchors.contains(&"syntax".to_string()));
    assert!(anchors.contains(&"note".to_string()));
    assert!(anchors.contains(&"Examples".to_string()));

    assert!(corpus_entry(&source("/en-US/Web/API/Blob")).is_err());
  }

  #[test]
  fn test_page_title_without_root() {
    let index = index();
    let options = EngineOptions::default();
    let l10n = Localization::new();
    let engine = Engine::new(&index, &options, &l10n);
    let mut root = source("/en-US/docs/Web/API");
    root.title = "Web APIs".to_string();
    let document = engine.build(&root).expect("document should build");
    assert_eq!(document.page_title, "Web APIs | MDN");
  }

  #[test]
  fn test_invalid_document_url() {
    let index = index();
    let options = EngineOptions::default();
    let l10n = Localization::new();
    let engine = Engine::new(&index, &options, &l10n);
    assert_eq!(
      engine.build(&source("/not/a/doc")).err(),
      Some(BuildError::InvalidDocumentUrl {
        url: "/not/a/doc".to_string(),
      })
    );
  }

  struct PanickingProbe;

  impl ImageProber for PanickingProbe {
    fn dimensions(&self, url: &str) -> Option<(u32, u32)> {
      panic!("probe exploded on {url}");
    }
  }

  #[test]
  fn test_panics_are_recovered() {
    let index = UrlIndex::build(
      vec![
        CorpusEntry::document("/en-US/docs/Web/API/Blob", "Blob"),
        CorpusEntry::file("/en-US/docs/Web/API/Blob/x.png"),
      ],
      Vec::new(),
      DEFAULT_MAX_REDIRECT_HOPS,
    )
    .expect("index should build");
    let options = EngineOptions::default();
    let l10n = Localization::new();
    let probe = PanickingProbe;
    let engine = Engine::new(&index, &options, &l10n).with_prober(&probe);

    let mut doc = source("/en-US/docs/Web/API/Blob");
    doc.html = r#"<p><img src="x.png"></p>"#.to_string();
    let result = engine.build_with_recovery(&doc);
    assert!(matches!(result, Err(BuildError::Panicked { .. })));
  }
}

#![allow(dead_code, clippy::expect_used)]
use quire_engine::{
  CorpusEntry,
  DEFAULT_MAX_REDIRECT_HOPS,
  Document,
  Engine,
  EngineOptions,
  Localization,
  Redirect,
  SourceDocument,
  UrlIndex,
};

/// A small corpus shaped like a real documentation site.
pub fn corpus() -> UrlIndex {
  UrlIndex::build(
    vec![
      CorpusEntry::document("/en-US/docs/Web", "Web technology for developers"),
      CorpusEntry::document("/en-US/docs/Web/API", "Web APIs"),
      CorpusEntry::document("/en-US/docs/Web/API/Blob", "Blob")
        .with_anchors(["syntax", "examples", "browser_compatibility"]),
      CorpusEntry::document("/en-US/docs/Web/CSS", "CSS"),
      CorpusEntry::document("/en-US/docs/Web/CSS/number", "<number>"),
      CorpusEntry::document("/en-US/docs/Web/Linked_to", "Linked to"),
      CorpusEntry::file("/en-US/docs/Web/Linked_to/dino.svg"),
      CorpusEntry::document("/en-US/docs/Web/Only_English", "Only English"),
      CorpusEntry::document("/fr/docs/Web/Linked_to", "Lié à"),
      CorpusEntry::document("/fr/docs/Web/API/Blob", "Blob"),
    ],
    vec![
      Redirect::new("/en-US/docs/Web/CSS/Number_Type", "/en-US/docs/Web/CSS/number"),
      Redirect::new("/en-US/docs/Loop/A", "/en-US/docs/Loop/B"),
      Redirect::new("/en-US/docs/Loop/B", "/en-US/docs/Loop/A"),
    ],
    DEFAULT_MAX_REDIRECT_HOPS,
  )
  .expect("corpus should index")
}

pub fn source(url: &str, html: &str) -> SourceDocument {
  SourceDocument {
    mdn_url:    url.to_string(),
    title:      "Linked to".to_string(),
    summary:    String::new(),
    html:       html.to_string(),
    raw_source: None,
    folder:     url.trim_start_matches('/').to_lowercase().replace("/docs", ""),
    filename:   "index.md".to_string(),
    modified:   None,
  }
}

/// Build `source` against the shared corpus with default options.
pub fn build(source: &SourceDocument) -> Document {
  let index = corpus();
  let options = EngineOptions::default();
  let l10n = Localization::new();
  Engine::new(&index, &options, &l10n)
    .build(source)
    .expect("document should build")
}

/// All rendered prose, concatenated.
pub fn rendered(document: &Document) -> String {
  document
    .body
    .iter()
    .filter_map(|section| {
      match section {
        quire_engine::Section::Prose(prose) => Some(prose.content.as_str()),
        _ => None,
      }
    })
    .collect()
}

//! # quire-engine
//!
//! Link resolution, anchor normalization and flaw detection for a corpus of
//! localized documentation pages.
//!
//! The engine consumes documents whose macros were already expanded into
//! HTML, checks every link, cross reference, heading and image against a
//! shared [`UrlIndex`], and produces a [`Document`]: typed sections plus a
//! record of every defect found, with a suggested fix where one exists.
//!
//! ## Quick Start
//!
//! ```rust
//! use quire_engine::{
//!   CorpusEntry, Engine, EngineOptions, Localization, SourceDocument, UrlIndex,
//! };
//!
//! let index = UrlIndex::build(
//!   vec![
//!     CorpusEntry::document("/en-US/docs/Web/API/Blob", "Blob"),
//!     CorpusEntry::document("/en-US/docs/Web/CSS/number", "<number>"),
//!   ],
//!   Vec::new(),
//!   16,
//! )
//! .expect("corpus is not empty");
//! let options = EngineOptions::default();
//! let l10n = Localization::new();
//! let engine = Engine::new(&index, &options, &l10n);
//!
//! let source = SourceDocument {
//!   mdn_url:    "/en-US/docs/Web/API/Blob".to_string(),
//!   title:      "Blob".to_string(),
//!   summary:    String::new(),
//!   html:       r#"<p>See <a href="/en-US/docs/Web/CSS/Number">number</a></p>"#
//!     .to_string(),
//!   raw_source: None,
//!   folder:     "en-us/web/api/blob".to_string(),
//!   filename:   "index.md".to_string(),
//!   modified:   None,
//! };
//!
//! let document = engine.build(&source).expect("valid document");
//! let flaw = &document.flaws.broken_links[0];
//! assert_eq!(flaw.suggestion.as_deref(), Some("/en-US/docs/Web/CSS/number"));
//! ```

mod anchors;
mod context;
mod document;
mod error;
mod fallback;
mod flaws;
mod images;
pub mod index;
mod l10n;
mod links;
mod normalize;
mod options;
mod sections;
mod types;
pub mod utils;

pub use crate::{
  document::{Engine, corpus_entry},
  error::{BuildError, IndexError},
  fallback::{ONLY_IN_DEFAULT_LOCALE_CLASS, PAGE_NOT_CREATED_CLASS},
  flaws::FLAW_ATTRIBUTE,
  images::{EXTERNAL_IMAGE, ImageProber, MISSING_IMAGE, NoImageProbe},
  index::{
    CorpusEntry,
    DEFAULT_MAX_REDIRECT_HOPS,
    EntryKind,
    Redirect,
    UrlIndex,
    parse_redirects,
  },
  l10n::{Localization, ONLY_IN_DEFAULT_LOCALE, PAGE_NOT_CREATED},
  links::{
    ANCHOR_NOT_LOWERCASE,
    HTTPS_UPGRADE,
    MALFORMED_URL,
    SAME_PAGE_ANCHOR,
    SELF_LINK,
  },
  options::{EngineOptions, HttpsPolicy},
  sections::{MARKER_WITHOUT_HEADING, MARKER_WITHOUT_QUERY},
  types::{
    CompatibilitySection,
    Document,
    DocumentSource,
    Flaw,
    FlawTarget,
    Flaws,
    Position,
    ProseSection,
    Section,
    SourceDocument,
    SpecificationSection,
    Translation,
  },
};

//! Types for the quire-engine public API: the documents we consume, the
//! records we produce, and the flaws we find along the way.
use serde::{Deserialize, Serialize};

/// A source position (1-based). `0:0` means no position could be recovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
  pub line:   usize,
  pub column: usize,
}

impl Position {
  #[must_use]
  pub const fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }

  #[must_use]
  pub const fn is_known(self) -> bool {
    self.line > 0
  }
}

/// One document as handed to us by the macro expansion step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
  /// Canonical URL, e.g. `/en-US/docs/Web/API/Blob`.
  pub mdn_url: String,

  pub title: String,

  /// Summary text, used verbatim.
  #[serde(default)]
  pub summary: String,

  /// Expanded content tree, serialized as HTML. Elements may carry
  /// `data-sourcepos="L:C-L:C"` annotations.
  pub html: String,

  /// The unexpanded source, used to locate nodes that carry no position.
  #[serde(default)]
  pub raw_source: Option<String>,

  /// Folder of the source file, relative to the content root.
  #[serde(default)]
  pub folder: String,

  #[serde(default = "default_filename")]
  pub filename: String,

  #[serde(default)]
  pub modified: Option<jiff::Timestamp>,
}

fn default_filename() -> String {
  "index.md".to_string()
}

/// Which attribute a flaw is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlawTarget {
  Href(String),
  Src(String),
  /// Data query of a structured block.
  Query(String),
}

impl FlawTarget {
  #[must_use]
  pub fn value(&self) -> &str {
    match self {
      Self::Href(value) | Self::Src(value) | Self::Query(value) => value,
    }
  }
}

/// A recorded content defect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flaw {
  /// Per-occurrence identifier, mirrored as `data-flaw` on the element.
  pub id:          String,
  #[serde(flatten)]
  pub target:      FlawTarget,
  pub line:        usize,
  pub column:      usize,
  pub explanation: String,
  pub suggestion:  Option<String>,
  pub fixable:     bool,
}

impl Flaw {
  /// The `href` or `src` this flaw was raised for.
  #[must_use]
  pub fn target_value(&self) -> &str {
    self.target.value()
  }
}

/// All flaws of one document, by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flaws {
  pub broken_links: Vec<Flaw>,
  pub images:       Vec<Flaw>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sectioning:   Vec<Flaw>,
}

impl Flaws {
  #[must_use]
  pub fn total(&self) -> usize {
    self.broken_links.len() + self.images.len() + self.sectioning.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.total() == 0
  }

  #[must_use]
  pub fn fixable(&self) -> usize {
    self
      .broken_links
      .iter()
      .chain(&self.images)
      .chain(&self.sectioning)
      .filter(|flaw| flaw.fixable)
      .count()
  }
}

/// Free-form content between structured blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProseSection {
  pub id:      Option<String>,
  pub title:   Option<String>,
  #[serde(rename = "isH3")]
  pub is_h3:   bool,
  pub content: String,
}

/// A browser compatibility table placeholder. The table data itself comes
/// from an external collaborator keyed by `query`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatibilitySection {
  pub id:    Option<String>,
  pub title: Option<String>,
  #[serde(rename = "isH3")]
  pub is_h3: bool,
  pub query: String,
}

/// A specification table placeholder, keyed like [`CompatibilitySection`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecificationSection {
  pub id:    Option<String>,
  pub title: Option<String>,
  #[serde(rename = "isH3")]
  pub is_h3: bool,
  pub query: String,
}

/// A typed, ordered unit of document content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Section {
  Prose(ProseSection),
  Specifications(SpecificationSection),
  BrowserCompatibility(CompatibilitySection),
}

impl Section {
  #[must_use]
  pub const fn kind(&self) -> &'static str {
    match self {
      Self::Prose(_) => "prose",
      Self::Specifications(_) => "specifications",
      Self::BrowserCompatibility(_) => "browser_compatibility",
    }
  }

  #[must_use]
  pub fn id(&self) -> Option<&str> {
    match self {
      Self::Prose(s) => s.id.as_deref(),
      Self::Specifications(s) => s.id.as_deref(),
      Self::BrowserCompatibility(s) => s.id.as_deref(),
    }
  }

  #[must_use]
  pub fn title(&self) -> Option<&str> {
    match self {
      Self::Prose(s) => s.title.as_deref(),
      Self::Specifications(s) => s.title.as_deref(),
      Self::BrowserCompatibility(s) => s.title.as_deref(),
    }
  }

  #[must_use]
  pub const fn is_h3(&self) -> bool {
    match self {
      Self::Prose(s) => s.is_h3,
      Self::Specifications(s) => s.is_h3,
      Self::BrowserCompatibility(s) => s.is_h3,
    }
  }
}

/// A translation of the same document in another locale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
  pub locale: String,
  pub native: String,
  pub title:  String,
}

/// Where the document came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSource {
  pub folder:     String,
  pub filename:   String,
  pub github_url: Option<String>,
}

/// The assembled per-document record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
  pub title:              String,
  #[serde(rename = "pageTitle")]
  pub page_title:         String,
  pub summary:            String,
  pub mdn_url:            String,
  pub locale:             String,
  #[serde(rename = "isTranslated")]
  pub is_translated:      bool,
  pub other_translations: Vec<Translation>,
  pub source:             DocumentSource,
  pub modified:           Option<jiff::Timestamp>,
  pub body:               Vec<Section>,
  pub flaws:              Flaws,
}

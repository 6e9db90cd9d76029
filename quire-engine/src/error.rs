use thiserror::Error;

/// Failures that make the URL index unusable. Any of these aborts the whole
/// build, since no document can be resolved without the index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
  #[error("Corpus is empty; nothing to index")]
  EmptyCorpus,

  #[error("Invalid document URL in corpus: {0}")]
  InvalidUrl(String),

  #[error("Duplicate corpus entry (URLs differ only by case?): {0}")]
  DuplicateEntry(String),

  #[error("Malformed redirect on line {line}: {content:?}")]
  MalformedRedirect { line: usize, content: String },
}

/// Failures that abort the build of a single document. Other documents in
/// the batch are unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
  #[error("{url}: not a document URL (expected /<locale>/docs/<slug>)")]
  InvalidDocumentUrl { url: String },

  #[error("{url}: malformed source position {value:?}")]
  MalformedSourcePosition { url: String, value: String },

  #[error("{url}: critical error while building document: {reason}")]
  Panicked { url: String, reason: String },
}

impl BuildError {
  /// URL of the document that failed.
  #[must_use]
  pub fn url(&self) -> &str {
    match self {
      Self::InvalidDocumentUrl { url }
      | Self::MalformedSourcePosition { url, .. }
      | Self::Panicked { url, .. } => url,
    }
  }
}

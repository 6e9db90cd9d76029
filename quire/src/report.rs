use std::path::PathBuf;

use log::{error, info, warn};
use quire_engine::Flaws;

/// Why one document produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
  /// Document URL, or the record file path when the record could not be
  /// read at all.
  pub source: String,
  pub reason: String,
}

/// Totals for one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
  pub documents:    usize,
  pub written:      usize,
  pub broken_links: usize,
  pub images:       usize,
  pub sectioning:   usize,
  pub fixable:      usize,
  pub failures:     Vec<Failure>,
  pub output_dir:   PathBuf,
}

impl BuildReport {
  /// Count the flaws of one written document.
  pub fn record(&mut self, flaws: &Flaws) {
    self.written += 1;
    self.broken_links += flaws.broken_links.len();
    self.images += flaws.images.len();
    self.sectioning += flaws.sectioning.len();
    self.fixable += flaws.fixable();
  }

  pub fn fail(&mut self, source: impl Into<String>, reason: impl Into<String>) {
    self.failures.push(Failure {
      source: source.into(),
      reason: reason.into(),
    });
  }

  #[must_use]
  pub const fn total_flaws(&self) -> usize {
    self.broken_links + self.images + self.sectioning
  }

  /// A run succeeds when no document failed fatally. Flaws never fail a run.
  #[must_use]
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  /// Log the summary.
  pub fn log(&self) {
    info!(
      "Built {} of {} documents into {}",
      self.written,
      self.documents,
      self.output_dir.display()
    );
    if self.total_flaws() > 0 {
      warn!(
        "{} flaws ({} fixable): {} broken links, {} images, {} sectioning",
        self.total_flaws(),
        self.fixable,
        self.broken_links,
        self.images,
        self.sectioning
      );
    } else {
      info!("No flaws found");
    }
    for failure in &self.failures {
      error!("{}: {}", failure.source, failure.reason);
    }
  }
}

//! Collects flaws for one document.
//!
//! Ids are per occurrence and per category (`link1`, `link2`, `image1`, ...)
//! and are mirrored onto the offending element as `data-flaw`, so a reader
//! of the rendered page can find the record that belongs to an element.
//! Identical defects are never merged.
use kuchikikiki::NodeRef;
use log::debug;

use crate::{
  types::{Flaw, FlawTarget, Flaws, Position},
  utils::set_attribute,
};

/// Attribute linking an element to its flaw record.
pub const FLAW_ATTRIBUTE: &str = "data-flaw";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
  BrokenLink,
  Image,
  Sectioning,
}

impl Category {
  const fn prefix(self) -> &'static str {
    match self {
      Self::BrokenLink => "link",
      Self::Image => "image",
      Self::Sectioning => "sectioning",
    }
  }
}

#[derive(Debug, Default)]
pub struct FlawAggregator {
  flaws: Flaws,
}

impl FlawAggregator {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a broken or improvable link. Returns the flaw id.
  pub fn broken_link(
    &mut self,
    element: &NodeRef,
    href: &str,
    position: Position,
    explanation: String,
    suggestion: Option<String>,
  ) -> String {
    self.record(
      Category::BrokenLink,
      element,
      FlawTarget::Href(href.to_string()),
      position,
      explanation,
      suggestion,
    )
  }

  /// Record an image problem. Returns the flaw id.
  pub fn image(
    &mut self,
    element: &NodeRef,
    src: &str,
    position: Position,
    explanation: String,
    suggestion: Option<String>,
  ) -> String {
    self.record(
      Category::Image,
      element,
      FlawTarget::Src(src.to_string()),
      position,
      explanation,
      suggestion,
    )
  }

  /// Record a structural problem with a data block. Returns the flaw id.
  pub fn sectioning(
    &mut self,
    element: &NodeRef,
    query: &str,
    position: Position,
    explanation: String,
  ) -> String {
    self.record(
      Category::Sectioning,
      element,
      FlawTarget::Query(query.to_string()),
      position,
      explanation,
      None,
    )
  }

  fn record(
    &mut self,
    category: Category,
    element: &NodeRef,
    target: FlawTarget,
    position: Position,
    explanation: String,
    suggestion: Option<String>,
  ) -> String {
    let list = match category {
      Category::BrokenLink => &mut self.flaws.broken_links,
      Category::Image => &mut self.flaws.images,
      Category::Sectioning => &mut self.flaws.sectioning,
    };
    let id = format!("{}{}", category.prefix(), list.len() + 1);
    debug!(
      "{id} at {}:{}: {explanation} ({})",
      position.line,
      position.column,
      target.value()
    );
    set_attribute(element, FLAW_ATTRIBUTE, id.clone());
    list.push(Flaw {
      id: id.clone(),
      target,
      line: position.line,
      column: position.column,
      explanation,
      fixable: suggestion.is_some(),
      suggestion,
    });
    id
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.flaws.total()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.flaws.is_empty()
  }

  #[must_use]
  pub fn finish(self) -> Flaws {
    self.flaws
  }
}

//! Split the top-level blocks of a document into typed sections.
//!
//! `h2` and `h3` headings start a new section. Prose between headings is
//! collected into one prose section; a structured marker directly after a
//! heading becomes its own section and takes that heading's id and title.
use kuchikikiki::NodeRef;

use crate::{
  flaws::FlawAggregator,
  normalize::{Block, MarkerKind},
  types::{CompatibilitySection, ProseSection, Section, SpecificationSection},
  utils::{attribute, serialize_node},
};

pub const MARKER_WITHOUT_HEADING: &str =
  "Structured block without its own heading";
pub const MARKER_WITHOUT_QUERY: &str = "Structured block has no data query";

#[derive(Debug, Clone)]
struct HeadingInfo {
  id:    Option<String>,
  title: Option<String>,
  is_h3: bool,
}

impl HeadingInfo {
  fn from_element(element: &NodeRef, level: u8) -> Self {
    let title = element.text_contents().trim().to_string();
    Self {
      id:    attribute(element, "id").filter(|id| !id.is_empty()),
      title: (!title.is_empty()).then_some(title),
      is_h3: level == 3,
    }
  }
}

#[derive(Default)]
struct Extractor {
  sections: Vec<Section>,
  heading:  Option<HeadingInfo>,
  prose:    Vec<NodeRef>,
}

impl Extractor {
  /// Close the current prose run, if there is anything to close.
  fn flush(&mut self) {
    let heading = self.heading.take();
    if heading.is_none() && self.prose.is_empty() {
      return;
    }
    let content = self
      .prose
      .drain(..)
      .map(|node| serialize_node(&node))
      .collect::<String>();
    let heading = heading.unwrap_or(HeadingInfo {
      id:    None,
      title: None,
      is_h3: false,
    });
    self.sections.push(Section::Prose(ProseSection {
      id: heading.id,
      title: heading.title,
      is_h3: heading.is_h3,
      content,
    }));
  }

  fn marker(
    &mut self,
    kind: MarkerKind,
    query: Option<&str>,
    element: &NodeRef,
    position: crate::types::Position,
    flaws: &mut FlawAggregator,
  ) {
    let heading = if self.prose.is_empty() {
      self.heading.take()
    } else {
      self.flush();
      None
    };

    if heading.is_none() {
      flaws.sectioning(
        element,
        query.unwrap_or_default(),
        position,
        MARKER_WITHOUT_HEADING.to_string(),
      );
    }
    if query.is_none() {
      flaws.sectioning(element, "", position, MARKER_WITHOUT_QUERY.to_string());
    }

    let HeadingInfo { id, title, is_h3 } = heading.unwrap_or(HeadingInfo {
      id:    None,
      title: None,
      is_h3: false,
    });
    let query = query.unwrap_or_default().to_string();
    self.sections.push(match kind {
      MarkerKind::BrowserCompatibility => {
        Section::BrowserCompatibility(CompatibilitySection {
          id,
          title,
          is_h3,
          query,
        })
      },
      MarkerKind::Specifications => {
        Section::Specifications(SpecificationSection {
          id,
          title,
          is_h3,
          query,
        })
      },
    });
  }
}

/// Turn `blocks` into sections, recording structural flaws.
pub fn extract_sections(
  blocks: &[Block],
  flaws: &mut FlawAggregator,
) -> Vec<Section> {
  let mut extractor = Extractor::default();
  for block in blocks {
    match block {
      Block::Heading { level, element } => {
        extractor.flush();
        extractor.heading = Some(HeadingInfo::from_element(element, *level));
      },
      Block::Prose(node) => extractor.prose.push(node.clone()),
      Block::Marker {
        kind,
        query,
        element,
        position,
      } => {
        extractor.marker(*kind, query.as_deref(), element, *position, flaws);
      },
    }
  }
  extractor.flush();
  extractor.sections
}

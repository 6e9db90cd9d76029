//! Source normalization: turn an expanded content tree into the flat list of
//! nodes the resolvers work on.
//!
//! Every node carries a position in the *original* source. Positions come
//! from `data-sourcepos` annotations when the expansion step attached them.
//! Otherwise the n-th element with a given `href`/`src` is matched to the
//! n-th occurrence of that value in the raw source, and as a last resort the
//! nearest annotated ancestor's position is used.
use std::collections::{BTreeSet, HashMap};

use kuchikikiki::NodeRef;
use log::trace;
use tendril::TendrilSink;

use crate::{
  error::BuildError,
  types::{Position, SourceDocument},
  utils::{attribute, has_class, heading_level, remove_attribute, tag_name},
};

/// Attribute carrying `line:column-line:column` source ranges.
pub const SOURCEPOS_ATTRIBUTE: &str = "data-sourcepos";
/// Attribute marking a cross-reference placeholder left by macro expansion.
pub const XREF_ATTRIBUTE: &str = "data-xref";

/// What a normalized node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  Link { href: String },
  /// A macro-generated cross reference whose target is not yet known to
  /// exist. The element text is the macro argument.
  CrossReference { target: String },
  Image { src: String },
  Heading { level: u8 },
}

/// A typed node with its source position.
#[derive(Debug, Clone)]
pub struct SourceNode {
  pub kind:     NodeKind,
  pub element:  NodeRef,
  pub position: Position,
}

/// Kinds of structured-data placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
  BrowserCompatibility,
  Specifications,
}

impl MarkerKind {
  /// Class identifying the placeholder element.
  #[must_use]
  pub const fn class(self) -> &'static str {
    match self {
      Self::BrowserCompatibility => "bc-data",
      Self::Specifications => "bc-specs",
    }
  }

  /// Attribute holding the data query.
  #[must_use]
  pub const fn query_attribute(self) -> &'static str {
    match self {
      Self::BrowserCompatibility => "data-query",
      Self::Specifications => "data-bcd-query",
    }
  }
}

/// A top-level block of the document body.
#[derive(Debug, Clone)]
pub enum Block {
  Heading {
    level:   u8,
    element: NodeRef,
  },
  Marker {
    kind:     MarkerKind,
    query:    Option<String>,
    element:  NodeRef,
    position: Position,
  },
  Prose(NodeRef),
}

/// The normalized form of one document.
#[derive(Debug, Clone)]
pub struct NormalizedSource {
  /// Parsed tree; resolvers mutate it in place.
  pub document: NodeRef,
  /// The `<body>` element holding the content.
  pub body:     NodeRef,
  /// Links, cross references, images and headings in document order.
  pub nodes:    Vec<SourceNode>,
  /// Top-level blocks in document order.
  pub blocks:   Vec<Block>,
}

impl NormalizedSource {
  /// Nodes of one kind, in document order.
  pub fn headings(&self) -> impl Iterator<Item = (&SourceNode, u8)> {
    self.nodes.iter().filter_map(|node| {
      match node.kind {
        NodeKind::Heading { level } => Some((node, level)),
        _ => None,
      }
    })
  }

  /// Serialize the (possibly rewritten) body content.
  #[must_use]
  pub fn body_html(&self) -> String {
    self
      .body
      .children()
      .map(|child| crate::utils::serialize_node(&child))
      .collect()
  }
}

/// Parse a `data-sourcepos` value. Only the start of the range is used.
fn parse_sourcepos(value: &str) -> Option<Position> {
  let start = value.split('-').next()?.trim();
  let (line, column) = start.split_once(':')?;
  Some(Position::new(
    line.trim().parse().ok()?,
    column.trim().parse().ok()?,
  ))
}

/// Whether `c` could extend a path or URL.
fn continues_path(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '.' | '-')
}

/// Finds values in the raw source, one occurrence at a time.
struct SourceLocator<'a> {
  raw:         &'a str,
  line_starts: Vec<usize>,
  matches:     HashMap<(&'static str, String), Vec<Position>>,
  consumed:    HashMap<(&'static str, String), usize>,
}

impl<'a> SourceLocator<'a> {
  fn new(raw: &'a str) -> Self {
    let line_starts = std::iter::once(0)
      .chain(raw.match_indices('\n').map(|(offset, _)| offset + 1))
      .collect();
    Self {
      raw,
      line_starts,
      matches: HashMap::new(),
      consumed: HashMap::new(),
    }
  }

  fn position_of(&self, offset: usize) -> Position {
    let line = self.line_starts.partition_point(|start| *start <= offset);
    let line_start = self.line_starts.get(line.saturating_sub(1)).copied();
    let column = line_start.map_or(0, |start| {
      self.raw.get(start..offset).map_or(0, |s| s.chars().count())
    });
    Position::new(line, column + 1)
  }

  /// Every place `value` appears as the given attribute, in source order.
  /// HTML attribute, Markdown link and quoted occurrences are merged; a
  /// quoted match inside an attribute match counts once. The bare value is
  /// only searched when none of those match, and only where it is not the
  /// prefix of a longer path.
  fn find_all(&self, attribute: &str, value: &str) -> Vec<Position> {
    let delimited: [(String, &[&str]); 4] = [
      (format!("{attribute}=\""), &["\""]),
      (format!("{attribute}='"), &["'"]),
      ("](".to_string(), &[")", " "]),
      ("\"".to_string(), &["\""]),
    ];

    let mut offsets = BTreeSet::new();
    for (prefix, suffixes) in &delimited {
      for suffix in *suffixes {
        let pattern = format!("{prefix}{value}{suffix}");
        offsets.extend(
          self
            .raw
            .match_indices(pattern.as_str())
            .map(|(offset, _)| offset + prefix.len()),
        );
      }
    }

    if offsets.is_empty() {
      offsets.extend(
        self
          .raw
          .match_indices(value)
          .map(|(offset, _)| offset)
          .filter(|offset| {
            !self
              .raw
              .get(offset + value.len()..)
              .and_then(|rest| rest.chars().next())
              .is_some_and(continues_path)
          }),
      );
    }

    offsets
      .into_iter()
      .map(|offset| self.position_of(offset))
      .collect()
  }

  /// Position of the next unclaimed occurrence of `value`.
  fn locate(&mut self, attribute: &'static str, value: &str) -> Option<Position> {
    if value.is_empty() {
      return None;
    }
    let key = (attribute, value.to_string());
    if !self.matches.contains_key(&key) {
      let found = self.find_all(attribute, value);
      self.matches.insert(key.clone(), found);
    }
    let index = self.consumed.entry(key.clone()).or_insert(0);
    let position = self.matches.get(&key)?.get(*index).copied();
    *index += 1;
    position
  }
}

/// Position attached to the element itself.
fn own_position(
  node: &NodeRef,
  url: &str,
) -> Result<Option<Position>, BuildError> {
  let Some(value) = attribute(node, SOURCEPOS_ATTRIBUTE) else {
    return Ok(None);
  };
  parse_sourcepos(&value).map(Some).ok_or_else(|| {
    BuildError::MalformedSourcePosition {
      url: url.to_string(),
      value,
    }
  })
}

/// Position of the nearest annotated ancestor.
fn inherited_position(node: &NodeRef) -> Option<Position> {
  node.ancestors().find_map(|ancestor| {
    attribute(&ancestor, SOURCEPOS_ATTRIBUTE)
      .and_then(|value| parse_sourcepos(&value))
  })
}

fn classify(node: &NodeRef) -> Option<(NodeKind, &'static str, String)> {
  let tag = tag_name(node)?;
  match tag.as_str() {
    "a" => {
      if let Some(target) = attribute(node, XREF_ATTRIBUTE) {
        let text = node.text_contents().trim().to_string();
        return Some((NodeKind::CrossReference { target }, "", text));
      }
      let href = attribute(node, "href")?;
      Some((NodeKind::Link { href: href.clone() }, "href", href))
    },
    "img" => {
      let src = attribute(node, "src")?;
      Some((NodeKind::Image { src: src.clone() }, "src", src))
    },
    _ => {
      heading_level(node).map(|level| (NodeKind::Heading { level }, "", String::new()))
    },
  }
}

fn marker_kind(node: &NodeRef) -> Option<MarkerKind> {
  if tag_name(node)? != "div" {
    return None;
  }
  [MarkerKind::BrowserCompatibility, MarkerKind::Specifications]
    .into_iter()
    .find(|kind| has_class(node, kind.class()))
}

/// Normalize one source document.
///
/// # Errors
///
/// Returns [`BuildError::MalformedSourcePosition`] if any element carries a
/// `data-sourcepos` value that is not `line:column[-line:column]`.
pub fn normalize(source: &SourceDocument) -> Result<NormalizedSource, BuildError> {
  let document = kuchikikiki::parse_html().one(source.html.as_str());
  let body = document
    .select_first("body")
    .map_or_else(|()| document.clone(), |body| body.as_node().clone());

  let mut locator = source.raw_source.as_deref().map(SourceLocator::new);
  let mut nodes = Vec::new();

  for node in body.descendants() {
    let own = own_position(&node, &source.mdn_url)?;
    let Some((kind, attribute_name, needle)) = classify(&node) else {
      continue;
    };

    let located = match (&mut locator, own) {
      (_, Some(position)) => Some(position),
      (Some(locator), None) if !needle.is_empty() => {
        locator.locate(attribute_name, &needle)
      },
      _ => None,
    };
    let position = located
      .or_else(|| inherited_position(&node))
      .unwrap_or_default();

    nodes.push(SourceNode {
      kind,
      element: node,
      position,
    });
  }

  let mut blocks = Vec::new();
  for child in body.children() {
    if let Some(text) = child.as_text() {
      if !text.borrow().trim().is_empty() {
        blocks.push(Block::Prose(child.clone()));
      }
      continue;
    }
    if child.as_element().is_none() {
      continue;
    }

    if let Some(kind) = marker_kind(&child) {
      let query = attribute(&child, kind.query_attribute())
        .map(|query| query.trim().to_string())
        .filter(|query| !query.is_empty());
      let position = match (&mut locator, own_position(&child, &source.mdn_url)?)
      {
        (_, Some(position)) => position,
        (Some(locator), None) => {
          query
            .as_deref()
            .and_then(|query| locator.locate(kind.query_attribute(), query))
            .unwrap_or_default()
        },
        (None, None) => Position::default(),
      };
      blocks.push(Block::Marker {
        kind,
        query,
        element: child.clone(),
        position,
      });
      continue;
    }

    match heading_level(&child) {
      Some(level @ (2 | 3)) => {
        blocks.push(Block::Heading {
          level,
          element: child.clone(),
        });
      },
      _ => blocks.push(Block::Prose(child.clone())),
    }
  }

  for node in body.descendants() {
    remove_attribute(&node, SOURCEPOS_ATTRIBUTE);
  }

  trace!(
    "{}: normalized {} nodes in {} blocks",
    source.mdn_url,
    nodes.len(),
    blocks.len()
  );

  Ok(NormalizedSource {
    document,
    body,
    nodes,
    blocks,
  })
}

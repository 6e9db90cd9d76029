#![allow(clippy::expect_used, clippy::unwrap_used)]
mod common;

use common::{build, rendered, source};
use quire_engine::{
  ANCHOR_NOT_LOWERCASE,
  HTTPS_UPGRADE,
  MALFORMED_URL,
  Position,
  SAME_PAGE_ANCHOR,
  SELF_LINK,
};

const DOC: &str = "/en-US/docs/Web/Linked_to";

#[test]
fn test_case_insensitive_link_gets_canonical_suggestion() {
  let document = build(&source(
    DOC,
    r#"<p data-sourcepos="3:1-3:60"><a href="/en-us/DOCS/Web/api/BLOB" data-sourcepos="3:5-3:50">Blob</a></p>"#,
  ));
  let flaws = &document.flaws.broken_links;
  assert_eq!(flaws.len(), 1);
  assert_eq!(flaws[0].id, "link1");
  assert_eq!(flaws[0].target_value(), "/en-us/DOCS/Web/api/BLOB");
  assert_eq!(flaws[0].suggestion.as_deref(), Some("/en-US/docs/Web/API/Blob"));
  assert!(flaws[0].fixable);
  assert_eq!((flaws[0].line, flaws[0].column), (3, 5));
}

#[test]
fn test_http_link_upgrade() {
  let document = build(&source(
    DOC,
    r#"<p><a href="http://www.mozilla.org">Mozilla</a></p>"#,
  ));
  let flaw = &document.flaws.broken_links[0];
  assert_eq!(flaw.explanation, HTTPS_UPGRADE);
  assert_eq!(flaw.suggestion.as_deref(), Some("https://www.mozilla.org"));
  assert!(flaw.fixable);
}

#[test]
fn test_uppercase_fragment_on_same_page() {
  let mut doc = source(
    DOC,
    concat!(
      "<h2>Heading1</h2>",
      "<p>Text</p>",
      r##"<p>Link to <a href="#Heading1">head</a></p>"##,
    ),
  );
  doc.raw_source = Some(
    [
      "---",
      "title: Linked to",
      "---",
      "",
      "## Heading1",
      "",
      "Link to [head](#Heading1)",
    ]
    .join("\n"),
  );
  let document = build(&doc);

  let flaw = &document.flaws.broken_links[0];
  assert_eq!(flaw.explanation, ANCHOR_NOT_LOWERCASE);
  assert_eq!(flaw.suggestion.as_deref(), Some("#heading1"));
  assert!(flaw.fixable);
  assert_eq!(Position::new(flaw.line, flaw.column), Position::new(7, 16));
  assert!(rendered(&document).contains(r##"href="#heading1""##));
}

#[test]
fn test_hopeless_link_has_no_suggestion() {
  let document = build(&source(
    DOC,
    r#"<p><a href="/en-US/docs/Hopeless/Case">nope</a></p>"#,
  ));
  let flaw = &document.flaws.broken_links[0];
  assert_eq!(flaw.explanation, "Can't resolve /en-US/docs/Hopeless/Case");
  assert_eq!(flaw.suggestion, None);
  assert!(!flaw.fixable);
}

#[test]
fn test_repeated_broken_link_is_tracked_per_occurrence() {
  let html = (1..=3)
    .map(|line| {
      format!(
        r#"<p data-sourcepos="{line}:1-{line}:40">See <a href="/en-US/docs/Web/CSS/Number">number</a></p>"#
      )
    })
    .collect::<String>();
  let document = build(&source(DOC, &html));
  let flaws = &document.flaws.broken_links;

  assert_eq!(
    flaws.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
    vec!["link1", "link2", "link3"]
  );
  assert!(flaws.iter().all(|f| {
    f.suggestion.as_deref() == Some("/en-US/docs/Web/CSS/number") && f.fixable
  }));
  assert_eq!(
    flaws.iter().map(|f| f.line).collect::<Vec<_>>(),
    vec![1, 2, 3]
  );
  let html = rendered(&document);
  assert!(html.contains(r#"data-flaw="link1""#));
  assert!(html.contains(r#"data-flaw="link3""#));
}

#[test]
fn test_malformed_url_twice() {
  let raw = "A [bad](http://[oops) link.\n\nAnother [bad](http://[oops) link.\n";
  let mut doc = source(
    DOC,
    concat!(
      r#"<p>A <a href="http://[oops">bad</a> link.</p>"#,
      r#"<p>Another <a href="http://[oops">bad</a> link.</p>"#,
    ),
  );
  doc.raw_source = Some(raw.to_string());
  let document = build(&doc);
  let flaws = &document.flaws.broken_links;

  assert_eq!(flaws.len(), 2);
  for flaw in flaws {
    assert_eq!(flaw.explanation, MALFORMED_URL);
    assert_eq!(flaw.suggestion, None);
    assert!(!flaw.fixable);
  }
  assert_eq!((flaws[0].line, flaws[0].column), (1, 9));
  assert_eq!((flaws[1].line, flaws[1].column), (3, 15));
}

#[test]
fn test_self_references() {
  let document = build(&source(
    DOC,
    concat!(
      r#"<h2>Usage</h2>"#,
      r#"<p><a href="/en-US/docs/Web/Linked_to#Usage">here</a></p>"#,
      r#"<p><a href="/en-US/docs/Web/Linked_to">this page</a></p>"#,
    ),
  ));
  let flaws = &document.flaws.broken_links;
  assert_eq!(flaws[0].explanation, SAME_PAGE_ANCHOR);
  assert_eq!(flaws[0].suggestion.as_deref(), Some("#Usage"));
  assert!(flaws[0].fixable);
  assert_eq!(flaws[1].explanation, SELF_LINK);
  assert_eq!(flaws[1].suggestion, None);
  assert!(!flaws[1].fixable);
}

#[test]
fn test_redirects_and_cycles() {
  let document = build(&source(
    DOC,
    concat!(
      r#"<p><a href="/en-US/docs/Web/CSS/Number_Type">moved</a></p>"#,
      r#"<p><a href="/en-US/docs/Loop/A">loop</a></p>"#,
    ),
  ));
  let flaws = &document.flaws.broken_links;
  assert_eq!(flaws[0].suggestion.as_deref(), Some("/en-US/docs/Web/CSS/number"));
  assert_eq!(flaws[1].suggestion, None);
}

#[test]
fn test_cross_document_anchor() {
  let document = build(&source(
    DOC,
    concat!(
      r#"<p><a href="/en-US/docs/Web/API/Blob#Examples">ok-ish</a></p>"#,
      r#"<p><a href="/en-US/docs/Web/API/Blob#browser-compatibility">close</a></p>"#,
      r#"<p><a href="/en-US/docs/Web/API/Blob#syntax">fine</a></p>"#,
    ),
  ));
  let flaws = &document.flaws.broken_links;
  assert_eq!(flaws.len(), 2);
  assert_eq!(flaws[0].explanation, ANCHOR_NOT_LOWERCASE);
  assert_eq!(
    flaws[0].suggestion.as_deref(),
    Some("/en-US/docs/Web/API/Blob#examples")
  );
  assert_eq!(
    flaws[1].suggestion.as_deref(),
    Some("/en-US/docs/Web/API/Blob#browser_compatibility")
  );
}

#[test]
fn test_absolute_links_to_own_site() {
  let document = build(&source(
    DOC,
    r#"<p><a href="https://developer.mozilla.org/en-US/docs/Web/CSS/number">n</a></p>"#,
  ));
  let flaw = &document.flaws.broken_links[0];
  assert_eq!(flaw.suggestion.as_deref(), Some("/en-US/docs/Web/CSS/number"));
  assert!(rendered(&document).contains(r#"href="/en-US/docs/Web/CSS/number""#));
}

#[test]
fn test_good_links_have_no_flaws() {
  let document = build(&source(
    DOC,
    concat!(
      r#"<p><a href="/en-US/docs/Web/API/Blob">Blob</a> "#,
      r#"<a href="https://example.com/">elsewhere</a> "#,
      r#"<a href="mailto:someone@example.com">mail</a></p>"#,
    ),
  ));
  assert!(document.flaws.is_empty());
}

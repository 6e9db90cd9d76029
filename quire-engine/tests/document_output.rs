#![allow(clippy::expect_used, clippy::unwrap_used)]
mod common;

use std::collections::HashSet;

use common::{build, corpus, rendered, source};
use quire_engine::{
  BuildError,
  EXTERNAL_IMAGE,
  Engine,
  EngineOptions,
  Localization,
  MISSING_IMAGE,
  ONLY_IN_DEFAULT_LOCALE,
  ONLY_IN_DEFAULT_LOCALE_CLASS,
  PAGE_NOT_CREATED_CLASS,
  Section,
};

#[test]
fn test_repeated_external_image() {
  let html = (0..3)
    .map(|n| {
      let line = 5 + n * 2;
      format!(
        r#"<p data-sourcepos="{line}:1-{line}:80"><img src="https://www.peterbe.com/static/images/howsmywifi-scr.png" alt="shot"></p>"#
      )
    })
    .collect::<String>();
  let document = build(&source("/en-US/docs/Web/Linked_to", &html));
  let images = &document.flaws.images;

  assert_eq!(images.len(), 3);
  assert_eq!(
    images.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
    vec!["image1", "image2", "image3"]
  );
  assert!(images.iter().all(|f| {
    f.explanation == EXTERNAL_IMAGE
      && f.target_value()
        == "https://www.peterbe.com/static/images/howsmywifi-scr.png"
  }));
  let lines = images.iter().map(|f| f.line).collect::<Vec<_>>();
  assert_eq!(lines, vec![5, 7, 9]);
}

#[test]
fn test_relative_image_is_absolutized() {
  let document = build(&source(
    "/en-US/docs/Web/Linked_to",
    r#"<p><img src="dino.svg" alt="dino"><img src="missing.png"></p>"#,
  ));
  let html = rendered(&document);
  assert!(html.contains(r#"src="/en-US/docs/Web/Linked_to/dino.svg""#));
  assert_eq!(document.flaws.images.len(), 1);
  assert_eq!(document.flaws.images[0].explanation, MISSING_IMAGE);
  assert_eq!(document.flaws.images[0].target_value(), "missing.png");
}

#[test]
fn test_translated_document_falls_back_to_default_locale() {
  let document = build(&source(
    "/fr/docs/Web/Linked_to",
    concat!(
      r#"<p><a href="/fr/docs/Web/Only_English">only English</a> "#,
      r#"<a href="/fr/docs/Web/API/Blob">Blob</a> "#,
      r#"<img src="dino.svg"></p>"#,
    ),
  ));
  assert!(document.is_translated);
  assert!(document.flaws.is_empty());

  let html = rendered(&document);
  assert!(html.contains(r#"href="/en-US/docs/Web/Only_English""#));
  assert!(html.contains(ONLY_IN_DEFAULT_LOCALE_CLASS));
  assert!(html.contains(r#"title="Currently only available in English (US)""#));
  assert!(html.contains(r#"href="/fr/docs/Web/API/Blob""#));
  assert!(html.contains(r#"src="/en-US/docs/Web/Linked_to/dino.svg""#));
}

#[test]
fn test_fallback_tooltip_is_localized() {
  let index = corpus();
  let options = EngineOptions::default();
  let mut l10n = Localization::new();
  l10n.insert("fr", ONLY_IN_DEFAULT_LOCALE, "Disponible uniquement en anglais");
  let document = Engine::new(&index, &options, &l10n)
    .build(&source(
      "/fr/docs/Web/Linked_to",
      r#"<p><a href="/fr/docs/Web/CSS/number">nombre</a></p>"#,
    ))
    .expect("document should build");
  assert!(
    rendered(&document).contains(r#"title="Disponible uniquement en anglais""#)
  );
}

#[test]
fn test_unresolved_cross_reference() {
  let document = build(&source(
    "/en-US/docs/Web/Linked_to",
    concat!(
      r#"<p><a data-xref="/en-US/docs/Web/CSS/number">&lt;number&gt;</a> "#,
      r#"<a data-xref="/en-US/docs/Web/CSS/never-written">never-written</a></p>"#,
    ),
  ));
  let html = rendered(&document);
  assert!(html.contains(r#"href="/en-US/docs/Web/CSS/number""#));
  assert!(html.contains(PAGE_NOT_CREATED_CLASS));
  assert!(!html.contains("data-xref"));
  assert!(!html.contains(r#"href="/en-US/docs/Web/CSS/never-written""#));

  let flaws = &document.flaws.broken_links;
  assert_eq!(flaws.len(), 1);
  assert_eq!(
    flaws[0].explanation,
    "Can't resolve /en-US/docs/Web/CSS/never-written"
  );
  assert_eq!(flaws[0].suggestion, None);
}

#[test]
fn test_heading_ids_are_unique_ignoring_case() {
  let document = build(&source(
    "/en-US/docs/Web/Linked_to",
    concat!(
      "<h2>Examples</h2><p>a</p>",
      r#"<h2 id="examples">Again</h2><p>b</p>"#,
      r#"<h3 id="EXAMPLES">Shouting</h3><p>c</p>"#,
    ),
  ));
  let ids = document
    .body
    .iter()
    .filter_map(Section::id)
    .map(ToString::to_string)
    .collect::<Vec<_>>();
  let lowered = ids.iter().map(|id| id.to_lowercase()).collect::<HashSet<_>>();
  assert_eq!(ids.len(), 3);
  assert_eq!(lowered.len(), ids.len());
  assert_eq!(ids[0], "examples");
}

#[test]
fn test_sections_and_serialized_record() {
  let document = build(&source(
    "/en-US/docs/Web/Linked_to",
    concat!(
      "<p>Intro.</p>",
      "<h2>Browser compatibility</h2>",
      r#"<div class="bc-data" data-query="api.Blob"></div>"#,
      "<h2>Specifications</h2>",
      "<h3>Details</h3>",
      r#"<div class="bc-specs" data-bcd-query="api.Blob"></div>"#,
    ),
  ));
  let json = serde_json::to_value(&document).expect("document serializes");

  assert_eq!(json["pageTitle"], "Linked to | MDN");
  assert_eq!(json["isTranslated"], false);
  assert_eq!(json["other_translations"][0]["locale"], "fr");
  assert_eq!(json["other_translations"][0]["native"], "Français");

  let body = json["body"].as_array().expect("body is an array");
  let kinds = body
    .iter()
    .map(|section| section["type"].as_str().unwrap_or_default())
    .collect::<Vec<_>>();
  assert_eq!(kinds, vec![
    "prose",
    "browser_compatibility",
    "prose",
    "specifications"
  ]);
  assert_eq!(body[1]["value"]["query"], "api.Blob");
  assert_eq!(body[1]["value"]["isH3"], false);
  assert_eq!(body[3]["value"]["isH3"], true);
  assert_eq!(body[3]["value"]["id"], "details");
  assert!(json["flaws"]["broken_links"].as_array().is_some());
  assert!(json["flaws"].get("sectioning").is_none());
}

#[test]
fn test_malformed_source_position_is_fatal_for_that_document() {
  let index = corpus();
  let options = EngineOptions::default();
  let l10n = Localization::new();
  let engine = Engine::new(&index, &options, &l10n);

  let bad = source(
    "/en-US/docs/Web/Linked_to",
    r#"<p data-sourcepos="x:y">broken</p>"#,
  );
  let good = source("/en-US/docs/Web/API/Blob", "<p>fine</p>");

  assert!(matches!(
    engine.build_with_recovery(&bad),
    Err(BuildError::MalformedSourcePosition { .. })
  ));
  assert!(engine.build_with_recovery(&good).is_ok());
}

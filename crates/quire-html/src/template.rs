use std::fs;

use color_eyre::eyre::{Context, Result};
use html_escape::{encode_double_quoted_attribute, encode_text};
use quire_config::Config;
use quire_engine::{Document, Section};
use serde::Serialize;
use tera::Tera;

/// Page template used when no `template_path` is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/document.html");

/// A translation, with every field escaped for its place in the page.
#[derive(Debug, Serialize)]
struct TranslationLink {
  locale: String,
  native: String,
  title:  String,
  url:    String,
}

/// Render a document record as a complete HTML page.
///
/// Template variables are escaped before they are handed to tera, so custom
/// templates can use them directly.
///
/// # Errors
///
/// Returns an error if a custom template cannot be read, or if the template
/// fails to parse or render.
pub fn render(config: &Config, document: &Document) -> Result<String> {
  let template_content = match &config.template_path {
    Some(path) => {
      fs::read_to_string(path).wrap_err_with(|| {
        format!("Failed to read template file: {}", path.display())
      })?
    },
    None => DEFAULT_TEMPLATE.to_string(),
  };

  let mut tera = Tera::default();
  tera
    .add_raw_template("document", &template_content)
    .wrap_err("Failed to parse page template")?;

  let slug = slug_of(&document.mdn_url);
  let translations: Vec<TranslationLink> = document
    .other_translations
    .iter()
    .map(|translation| {
      TranslationLink {
        locale: attr(&translation.locale),
        native: encode_text(&translation.native).into_owned(),
        title:  attr(&translation.title),
        url:    attr(&format!("/{}/docs/{slug}", translation.locale)),
      }
    })
    .collect();

  let mut tera_context = tera::Context::new();
  tera_context.insert("title", &encode_text(&document.title));
  tera_context.insert("page_title", &encode_text(&document.page_title));
  tera_context.insert("summary", &attr(&document.summary));
  tera_context.insert("mdn_url", &attr(&document.mdn_url));
  tera_context.insert("locale", &attr(&document.locale));
  tera_context.insert("site_name", &encode_text(&config.site_name));
  tera_context.insert("other_translations", &translations);
  tera_context.insert(
    "github_url",
    &document.source.github_url.as_deref().map(attr),
  );
  tera_context.insert(
    "modified",
    &document.modified.map(|timestamp| timestamp.to_string()),
  );
  tera_context.insert("flaw_count", &document.flaws.total());
  tera_context.insert("toc", &render_toc(&document.body));
  tera_context.insert("body_html", &render_body(&document.body));

  tera
    .render("document", &tera_context)
    .wrap_err_with(|| format!("Failed to render page for {}", document.mdn_url))
}

fn attr(value: &str) -> String {
  encode_double_quoted_attribute(value).into_owned()
}

/// Render the section list of a document as HTML.
///
/// Prose is emitted as-is. Structured sections become empty placeholders
/// that carry their data query, to be filled in by whatever owns that data.
#[must_use]
pub fn render_body(sections: &[Section]) -> String {
  let mut html = String::new();
  for section in sections {
    html.push_str("<section");
    if let Some(id) = section.id() {
      html.push_str(&format!(
        " aria-labelledby=\"{}\"",
        encode_double_quoted_attribute(id)
      ));
    }
    html.push('>');

    if let Some(title) = section.title() {
      let tag = if section.is_h3() { "h3" } else { "h2" };
      match section.id() {
        Some(id) => {
          html.push_str(&format!(
            "<{tag} id=\"{}\">{}</{tag}>",
            encode_double_quoted_attribute(id),
            encode_text(title)
          ));
        },
        None => {
          html.push_str(&format!("<{tag}>{}</{tag}>", encode_text(title)));
        },
      }
    }

    match section {
      Section::Prose(prose) => html.push_str(&prose.content),
      Section::BrowserCompatibility(compat) => {
        html.push_str(&format!(
          "<div class=\"bc-data\" data-query=\"{}\"></div>",
          encode_double_quoted_attribute(&compat.query)
        ));
      },
      Section::Specifications(specs) => {
        html.push_str(&format!(
          "<div class=\"bc-specs\" data-bcd-query=\"{}\"></div>",
          encode_double_quoted_attribute(&specs.query)
        ));
      },
    }
    html.push_str("</section>");
  }
  html
}

/// Table of contents over titled sections, h3 entries nested under the
/// preceding h2.
fn render_toc(sections: &[Section]) -> String {
  let entries: Vec<(&str, &str, bool)> = sections
    .iter()
    .filter_map(|section| {
      Some((section.id()?, section.title()?, section.is_h3()))
    })
    .collect();
  if entries.is_empty() {
    return String::new();
  }

  let mut toc = String::from("<ul>");
  let mut nested = false;
  for (index, (id, title, is_h3)) in entries.iter().enumerate() {
    if *is_h3 && !nested && index > 0 {
      toc.push_str("<ul>");
      nested = true;
    } else if !*is_h3 && nested {
      toc.push_str("</li></ul></li>");
      nested = false;
    } else if index > 0 {
      toc.push_str("</li>");
    }
    toc.push_str(&format!(
      "<li><a href=\"#{}\">{}</a>",
      encode_double_quoted_attribute(id),
      encode_text(title)
    ));
  }
  if nested {
    toc.push_str("</li></ul>");
  }
  toc.push_str("</li></ul>");
  toc
}

/// The part of a document URL after `/docs/`.
pub(crate) fn slug_of(mdn_url: &str) -> &str {
  mdn_url
    .split_once("/docs/")
    .map_or(mdn_url.trim_start_matches('/'), |(_, slug)| slug)
}

#[cfg(test)]
mod tests {
  use quire_engine::{CompatibilitySection, ProseSection};

  use super::*;

  fn prose(id: Option<&str>, title: Option<&str>, is_h3: bool) -> Section {
    Section::Prose(ProseSection {
      id: id.map(str::to_string),
      title: title.map(str::to_string),
      is_h3,
      content: "<p>text</p>".to_string(),
    })
  }

  #[test]
  fn test_render_body_headings_and_placeholders() {
    let body = render_body(&[
      prose(None, None, false),
      prose(Some("a_b"), Some("A <b>"), true),
      Section::BrowserCompatibility(CompatibilitySection {
        id:    Some("browser_compatibility".to_string()),
        title: Some("Browser compatibility".to_string()),
        is_h3: false,
        query: "api.\"Blob\"".to_string(),
      }),
    ]);
    assert!(body.starts_with("<section><p>text</p></section>"));
    assert!(body.contains("<h3 id=\"a_b\">A &lt;b&gt;</h3><p>text</p>"));
    assert!(body.contains(
      "<h2 id=\"browser_compatibility\">Browser compatibility</h2><div \
       class=\"bc-data\" data-query=\"api.&quot;Blob&quot;\"></div>"
    ));
  }

  #[test]
  fn test_toc_nests_h3_under_h2() {
    let toc = render_toc(&[
      prose(None, None, false),
      prose(Some("one"), Some("One"), false),
      prose(Some("one_a"), Some("One A"), true),
      prose(Some("two"), Some("Two"), false),
    ]);
    assert_eq!(
      toc,
      "<ul><li><a href=\"#one\">One</a><ul><li><a href=\"#one_a\">One \
       A</a></li></ul></li><li><a href=\"#two\">Two</a></li></ul>"
    );
  }

  #[test]
  fn test_toc_empty_without_titles() {
    assert!(render_toc(&[prose(None, None, false)]).is_empty());
  }

  #[test]
  fn test_slug_of() {
    assert_eq!(slug_of("/en-US/docs/Web/API/Blob"), "Web/API/Blob");
    assert_eq!(slug_of("/en-US/about"), "en-US/about");
  }
}

use std::{
  fs,
  path::{Path, PathBuf},
};

use color_eyre::eyre::{Context, Result};
use log::debug;
use quire_engine::Document;

/// Directory a document's files are written to:
/// `<output>/<locale>/docs/<slug>`, lowercased like the URLs are served.
#[must_use]
pub fn document_dir(output_dir: &Path, document: &Document) -> PathBuf {
  let mut dir = output_dir.to_path_buf();
  for segment in document
    .mdn_url
    .trim_matches('/')
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
  {
    dir.push(segment.to_lowercase());
  }
  dir
}

/// Write `index.html` (the rendered page) and `index.json` (the document
/// record) for one document. Returns the directory written to.
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be written, or if
/// the record fails to serialize.
pub fn write_document(
  output_dir: &Path,
  document: &Document,
  html: &str,
) -> Result<PathBuf> {
  let dir = document_dir(output_dir, document);
  fs::create_dir_all(&dir).wrap_err_with(|| {
    format!("Failed to create output directory: {}", dir.display())
  })?;

  let html_path = dir.join("index.html");
  fs::write(&html_path, html).wrap_err_with(|| {
    format!("Failed to write HTML file: {}", html_path.display())
  })?;

  let json = serde_json::to_string_pretty(document)
    .wrap_err("Failed to serialize document record")?;
  let json_path = dir.join("index.json");
  fs::write(&json_path, json).wrap_err_with(|| {
    format!("Failed to write JSON file: {}", json_path.display())
  })?;

  debug!("Wrote {}", dir.display());
  Ok(dir)
}

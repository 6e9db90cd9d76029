//! Reading document records from disk and building the URL index over them.
use std::{
  fs,
  path::{Path, PathBuf},
};

use color_eyre::eyre::{Context, Result, bail};
use log::{debug, info, warn};
use quire_config::Config;
use quire_engine::{
  BuildError,
  CorpusEntry,
  SourceDocument,
  UrlIndex,
  corpus_entry,
  parse_redirects,
};
use serde::Deserialize;
use walkdir::WalkDir;

/// One expanded document as written by the macro expansion step, plus the
/// names of the files that live next to it.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
  #[serde(flatten)]
  pub source:      SourceDocument,
  /// File names relative to the document URL, e.g. `dino.svg`.
  #[serde(default)]
  pub attachments: Vec<String>,
}

/// A record file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableRecord {
  pub path:   PathBuf,
  pub reason: String,
}

/// Every `*.json` file under `input_dir`, sorted for stable output.
#[must_use]
pub fn collect_record_files(input_dir: &Path) -> Vec<PathBuf> {
  let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
    .follow_links(true)
    .into_iter()
    .filter_map(std::result::Result::ok)
    .filter(|entry| {
      entry.file_type().is_file()
        && entry.path().extension().is_some_and(|ext| ext == "json")
    })
    .map(walkdir::DirEntry::into_path)
    .collect();
  files.sort();
  files
}

/// Read every record under `input_dir`. Files that fail to parse are
/// returned separately; they do not stop the build.
///
/// # Errors
///
/// Returns an error if `input_dir` is not a directory.
pub fn read_records(
  input_dir: &Path,
) -> Result<(Vec<DocumentRecord>, Vec<UnreadableRecord>)> {
  if !input_dir.is_dir() {
    bail!("Input directory does not exist: {}", input_dir.display());
  }

  let files = collect_record_files(input_dir);
  info!("Found {} document records in {}", files.len(), input_dir.display());

  let mut records = Vec::with_capacity(files.len());
  let mut unreadable = Vec::new();
  for path in files {
    let parsed = fs::read_to_string(&path)
      .map_err(|e| e.to_string())
      .and_then(|content| {
        serde_json::from_str::<DocumentRecord>(&content).map_err(|e| e.to_string())
      });
    match parsed {
      Ok(record) => records.push(record),
      Err(reason) => {
        warn!("Skipping unreadable record {}: {reason}", path.display());
        unreadable.push(UnreadableRecord { path, reason });
      },
    }
  }
  Ok((records, unreadable))
}

/// Read and concatenate the configured redirect lists.
///
/// # Errors
///
/// Returns an error if a list cannot be read or has a malformed line.
pub fn read_redirects(config: &Config) -> Result<Vec<quire_engine::Redirect>> {
  let mut redirects = Vec::new();
  for path in &config.redirects {
    let content = fs::read_to_string(path).wrap_err_with(|| {
      format!("Failed to read redirect list: {}", path.display())
    })?;
    let parsed = parse_redirects(&content).wrap_err_with(|| {
      format!("Failed to parse redirect list: {}", path.display())
    })?;
    debug!("{} redirects in {}", parsed.len(), path.display());
    redirects.extend(parsed);
  }
  Ok(redirects)
}

/// Index entries for every record: the document itself, with its heading
/// ids, and one file entry per attachment.
///
/// Records with an invalid URL are left out; building them fails later and
/// is reported there. Records whose content cannot be normalized are still
/// indexed, only without anchors.
#[must_use]
pub fn corpus_entries(records: &[DocumentRecord]) -> Vec<CorpusEntry> {
  let mut entries = Vec::with_capacity(records.len());
  for record in records {
    let source = &record.source;
    let url = source.mdn_url.trim().trim_end_matches('/');
    match corpus_entry(source) {
      Ok(entry) => entries.push(entry),
      Err(BuildError::InvalidDocumentUrl { .. }) => continue,
      Err(e) => {
        warn!("Indexing {url} without anchors: {e}");
        entries.push(CorpusEntry::document(url, &source.title));
      },
    }
    entries.extend(
      record
        .attachments
        .iter()
        .map(|name| CorpusEntry::file(&format!("{url}/{}", name.trim_start_matches('/')))),
    );
  }
  entries
}

/// Phase one: build the index every document is resolved against.
///
/// # Errors
///
/// Returns an error if the redirect lists cannot be read or the index cannot
/// be built. Either is fatal for the whole run.
pub fn build_index(config: &Config, records: &[DocumentRecord]) -> Result<UrlIndex> {
  let redirects = read_redirects(config)?;
  let index = UrlIndex::build(
    corpus_entries(records),
    redirects,
    config.max_redirect_hops,
  )
  .wrap_err("Failed to build the URL index")?;
  info!(
    "Indexed {} URLs and {} redirects",
    index.len(),
    index.redirect_count()
  );
  Ok(index)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]

  use quire_engine::EntryKind;

  use super::*;

  fn record(json: &str) -> DocumentRecord {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn test_record_flattens_source() {
    let record = record(
      r#"{
        "mdn_url": "/en-US/docs/Web/Linked_to",
        "title": "Linked to",
        "html": "<h2>Usage</h2>",
        "attachments": ["dino.svg"]
      }"#,
    );
    assert_eq!(record.source.mdn_url, "/en-US/docs/Web/Linked_to");
    assert_eq!(record.source.filename, "index.md");
    assert_eq!(record.attachments, vec!["dino.svg"]);
  }

  #[test]
  fn test_corpus_entries() {
    let records = vec![
      record(
        r#"{ "mdn_url": "/en-US/docs/Web/Linked_to/", "title": "Linked to",
             "html": "<h2>Usage</h2>", "attachments": ["dino.svg"] }"#,
      ),
      record(r#"{ "mdn_url": "/en-US/Web/Nowhere", "title": "x", "html": "" }"#),
      record(
        r#"{ "mdn_url": "/en-US/docs/Web/Broken", "title": "Broken",
             "html": "<p data-sourcepos=\"x\">a</p>" }"#,
      ),
    ];
    let entries = corpus_entries(&records);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].anchors, Some(vec!["usage".to_string()]));
    assert_eq!(entries[1].url, "/en-US/docs/Web/Linked_to/dino.svg");
    assert_eq!(entries[1].kind, EntryKind::File);
    assert_eq!(entries[2].url, "/en-US/docs/Web/Broken");
    assert_eq!(entries[2].anchors, None);
  }
}

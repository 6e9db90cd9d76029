//! The two-phase batch build: index the whole corpus, then resolve, render
//! and write every document in parallel.
use std::fs;

use color_eyre::eyre::{Context, Result, bail};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, info};
use quire_config::Config;
use quire_engine::{Engine, Flaws};
use quire_html::{render, write_document};
use rayon::prelude::*;

use crate::{
  corpus::{DocumentRecord, build_index, read_records},
  report::{BuildReport, Failure},
};

/// Run a full build as configured.
///
/// Failures of single documents end up in the report; only problems that
/// make every document unbuildable are returned as errors.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the input directory
/// cannot be read, the index cannot be built, localization strings cannot be
/// loaded or the output directory cannot be created.
pub fn build(config: &Config) -> Result<BuildReport> {
  config.validate().wrap_err("Invalid configuration")?;
  let Some(input_dir) = &config.input_dir else {
    bail!("An input directory must be provided");
  };

  let (records, unreadable) = read_records(input_dir)?;
  let index = build_index(config, &records)?;
  let l10n = config
    .load_localization()
    .wrap_err("Failed to load localization strings")?;
  let options = config.engine_options();
  let engine = Engine::new(&index, &options, &l10n);

  fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
    format!(
      "Failed to create output directory: {}",
      config.output_dir.display()
    )
  })?;

  let thread_count = config.jobs.unwrap_or_else(num_cpus::get).max(1);
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(thread_count)
    .build()
    .wrap_err("Failed to start the worker pool")?;
  debug!("Resolving documents on {thread_count} threads");

  let progress = ProgressBar::new(records.len() as u64).with_style(
    ProgressStyle::with_template("{spinner} [{elapsed}] {bar:40} {pos}/{len} documents")?,
  );
  let outcomes: Vec<Result<Flaws, Failure>> = pool.install(|| {
    records
      .par_iter()
      .progress_with(progress.clone())
      .map(|record| build_one(config, &engine, record))
      .collect()
  });
  progress.finish_and_clear();

  let mut report = BuildReport {
    documents: records.len() + unreadable.len(),
    output_dir: config.output_dir.clone(),
    ..BuildReport::default()
  };
  for record in unreadable {
    report.fail(record.path.display().to_string(), record.reason);
  }
  for outcome in outcomes {
    match outcome {
      Ok(flaws) => report.record(&flaws),
      Err(failure) => report.failures.push(failure),
    }
  }
  info!("Resolved {} documents", report.written);
  Ok(report)
}

/// Build, render and write one document.
fn build_one(
  config: &Config,
  engine: &Engine<'_>,
  record: &DocumentRecord,
) -> Result<Flaws, Failure> {
  let document = engine.build_with_recovery(&record.source).map_err(|e| {
    Failure {
      source: e.url().to_string(),
      reason: e.to_string(),
    }
  })?;

  for flaw in document
    .flaws
    .broken_links
    .iter()
    .chain(&document.flaws.images)
    .chain(&document.flaws.sectioning)
  {
    debug!(
      "{} {}:{} [{}] {} ({})",
      document.mdn_url,
      flaw.line,
      flaw.column,
      flaw.id,
      flaw.explanation,
      flaw.target_value()
    );
  }

  let written = render(config, &document)
    .and_then(|html| write_document(&config.output_dir, &document, &html));
  match written {
    Ok(_) => Ok(document.flaws),
    Err(e) => {
      Err(Failure {
        source: document.mdn_url.clone(),
        reason: format!("{e:#}"),
      })
    },
  }
}

use std::fs;

use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info};
use quire::{
  builder,
  cli::{Cli, Commands},
};
use quire_config::Config;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  match &cli.command {
    Commands::Init {
      output,
      format,
      force,
    } => {
      if output.exists() && !force {
        bail!(
          "Configuration file already exists: {}. Use --force to overwrite.",
          output.display()
        );
      }

      if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
      {
        fs::create_dir_all(parent).wrap_err_with(|| {
          format!("Failed to create directory: {}", parent.display())
        })?;
        info!("Created directory: {}", parent.display());
      }

      Config::generate_default_config(format, output).wrap_err_with(|| {
        format!("Failed to generate configuration file: {}", output.display())
      })?;
      info!("Configuration file created. Edit it to point at your corpus.");
      Ok(())
    },

    Commands::Build {
      input_dir,
      redirects,
      output_dir,
      jobs,
    } => {
      let mut config = Config::load(&cli.config_files, &cli.config_overrides)?;
      if let Some(input_dir) = input_dir {
        config.input_dir = Some(input_dir.clone());
      }
      for redirect in redirects {
        if !config.redirects.contains(redirect) {
          config.redirects.push(redirect.clone());
        }
      }
      if let Some(output_dir) = output_dir {
        config.output_dir.clone_from(output_dir);
      }
      if jobs.is_some() {
        config.jobs = *jobs;
      }

      let report = builder::build(&config)?;
      report.log();
      if !report.is_success() {
        bail!("{} documents failed to build", report.failures.len());
      }
      Ok(())
    },
  }
}

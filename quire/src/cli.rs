use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for quire
#[derive(Parser, Debug)]
#[command(author, version, about = "quire: link checking and page building for localized docs")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times). Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", global = true, action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the quire CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new quire configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "quire.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Resolve every document of a corpus and write pages and records.
  Build {
    /// Directory containing the expanded document records (*.json).
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Redirect list in `from<TAB>to` format (can be specified multiple
    /// times).
    #[arg(short, long, action = clap::ArgAction::Append)]
    redirects: Vec<PathBuf>,

    /// Output directory for pages and document records.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of threads to use for parallel processing.
    #[arg(short = 'p', long = "jobs")]
    jobs: Option<usize>,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_build_arguments() {
    let cli = Cli::parse_from([
      "quire",
      "build",
      "-i",
      "content",
      "-r",
      "a.txt",
      "--redirects",
      "b.txt",
      "-p",
      "3",
      "--config",
      "site_name=Docs",
      "-v",
    ]);
    assert!(cli.verbose);
    assert_eq!(cli.config_overrides, vec!["site_name=Docs"]);
    let Commands::Build {
      input_dir,
      redirects,
      output_dir,
      jobs,
    } = cli.command
    else {
      panic!("expected the build command");
    };
    assert_eq!(input_dir, Some(PathBuf::from("content")));
    assert_eq!(redirects, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    assert_eq!(output_dir, None);
    assert_eq!(jobs, Some(3));
  }

  #[test]
  fn test_init_rejects_unknown_format() {
    assert!(Cli::try_parse_from(["quire", "init", "-F", "yaml"]).is_err());
  }
}

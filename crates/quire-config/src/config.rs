use std::{
  collections::HashMap,
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use quire_engine::{
  DEFAULT_MAX_REDIRECT_HOPS,
  EngineOptions,
  HttpsPolicy,
  Localization,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ConfigError;

/// Configuration for a quire build.
///
/// [`Config`] holds everything that controls a build: where document records
/// come from and where output goes, the locale and site settings the engine
/// resolves links with, and where localized UI strings live. Fields are
/// usually loaded from a TOML or JSON file and can be overridden with
/// `--config KEY=VALUE` or dedicated CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Directory containing expanded document records.
  pub input_dir: Option<PathBuf>,

  /// Output directory for rendered pages and records.
  pub output_dir: PathBuf,

  /// Redirect lists, read in order.
  pub redirects: Vec<PathBuf>,

  /// Locale every translation falls back to.
  pub default_locale: String,

  /// Appended to page titles.
  pub site_name: String,

  /// Hosts of the site itself.
  pub site_domains: Vec<String>,

  /// Which `http://` hosts get an https suggestion.
  pub https_upgrade: HttpsPolicy,

  /// Longest redirect chain that is still followed.
  pub max_redirect_hops: usize,

  /// Base URL for `source.github_url`.
  pub repository_url: Option<String>,

  /// Localized UI strings: one file, or a directory of per-locale files.
  pub localization: Option<PathBuf>,

  /// Custom page template.
  pub template_path: Option<PathBuf>,

  /// Number of threads to use for parallel processing.
  pub jobs: Option<usize>,

  /// Native locale names for `other_translations`.
  pub locale_names: HashMap<String, String>,
}

impl Default for Config {
  fn default() -> Self {
    let engine = EngineOptions::default();
    Self {
      input_dir:         None,
      output_dir:        PathBuf::from("build"),
      redirects:         Vec::new(),
      default_locale:    engine.default_locale,
      site_name:         engine.site_name,
      site_domains:      engine.site_domains,
      https_upgrade:     engine.https,
      max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
      repository_url:    None,
      localization:      None,
      template_path:     None,
      jobs:              None,
      locale_names:      engine.locale_names,
    }
  }
}

/// Read a TOML or JSON file, picking the parser by extension.
fn read_by_extension<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
  let content = fs::read_to_string(path).map_err(|e| {
    ConfigError::Config(format!(
      "Failed to read config file: {}: {}",
      path.display(),
      e
    ))
  })?;

  match path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_lowercase)
    .as_deref()
  {
    Some("json") => {
      serde_json::from_str(&content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to parse JSON from {}: {}",
          path.display(),
          e
        ))
      })
    },
    Some("toml") => {
      toml::from_str(&content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to parse TOML from {}: {}",
          path.display(),
          e
        ))
      })
    },
    Some(_) => {
      Err(ConfigError::Config(format!(
        "Unsupported config file format: {}",
        path.display()
      )))
    },
    None => {
      Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )))
    },
  }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" => Ok(true),
    "false" | "no" | "0" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean value for '{key}': '{value}'. Expected true/false, \
         yes/no, or 1/0"
      )))
    },
  }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
  value.parse().map_err(|_| {
    ConfigError::Config(format!("Invalid value for '{key}': '{value}'"))
  })
}

fn parse_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(ToString::to_string)
    .collect()
}

/// `None` for an empty value, so overrides can unset optional fields.
fn optional(value: &str) -> Option<String> {
  (!value.is_empty()).then(|| value.to_string())
}

impl Config {
  /// Load configuration from a TOML or JSON file.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    read_by_extension(path.as_ref())
  }

  /// Load configuration from the given files (merged in order) or from a
  /// discovered config file, then apply `KEY=VALUE` overrides.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged = Self::from_file(first).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          first.display(),
          e
        ))
      })?;

      for config_path in rest {
        let additional = Self::from_file(config_path).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
          ))
        })?;
        merged.merge(additional);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }
      merged
    } else if let Some(discovered) = Self::find_config_file() {
      log::info!("Using discovered config file: {}", discovered.display());
      Self::from_file(&discovered).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load discovered config from {}: {}",
          discovered.display(),
          e
        ))
      })?
    } else {
      Self::default()
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    Ok(config)
  }

  /// Apply configuration overrides from `KEY=VALUE` strings.
  ///
  /// List-valued keys take comma-separated values. An empty value unsets an
  /// optional key.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not `KEY=VALUE`, the key is unknown,
  /// or the value cannot be parsed.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
      "input_dir" => self.input_dir = optional(value).map(PathBuf::from),
      "output_dir" => self.output_dir = PathBuf::from(value),
      "redirects" => {
        self.redirects = parse_list(value).into_iter().map(PathBuf::from).collect();
      },
      "default_locale" => self.default_locale = value.to_string(),
      "site_name" => self.site_name = value.to_string(),
      "site_domains" => self.site_domains = parse_list(value),
      "https_upgrade.hosts" => self.https_upgrade.hosts = parse_list(value),
      "https_upgrade.include_subdomains" => {
        self.https_upgrade.include_subdomains = parse_bool(key, value)?;
      },
      "max_redirect_hops" => self.max_redirect_hops = parse_usize(key, value)?,
      "repository_url" => self.repository_url = optional(value),
      "localization" => self.localization = optional(value).map(PathBuf::from),
      "template_path" => self.template_path = optional(value).map(PathBuf::from),
      "jobs" => {
        self.jobs = optional(value)
          .map(|jobs| parse_usize(key, &jobs))
          .transpose()?;
      },
      _ => {
        if let Some(locale) = key.strip_prefix("locale_names.") {
          self
            .locale_names
            .insert(locale.to_string(), value.to_string());
        } else {
          return Err(ConfigError::Config(format!(
            "Unknown configuration key: '{key}'. See documentation for \
             supported keys."
          )));
        }
      },
    }
    Ok(())
  }

  /// Merge another config into this one, with the other config's values
  /// taking precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: other's [`Some`] value replaces this value
  /// - [`Vec<T>`] fields: other's entries are appended, skipping duplicates
  /// - [`HashMap`] fields: other's entries are merged in
  /// - Plain fields: other's value replaces this one unless it is the default
  pub fn merge(&mut self, other: Self) {
    let defaults = Self::default();

    if other.input_dir.is_some() {
      self.input_dir = other.input_dir;
    }
    if other.output_dir != defaults.output_dir {
      self.output_dir = other.output_dir;
    }
    for redirect in other.redirects {
      if !self.redirects.contains(&redirect) {
        self.redirects.push(redirect);
      }
    }
    if other.default_locale != defaults.default_locale {
      self.default_locale = other.default_locale;
    }
    if other.site_name != defaults.site_name {
      self.site_name = other.site_name;
    }
    for domain in other.site_domains {
      if !self.site_domains.contains(&domain) {
        self.site_domains.push(domain);
      }
    }
    if other.https_upgrade != defaults.https_upgrade {
      self.https_upgrade = other.https_upgrade;
    }
    if other.max_redirect_hops != defaults.max_redirect_hops {
      self.max_redirect_hops = other.max_redirect_hops;
    }
    if other.repository_url.is_some() {
      self.repository_url = other.repository_url;
    }
    if other.localization.is_some() {
      self.localization = other.localization;
    }
    if other.template_path.is_some() {
      self.template_path = other.template_path;
    }
    if other.jobs.is_some() {
      self.jobs = other.jobs;
    }
    self.locale_names.extend(other.locale_names);
  }

  /// Check that the configuration can drive a build.
  ///
  /// # Errors
  ///
  /// Returns an error listing every problem found.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    match &self.input_dir {
      None => errors.push("An input directory must be provided".to_string()),
      Some(dir) if !dir.is_dir() => {
        errors.push(format!("Input directory does not exist: {}", dir.display()));
      },
      Some(_) => {},
    }
    for redirect in &self.redirects {
      if !redirect.is_file() {
        errors.push(format!("Redirect file does not exist: {}", redirect.display()));
      }
    }
    if let Some(path) = &self.localization
      && !path.exists()
    {
      errors.push(format!("Localization path does not exist: {}", path.display()));
    }
    if let Some(path) = &self.template_path
      && !path.is_file()
    {
      errors.push(format!("Template file does not exist: {}", path.display()));
    }
    if self.default_locale.trim().is_empty() {
      errors.push("default_locale must not be empty".to_string());
    }
    if self.max_redirect_hops == 0 {
      errors.push("max_redirect_hops must be at least 1".to_string());
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(ConfigError::Config(errors.join("\n")))
    }
  }

  /// Engine options derived from this configuration.
  #[must_use]
  pub fn engine_options(&self) -> EngineOptions {
    let mut locale_names = EngineOptions::default().locale_names;
    locale_names.extend(self.locale_names.clone());
    EngineOptions {
      default_locale: self.default_locale.clone(),
      site_name: self.site_name.clone(),
      site_domains: self.site_domains.clone(),
      https: self.https_upgrade.clone(),
      max_redirect_hops: self.max_redirect_hops,
      repository_url: self.repository_url.clone(),
      locale_names,
    }
  }

  /// Load the localized UI strings, if configured.
  ///
  /// A file holds `locale -> key -> string` tables. A directory holds one
  /// `<locale>.toml` or `<locale>.json` file of `key -> string` per locale.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be read or parsed.
  pub fn load_localization(&self) -> Result<Localization, ConfigError> {
    let Some(path) = &self.localization else {
      return Ok(Localization::new());
    };

    if !path.is_dir() {
      let l10n: Localization = read_by_extension(path)?;
      log::debug!(
        "Loaded strings for {} locales from {}",
        l10n.locales().len(),
        path.display()
      );
      return Ok(l10n);
    }

    let mut entries = fs::read_dir(path)?
      .filter_map(Result::ok)
      .map(|entry| entry.path())
      .filter(|file| {
        file
          .extension()
          .and_then(|ext| ext.to_str())
          .is_some_and(|ext| matches!(ext, "toml" | "json"))
      })
      .collect::<Vec<_>>();
    entries.sort();

    let mut l10n = Localization::new();
    for file in entries {
      let Some(locale) = file.file_stem().and_then(|stem| stem.to_str()) else {
        continue;
      };
      let table: HashMap<String, String> = read_by_extension(&file)?;
      for (key, value) in &table {
        l10n.insert(locale, key, value);
      }
    }
    log::debug!(
      "Loaded strings for {} locales from {}",
      l10n.locales().len(),
      path.display()
    );
    Ok(l10n)
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "quire.toml",
          "quire.json",
          ".quire.toml",
          ".quire.json",
          ".config/quire.toml",
          ".config/quire.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let xdg_config_dir = PathBuf::from(xdg_config_home);
          for filename in &["quire.toml", "quire.json"] {
            let config_path = xdg_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        None
      })
      .clone()
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

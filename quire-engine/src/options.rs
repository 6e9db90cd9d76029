//! Options controlling how documents are resolved and assembled.
use std::{collections::HashMap, net::IpAddr};

use serde::{Deserialize, Serialize};

use crate::index::DEFAULT_MAX_REDIRECT_HOPS;

/// Which `http://` hosts get the "can become https://" suggestion.
///
/// An allowlist rather than a heuristic: a host is upgradeable when it is
/// listed, or when `include_subdomains` is set and it is a subdomain of a
/// listed host. The site's own domains count as listed, which matters for
/// images; links to the own site are turned into relative paths instead of
/// being upgraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpsPolicy {
  pub hosts:              Vec<String>,
  pub include_subdomains: bool,
}

impl Default for HttpsPolicy {
  fn default() -> Self {
    Self {
      hosts:              [
        "www.mozilla.org",
        "mozilla.org",
        "github.com",
        "www.w3.org",
        "w3c.github.io",
        "tc39.es",
        "en.wikipedia.org",
      ]
      .iter()
      .map(ToString::to_string)
      .collect(),
      include_subdomains: false,
    }
  }
}

impl HttpsPolicy {
  /// Whether `host` is known to serve https.
  #[must_use]
  pub fn is_upgradeable(&self, host: &str, site_domains: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_lowercase();
    if host == "localhost" || host.parse::<IpAddr>().is_ok() {
      return false;
    }
    site_domains.iter().chain(&self.hosts).any(|known| {
      let known = known.to_lowercase();
      host == known
        || (self.include_subdomains && host.ends_with(&format!(".{known}")))
    })
  }
}

/// Configuration for the engine. Usually built from the user-facing config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
  /// Locale every translation falls back to.
  pub default_locale:    String,
  /// Appended to page titles.
  pub site_name:         String,
  /// Hosts of the site itself; absolute links to them should be relative.
  pub site_domains:      Vec<String>,
  pub https:             HttpsPolicy,
  pub max_redirect_hops: usize,
  /// Base for `source.github_url`, e.g. a repository's tree URL.
  pub repository_url:    Option<String>,
  /// Native names of locales, for `other_translations`.
  pub locale_names:      HashMap<String, String>,
}

impl Default for EngineOptions {
  fn default() -> Self {
    Self {
      default_locale:    "en-US".to_string(),
      site_name:         "MDN".to_string(),
      site_domains:      vec!["developer.mozilla.org".to_string()],
      https:             HttpsPolicy::default(),
      max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
      repository_url:    None,
      locale_names:      default_locale_names(),
    }
  }
}

impl EngineOptions {
  /// Whether `locale` is the default locale (compared case-insensitively).
  #[must_use]
  pub fn is_default_locale(&self, locale: &str) -> bool {
    locale.eq_ignore_ascii_case(&self.default_locale)
  }

  /// Whether `host` belongs to the site itself.
  #[must_use]
  pub fn is_site_domain(&self, host: &str) -> bool {
    self
      .site_domains
      .iter()
      .any(|domain| domain.eq_ignore_ascii_case(host))
  }

  /// Native name of a locale, or the locale code when unknown.
  #[must_use]
  pub fn native_name(&self, locale: &str) -> String {
    self
      .locale_names
      .iter()
      .find(|(code, _)| code.eq_ignore_ascii_case(locale))
      .map_or_else(|| locale.to_string(), |(_, name)| name.clone())
  }
}

fn default_locale_names() -> HashMap<String, String> {
  [
    ("de", "Deutsch"),
    ("en-US", "English (US)"),
    ("es", "Español"),
    ("fr", "Français"),
    ("ja", "日本語"),
    ("ko", "한국어"),
    ("pt-BR", "Português (do Brasil)"),
    ("ru", "Русский"),
    ("zh-CN", "中文 (简体)"),
    ("zh-TW", "正體中文 (繁體)"),
  ]
  .iter()
  .map(|(code, name)| ((*code).to_string(), (*name).to_string()))
  .collect()
}

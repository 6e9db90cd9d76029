use thiserror::Error;

/// Errors from looking up an embedded config template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  #[error("Unsupported config format: {0}")]
  UnsupportedFormat(String),
}

/// Default configuration in TOML, with a comment on every field so that a
/// fresh `quire init` explains itself.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# quire configuration file

# Directory containing the expanded document records (*.json)
input_dir = "content"

# Output directory for rendered pages and document records
output_dir = "build"

# Redirect lists in `from<TAB>to` format
# redirects = ["content/_redirects.txt"]

# Locale that every translation falls back to
default_locale = "en-US"

# Appended to every page title
site_name = "MDN"

# Hosts of the site itself; absolute links to them are flagged as such
site_domains = ["developer.mozilla.org"]

# Longest redirect chain that is still followed
max_redirect_hops = 16

# Base URL for "edit this page" links, e.g. a repository's tree URL
# repository_url = "https://github.com/mdn/content/blob/main/files"

# Localized UI strings: a single TOML/JSON file of locale -> key -> string,
# or a directory of <locale>.toml / <locale>.json files
# localization = "l10n"

# Custom page template (tera)
# template_path = "templates/document.html"

# Number of threads to use (defaults to the number of CPU cores)
# jobs = 4

# Hosts whose http:// links should be https://
[https_upgrade]
hosts = [
  "www.mozilla.org",
  "mozilla.org",
  "github.com",
  "www.w3.org",
  "w3c.github.io",
  "tc39.es",
  "en.wikipedia.org",
]
include_subdomains = false

# Native names of locales, used for `other_translations`
[locale_names]
de = "Deutsch"
en-US = "English (US)"
es = "Español"
fr = "Français"
ja = "日本語"
ko = "한국어"
pt-BR = "Português (do Brasil)"
ru = "Русский"
zh-CN = "中文 (简体)"
zh-TW = "正體中文 (繁體)"
"#;

/// Default configuration in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "input_dir": "content",
  "output_dir": "build",
  "redirects": [],
  "default_locale": "en-US",
  "site_name": "MDN",
  "site_domains": ["developer.mozilla.org"],
  "max_redirect_hops": 16,
  "https_upgrade": {
    "hosts": [
      "www.mozilla.org",
      "mozilla.org",
      "github.com",
      "www.w3.org",
      "w3c.github.io",
      "tc39.es",
      "en.wikipedia.org"
    ],
    "include_subdomains": false
  },
  "locale_names": {
    "en-US": "English (US)",
    "fr": "Français",
    "ja": "日本語"
  }
}
"#;

/// Get the configuration template for `format` (`toml` or `json`).
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}

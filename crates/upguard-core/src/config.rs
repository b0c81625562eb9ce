//! Configuration for the upload guard and the request sanitizer.
//!
//! Loaded once at startup (usually from a TOML file) and passed by
//! reference into request-scoped validators. Nothing here is mutated while
//! requests are being served.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::GuardError;
use crate::Result;

/// Ordered set of lower-case file-type tokens forbidden inside archives.
///
/// Parsed from a comma-separated list such as `exe,sh,bat`. Tokens are
/// trimmed, lower-cased and stripped of a leading dot; blanks and duplicates
/// are dropped.
///
/// # Examples
///
/// ```
/// use upguard_core::Denylist;
///
/// let denied: Denylist = "EXE, .sh,,bat".parse().unwrap();
/// assert!(denied.contains("exe"));
/// assert!(denied.contains("SH"));
/// assert_eq!(denied.to_string(), "exe,sh,bat");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    tokens: Vec<String>,
}

impl Denylist {
    /// Returns `true` if `file_type` is denied. Case-insensitive.
    #[must_use]
    pub fn contains(&self, file_type: &str) -> bool {
        self.tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(file_type))
    }

    /// Returns `true` if nothing is denied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromStr for Denylist {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut tokens: Vec<String> = Vec::new();
        for raw in s.split(',') {
            let token = raw.trim().trim_start_matches('.').to_ascii_lowercase();
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Ok(Self { tokens })
    }
}

impl fmt::Display for Denylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(","))
    }
}

impl<'de> Deserialize<'de> for Denylist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(list) = raw.parse::<Self>();
        Ok(list)
    }
}

impl Serialize for Denylist {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// What to do when a single archive entry cannot be read or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryErrorPolicy {
    /// Reject the upload on the first entry error.
    #[default]
    FailFast,
    /// Log the error, skip the entry and keep going.
    ///
    /// A corrupt entry is never scanned, so a denied file hidden behind a
    /// damaged header passes unnoticed under this policy.
    BestEffort,
}

/// Upload archive guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Types denied on every upload route.
    pub denied: Denylist,

    /// Types denied on the web-facing route. Falls back to `denied`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_denied: Option<Denylist>,

    /// Entry error handling during extraction.
    pub entry_errors: EntryErrorPolicy,

    /// Maximum number of archive entries.
    pub max_entries: usize,

    /// Maximum size of a single extracted entry in bytes.
    pub max_file_size: u64,

    /// Maximum total extracted size in bytes.
    pub max_total_size: u64,

    /// Maximum per-entry compression ratio (uncompressed / compressed).
    pub max_compression_ratio: f64,

    /// Extraction deadline in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_timeout_ms: Option<u64>,

    /// Directory under which scratch workspaces are created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<PathBuf>,
}

impl Default for UploadConfig {
    /// Default values:
    /// - `denied`: `exe,sh,bat`
    /// - `entry_errors`: fail-fast
    /// - `max_entries`: 10,000
    /// - `max_file_size`: 50 MB
    /// - `max_total_size`: 500 MB
    /// - `max_compression_ratio`: 100.0
    /// - `extraction_timeout_ms`: 30 s
    fn default() -> Self {
        Self {
            denied: Denylist {
                tokens: vec!["exe".into(), "sh".into(), "bat".into()],
            },
            web_denied: None,
            entry_errors: EntryErrorPolicy::FailFast,
            max_entries: 10_000,
            max_file_size: 50 * 1024 * 1024,   // 50 MB
            max_total_size: 500 * 1024 * 1024, // 500 MB
            max_compression_ratio: 100.0,
            extraction_timeout_ms: Some(30_000),
            temp_root: None,
        }
    }
}

impl UploadConfig {
    /// Returns the denylist applied to `route`.
    #[must_use]
    pub fn denylist(&self, route: UploadRoute) -> &Denylist {
        match (route, &self.web_denied) {
            (UploadRoute::Web, Some(web)) => web,
            _ => &self.denied,
        }
    }

    /// Returns the extraction deadline, if any.
    #[must_use]
    pub fn extraction_timeout(&self) -> Option<Duration> {
        self.extraction_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the directory scratch workspaces are created under.
    #[must_use]
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Which upload endpoint family a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadRoute {
    /// Administrative upload endpoints.
    Manage,
    /// Public, web-facing upload endpoints.
    Web,
}

impl fmt::Display for UploadRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manage => f.write_str("manage"),
            Self::Web => f.write_str("web"),
        }
    }
}

/// Whether the sanitizer rejects modified values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SanitizeMode {
    /// Reject values the cleaner would change.
    #[default]
    Enforce,
    /// Return every value unchanged. Only for rolling out to legacy
    /// deployments that relied on the disabled filter.
    PassThrough,
}

/// Request sanitizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizePolicy {
    /// Enforcement mode.
    pub mode: SanitizeMode,

    /// Markup tags a value may carry.
    pub allowed_tags: Vec<String>,

    /// Attributes allowed on any permitted tag.
    pub allowed_attributes: Vec<String>,

    /// Parameters that carry markup and bypass cleaning.
    pub raw_html_names: Vec<String>,

    /// Parameter name suffix marking raw-markup fields.
    pub raw_html_suffix: String,

    /// Run the SQL injection heuristic on parameter values.
    pub sql_check: bool,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            mode: SanitizeMode::Enforce,
            allowed_tags: Vec::new(),
            allowed_attributes: Vec::new(),
            raw_html_names: vec!["content".to_string()],
            raw_html_suffix: "WithHtml".to_string(),
            sql_check: true,
        }
    }
}

impl SanitizePolicy {
    /// Returns `true` if parameter `name` may carry raw markup.
    #[must_use]
    pub fn is_raw_html(&self, name: &str) -> bool {
        self.raw_html_names.iter().any(|raw| raw == name)
            || (!self.raw_html_suffix.is_empty() && name.ends_with(&self.raw_html_suffix))
    }
}

/// Complete process-wide configuration.
///
/// # Examples
///
/// ```
/// use upguard_core::Config;
/// use upguard_core::config::UploadRoute;
///
/// let config = Config::from_toml_str(
///     r#"
///     [upload]
///     denied = "exe,bat"
///     web_denied = "exe,bat,html"
///     "#,
/// )
/// .unwrap();
/// assert!(config.upload.denylist(UploadRoute::Web).contains("html"));
/// assert!(!config.upload.denylist(UploadRoute::Manage).contains("html"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Upload archive guard settings.
    pub upload: UploadConfig,
    /// Request sanitizer settings.
    pub sanitize: SanitizePolicy,
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| GuardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            denied = %config.upload.denied,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Renders the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GuardError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.upload.max_entries == 0 {
            return Err(GuardError::Config("upload.max_entries must be > 0".into()));
        }
        if !(self.upload.max_compression_ratio.is_finite()
            && self.upload.max_compression_ratio >= 1.0)
        {
            return Err(GuardError::Config(
                "upload.max_compression_ratio must be >= 1".into(),
            ));
        }
        if self.upload.max_file_size > self.upload.max_total_size {
            return Err(GuardError::Config(
                "upload.max_file_size exceeds upload.max_total_size".into(),
            ));
        }
        if let Some(tag) = self
            .sanitize
            .allowed_tags
            .iter()
            .find(|t| t.eq_ignore_ascii_case("script") || t.eq_ignore_ascii_case("style"))
        {
            return Err(GuardError::Config(format!(
                "sanitize.allowed_tags may not contain `{tag}`"
            )));
        }
        Ok(())
    }
}

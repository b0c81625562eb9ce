//! Markup and injection checks for request values.
//!
//! A value is run through an `ammonia` cleaner built from the
//! [`SanitizePolicy`]. The entities the cleaner escaped are turned back
//! into characters and the result is compared with the input: any
//! difference means the value carried markup the policy does not allow.
//! In [`SanitizeMode::Enforce`] such values are rejected, never rewritten.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder;
use regex::RegexSet;

use crate::GuardError;
use crate::Result;
use crate::config::SanitizeMode;
use crate::config::SanitizePolicy;

/// Tags whose contents are dropped along with the tag.
const CONTENT_TAGS: [&str; 2] = ["script", "style"];

#[allow(clippy::expect_used)] // Static patterns are hardcoded and valid
static SQL_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bunion\b[\s\S]*\bselect\b",
        r"(?i)\b(drop|truncate|alter)\s+table\b",
        r"(?i)\binsert\s+into\b",
        r"(?i)\bdelete\s+from\b",
        r#"(?i)'\s*(or|and)\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#,
        r"(?i);\s*(exec|execute|shutdown|declare)\b",
        r"(?i)\b(sleep|benchmark|pg_sleep)\s*\(",
        r"(?i)\bwaitfor\s+delay\b",
        r"'\s*(--|#|/\*)",
    ])
    .expect("SQL patterns are valid")
});

/// Returns `true` if `value` looks like a SQL injection attempt.
///
/// # Examples
///
/// ```
/// use upguard_core::sanitize::looks_like_sql_injection;
///
/// assert!(looks_like_sql_injection("1' OR '1'='1"));
/// assert!(looks_like_sql_injection("x; DROP TABLE users"));
/// assert!(!looks_like_sql_injection("Drop by the table tomorrow"));
/// ```
#[must_use]
pub fn looks_like_sql_injection(value: &str) -> bool {
    SQL_PATTERNS.is_match(value)
}

/// Checks request values against a [`SanitizePolicy`].
///
/// The markup cleaner is built once from the policy and reused for every
/// value, so one `Cleaner` is meant to live as long as the configuration.
///
/// # Examples
///
/// ```
/// use upguard_core::config::SanitizePolicy;
/// use upguard_core::sanitize::Cleaner;
///
/// let policy = SanitizePolicy::default();
/// let cleaner = Cleaner::new(&policy);
///
/// let title = cleaner.clean_parameter("/cms/save.do", "title", "Tom & Jerry").unwrap();
/// assert_eq!(title, "Tom & Jerry");
/// let err = cleaner
///     .clean_parameter("/cms/save.do", "title", "<img src=x onerror=alert(1)>")
///     .unwrap_err();
/// assert_eq!(err.to_string(), "parameter invalid, url: /cms/save.do");
/// ```
pub struct Cleaner<'p> {
    policy: &'p SanitizePolicy,
    builder: Builder<'p>,
}

impl<'p> Cleaner<'p> {
    /// Builds the markup cleaner for `policy`.
    #[must_use]
    pub fn new(policy: &'p SanitizePolicy) -> Self {
        // ammonia panics when a tag is both allowed and content-stripped
        let tags: HashSet<&'p str> = policy
            .allowed_tags
            .iter()
            .map(String::as_str)
            .filter(|tag| !CONTENT_TAGS.iter().any(|c| c.eq_ignore_ascii_case(tag)))
            .collect();
        let attributes: HashSet<&'p str> = policy
            .allowed_attributes
            .iter()
            .map(String::as_str)
            .collect();

        let mut builder = Builder::empty();
        builder
            .tags(tags)
            .generic_attributes(attributes)
            .clean_content_tags(CONTENT_TAGS.into_iter().collect())
            .link_rel(None);
        Self { policy, builder }
    }

    /// Returns the policy in effect.
    #[must_use]
    pub fn policy(&self) -> &'p SanitizePolicy {
        self.policy
    }

    /// Returns what the markup cleaner makes of `value`, entities unescaped.
    #[must_use]
    pub fn cleaned(&self, value: &str) -> String {
        unescape_entities(&self.builder.clean(value).to_string())
    }

    /// Checks a parameter or header name of the request at `path`.
    ///
    /// # Errors
    ///
    /// `GuardError::InvalidParameter` if the cleaner would modify `name`.
    pub fn clean_name(&self, path: &str, name: &str) -> Result<String> {
        self.check(path, name, name, false)
    }

    /// Checks a header value. Headers skip the SQL heuristic.
    ///
    /// # Errors
    ///
    /// `GuardError::InvalidParameter` if the cleaner would modify `value`.
    pub fn clean_header(&self, path: &str, name: &str, value: &str) -> Result<String> {
        self.check(path, name, value, false)
    }

    /// Checks a parameter value, SQL heuristic included when enabled.
    ///
    /// # Errors
    ///
    /// `GuardError::InvalidParameter` if the cleaner would modify `value`
    /// or the SQL heuristic matches.
    pub fn clean_parameter(&self, path: &str, name: &str, value: &str) -> Result<String> {
        self.check(path, name, value, self.policy.sql_check)
    }

    /// Checks a raw request body as one text value.
    ///
    /// Invalid UTF-8 is decoded lossily. In enforce mode such a body is
    /// rejected outright, since no cleaned text reproduces its bytes.
    ///
    /// # Errors
    ///
    /// `GuardError::InvalidParameter` if the body is not valid UTF-8 or the
    /// cleaner would modify it.
    pub fn clean_body(&self, path: &str, body: &[u8]) -> Result<String> {
        let text = String::from_utf8_lossy(body);
        if self.policy.mode == SanitizeMode::Enforce && matches!(text, Cow::Owned(_)) {
            tracing::warn!(path, "request body is not valid UTF-8");
            return Err(rejection(path));
        }
        self.check(path, "<body>", &text, false)
    }

    fn check(&self, path: &str, name: &str, value: &str, sql_check: bool) -> Result<String> {
        if self.policy.mode == SanitizeMode::PassThrough {
            return Ok(value.to_string());
        }

        // the HTML parser folds CR and CRLF into LF
        let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
        if self.cleaned(value) != normalized {
            tracing::warn!(path, parameter = name, "value rejected by markup cleaner");
            return Err(rejection(path));
        }
        if sql_check && looks_like_sql_injection(value) {
            tracing::warn!(path, parameter = name, "value rejected by SQL injection check");
            return Err(rejection(path));
        }
        Ok(value.to_string())
    }
}

impl std::fmt::Debug for Cleaner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleaner")
            .field("policy", self.policy)
            .finish_non_exhaustive()
    }
}

fn rejection(path: &str) -> GuardError {
    GuardError::InvalidParameter {
        path: path.to_string(),
    }
}

/// Reverses the escaping the HTML serializer applies to text.
fn unescape_entities(text: &str) -> String {
    const ENTITIES: [(&str, char); 6] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
        ("&nbsp;", '\u{a0}'),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

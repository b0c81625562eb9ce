//! Request access seam and the sanitizing decorator.
//!
//! [`HttpRequest`] is the narrow view of an inbound request the
//! interceptors need. Web frameworks adapt their own request type to it;
//! [`SimpleRequest`] is an owned implementation used by the CLI and tests.
//! [`SanitizedRequest`] wraps any implementation and checks every value
//! it hands out.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::Result;
use crate::UploadedFile;
use crate::config::SanitizeMode;
use crate::config::SanitizePolicy;
use crate::sanitize::Cleaner;

/// Read access to an inbound HTTP request.
pub trait HttpRequest {
    /// Request method, e.g. `POST`.
    fn method(&self) -> &str;

    /// Request path without the query string.
    fn path(&self) -> &str;

    /// First value of parameter `name`.
    fn parameter(&self, name: &str) -> Result<Option<String>>;

    /// Every value of parameter `name`.
    fn parameter_values(&self, name: &str) -> Result<Option<Vec<String>>>;

    /// All parameters, multi-valued ones joined with `,`.
    fn parameter_map(&self) -> Result<BTreeMap<String, String>>;

    /// Value of header `name`. Lookup is case-insensitive.
    fn header(&self, name: &str) -> Result<Option<String>>;

    /// Raw request body.
    fn body(&self) -> Result<Cow<'_, [u8]>>;

    /// File uploaded with the request, if any.
    fn upload(&self) -> Option<&UploadedFile>;
}

/// Owned in-memory request.
///
/// # Examples
///
/// ```
/// use upguard_core::request::{HttpRequest, SimpleRequest};
///
/// let request = SimpleRequest::new("POST", "/cms/tags/save.do")
///     .with_parameter("tags", "a")
///     .with_parameter("tags", "b")
///     .with_parameter("tags", "c");
///
/// assert_eq!(request.parameter("tags").unwrap().as_deref(), Some("a"));
/// assert_eq!(request.parameter_map().unwrap()["tags"], "a,b,c");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleRequest {
    method: String,
    path: String,
    parameters: BTreeMap<String, Vec<String>>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    upload: Option<UploadedFile>,
}

impl SimpleRequest {
    /// Creates a request without parameters, headers or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Appends a value to parameter `name`.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches an uploaded file.
    #[must_use]
    pub fn with_upload(mut self, upload: UploadedFile) -> Self {
        self.upload = Some(upload);
        self
    }
}

impl HttpRequest for SimpleRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn parameter(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .parameters
            .get(name)
            .and_then(|values| values.first().cloned()))
    }

    fn parameter_values(&self, name: &str) -> Result<Option<Vec<String>>> {
        Ok(self.parameters.get(name).cloned())
    }

    fn parameter_map(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .parameters
            .iter()
            .map(|(name, values)| (name.clone(), values.join(",")))
            .collect())
    }

    fn header(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone()))
    }

    fn body(&self) -> Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(&self.body))
    }

    fn upload(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }
}

/// Decorator that checks every parameter, header and body it returns.
///
/// Method, path and upload are delegated unchanged. Parameters listed as
/// raw-markup fields in the policy bypass the check. Blank values are
/// returned as they are.
///
/// # Examples
///
/// ```
/// use upguard_core::config::SanitizePolicy;
/// use upguard_core::request::{HttpRequest, SanitizedRequest, SimpleRequest};
/// use upguard_core::sanitize::Cleaner;
///
/// let policy = SanitizePolicy::default();
/// let cleaner = Cleaner::new(&policy);
/// let raw = SimpleRequest::new("POST", "/cms/article/save.do")
///     .with_parameter("content", "<p>Hello</p>")
///     .with_parameter("title", "<script>x()</script>");
/// let request = SanitizedRequest::new(&raw, &cleaner);
///
/// assert_eq!(request.parameter("content").unwrap().as_deref(), Some("<p>Hello</p>"));
/// assert!(request.parameter("title").is_err());
/// ```
#[derive(Debug)]
pub struct SanitizedRequest<'a, 'p, R: HttpRequest + ?Sized> {
    inner: &'a R,
    cleaner: &'a Cleaner<'p>,
}

impl<'a, 'p, R: HttpRequest + ?Sized> SanitizedRequest<'a, 'p, R> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: &'a R, cleaner: &'a Cleaner<'p>) -> Self {
        Self { inner, cleaner }
    }

    fn policy(&self) -> &'p SanitizePolicy {
        self.cleaner.policy()
    }

    fn is_multipart(&self) -> Result<bool> {
        Ok(self.inner.header("content-type")?.is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/")
        }))
    }
}

impl<R: HttpRequest + ?Sized> HttpRequest for SanitizedRequest<'_, '_, R> {
    fn method(&self) -> &str {
        self.inner.method()
    }

    fn path(&self) -> &str {
        self.inner.path()
    }

    fn parameter(&self, name: &str) -> Result<Option<String>> {
        if self.policy().is_raw_html(name) {
            return self.inner.parameter(name);
        }
        let path = self.inner.path();
        let name = self.cleaner.clean_name(path, name)?;
        match self.inner.parameter(&name)? {
            Some(value) if !value.trim().is_empty() => {
                self.cleaner.clean_parameter(path, &name, &value).map(Some)
            }
            other => Ok(other),
        }
    }

    fn parameter_values(&self, name: &str) -> Result<Option<Vec<String>>> {
        if self.policy().is_raw_html(name) {
            return self.inner.parameter_values(name);
        }
        let path = self.inner.path();
        let name = self.cleaner.clean_name(path, name)?;
        let Some(values) = self.inner.parameter_values(&name)? else {
            return Ok(None);
        };
        values
            .into_iter()
            .map(|value| {
                if value.trim().is_empty() {
                    Ok(value)
                } else {
                    self.cleaner.clean_parameter(path, &name, &value)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn parameter_map(&self) -> Result<BTreeMap<String, String>> {
        let path = self.inner.path();
        self.inner
            .parameter_map()?
            .into_iter()
            .map(|(name, value)| -> Result<(String, String)> {
                if self.policy().is_raw_html(&name) {
                    return Ok((name, value));
                }
                let name = self.cleaner.clean_name(path, &name)?;
                let value = if value.trim().is_empty() {
                    value
                } else {
                    self.cleaner.clean_parameter(path, &name, &value)?
                };
                Ok((name, value.trim().to_string()))
            })
            .collect()
    }

    fn header(&self, name: &str) -> Result<Option<String>> {
        let path = self.inner.path();
        let name = self.cleaner.clean_name(path, name)?;
        match self.inner.header(&name)? {
            Some(value) if !value.trim().is_empty() => {
                self.cleaner.clean_header(path, &name, &value).map(Some)
            }
            other => Ok(other),
        }
    }

    fn body(&self) -> Result<Cow<'_, [u8]>> {
        let body = self.inner.body()?;
        let pass_through = self.policy().mode == SanitizeMode::PassThrough;
        if body.is_empty() || pass_through || self.is_multipart()? {
            return Ok(body);
        }
        let cleaned = self.cleaner.clean_body(self.inner.path(), &body)?;
        Ok(Cow::Owned(cleaned.into_bytes()))
    }

    fn upload(&self) -> Option<&UploadedFile> {
        self.inner.upload()
    }
}

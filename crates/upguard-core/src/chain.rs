//! Ordered interceptor chain in front of a request handler.
//!
//! Each [`Interceptor`] receives the request and an explicit [`Next`]
//! continuation. It may inspect or wrap the request, short-circuit with an
//! error, or call `next.run(..)` to continue down the chain. [`Chain::run`]
//! turns the final result into the client-visible [`Outcome`].

use std::collections::BTreeSet;

use crate::ArchiveGuard;
use crate::Outcome;
use crate::Result;
use crate::config::SanitizeMode;
use crate::config::SanitizePolicy;
use crate::config::UploadConfig;
use crate::config::UploadRoute;
use crate::request::HttpRequest;
use crate::request::SanitizedRequest;
use crate::sanitize::Cleaner;

/// Terminal request handler.
pub trait Handler {
    /// Handles the request.
    fn handle(&self, request: &dyn HttpRequest) -> Result<Outcome>;
}

impl<F> Handler for F
where
    F: Fn(&dyn HttpRequest) -> Result<Outcome>,
{
    fn handle(&self, request: &dyn HttpRequest) -> Result<Outcome> {
        self(request)
    }
}

/// Middleware step around a handler.
pub trait Interceptor: Send + Sync {
    /// Processes `request`, calling `next.run` to continue.
    fn intercept(&self, request: &dyn HttpRequest, next: Next<'_>) -> Result<Outcome>;
}

/// Remainder of the chain after the current interceptor.
pub struct Next<'a> {
    interceptors: &'a [Box<dyn Interceptor + 'a>],
    handler: &'a dyn Handler,
}

impl Next<'_> {
    /// Runs the next interceptor, or the handler once none are left.
    pub fn run(self, request: &dyn HttpRequest) -> Result<Outcome> {
        match self.interceptors.split_first() {
            Some((first, rest)) => first.intercept(
                request,
                Next {
                    interceptors: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.handle(request),
        }
    }
}

/// Interceptors applied in insertion order.
///
/// Interceptors borrow the configuration loaded at startup, so the chain
/// cannot outlive it.
///
/// # Examples
///
/// ```
/// use upguard_core::chain::{Chain, SanitizeInterceptor};
/// use upguard_core::request::{HttpRequest, SimpleRequest};
/// use upguard_core::{Config, Outcome, Result};
///
/// fn save(request: &dyn HttpRequest) -> Result<Outcome> {
///     Ok(Outcome::ok_with(request.parameter("title")?.unwrap_or_default()))
/// }
///
/// let config = Config::default();
/// let chain = Chain::new().with(SanitizeInterceptor::new(&config.sanitize));
///
/// let ok = SimpleRequest::new("POST", "/save.do").with_parameter("title", "Hello");
/// assert_eq!(chain.run(&ok, &save), Outcome::ok_with("Hello"));
///
/// let bad = SimpleRequest::new("POST", "/save.do").with_parameter("title", "<script>x</script>");
/// assert_eq!(chain.run(&bad, &save), Outcome::failure("parameter invalid, url: /save.do"));
/// ```
#[derive(Default)]
pub struct Chain<'c> {
    interceptors: Vec<Box<dyn Interceptor + 'c>>,
}

impl<'c> Chain<'c> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor + 'c) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Runs `request` through every interceptor and then `handler`.
    ///
    /// Client errors become a failed outcome carrying their message.
    /// Internal errors are logged and reported generically.
    pub fn run(&self, request: &dyn HttpRequest, handler: &dyn Handler) -> Outcome {
        let next = Next {
            interceptors: &self.interceptors,
            handler,
        };
        match next.run(request) {
            Ok(outcome) => outcome,
            Err(e) if e.is_client_error() => {
                tracing::debug!(path = request.path(), code = e.code(), "request rejected");
                Outcome::failure(e.client_message())
            }
            Err(e) => {
                tracing::error!(path = request.path(), error = %e, "request failed");
                Outcome::failure(e.client_message())
            }
        }
    }
}

impl std::fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// Hands downstream steps a [`SanitizedRequest`].
///
/// The parameter map is checked up front, so an injection attempt is
/// rejected even if the handler never reads the offending parameter.
#[derive(Debug)]
pub struct SanitizeInterceptor<'p> {
    cleaner: Cleaner<'p>,
}

impl<'p> SanitizeInterceptor<'p> {
    /// Creates the interceptor, building its cleaner from `policy` once.
    #[must_use]
    pub fn new(policy: &'p SanitizePolicy) -> Self {
        Self {
            cleaner: Cleaner::new(policy),
        }
    }
}

impl Interceptor for SanitizeInterceptor<'_> {
    fn intercept(&self, request: &dyn HttpRequest, next: Next<'_>) -> Result<Outcome> {
        let sanitized = SanitizedRequest::new(request, &self.cleaner);
        if self.cleaner.policy().mode == SanitizeMode::Enforce {
            sanitized.parameter_map()?;
        }
        next.run(&sanitized)
    }
}

/// Runs the archive guard on uploads sent to a fixed set of paths.
#[derive(Debug, Clone)]
pub struct UploadGuardInterceptor<'c> {
    config: &'c UploadConfig,
    route: UploadRoute,
    paths: BTreeSet<String>,
}

impl<'c> UploadGuardInterceptor<'c> {
    /// Creates an interceptor for `route` that matches no path yet.
    #[must_use]
    pub fn new(config: &'c UploadConfig, route: UploadRoute) -> Self {
        Self {
            config,
            route,
            paths: BTreeSet::new(),
        }
    }

    /// Adds an upload endpoint path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.insert(path.into());
        self
    }

    fn applies_to(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl Interceptor for UploadGuardInterceptor<'_> {
    fn intercept(&self, request: &dyn HttpRequest, next: Next<'_>) -> Result<Outcome> {
        if self.applies_to(request.path())
            && let Some(upload) = request.upload()
        {
            let report = ArchiveGuard::new(self.config).check(upload, self.route)?;
            tracing::debug!(
                path = request.path(),
                scanned = report.archive_scanned,
                files = report.files_scanned,
                "upload accepted"
            );
        }
        next.run(request)
    }
}

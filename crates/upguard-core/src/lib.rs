//! Upload archive guard and request sanitizing interceptors.
//!
//! `upguard-core` provides two request-processing concerns for web
//! applications that accept user content:
//!
//! - an archive upload guard that unpacks zip uploads into a scratch
//!   workspace and rejects them when any file inside has a denied true type
//! - a request decorator that rejects parameters, headers and bodies
//!   carrying markup or SQL injection payloads
//!
//! Both are exposed as [`chain::Interceptor`]s that compose in an explicit
//! [`Chain`] in front of an application handler.
//!
//! # Examples
//!
//! ```
//! use upguard_core::config::UploadRoute;
//! use upguard_core::{ArchiveGuard, Config, UploadedFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_toml_str("[upload]\ndenied = \"exe,bat\"\n")?;
//! let upload = UploadedFile::new("notes.txt", b"plain text".to_vec());
//! let report = ArchiveGuard::new(&config.upload).check(&upload, UploadRoute::Web)?;
//! assert!(!report.archive_scanned);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod config;
pub mod copy;
pub mod error;
pub mod extract;
pub mod guard;
pub mod report;
pub mod request;
pub mod sanitize;
pub mod security;
pub mod sniff;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use chain::Chain;
pub use config::Config;
pub use config::Denylist;
pub use error::GuardError;
pub use error::Result;
pub use guard::ArchiveGuard;
pub use guard::UploadedFile;
pub use report::CheckReport;
pub use report::Outcome;
pub use request::HttpRequest;
pub use request::SanitizedRequest;
pub use request::SimpleRequest;

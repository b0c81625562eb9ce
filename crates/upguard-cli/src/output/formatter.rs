//! Output formatter trait for CLI results.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use upguard_core::CheckReport;
use upguard_core::Config;
use upguard_core::GuardError;

/// Detected type of one inspected file.
#[derive(Debug, Serialize)]
pub struct SniffResult {
    pub path: PathBuf,
    pub file_type: Option<String>,
    pub archive: bool,
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format an accepted upload
    fn format_check_result(&self, file: &Path, report: &CheckReport) -> Result<()>;

    /// Format detected file types
    fn format_sniff_results(&self, results: &[SniffResult]) -> Result<()>;

    /// Format an accepted request value
    fn format_clean_result(&self, name: &str, value: &str, bypassed: bool) -> Result<()>;

    /// Format the effective configuration
    fn format_config(&self, config: &Config) -> Result<()>;

    /// Format a rejection with the message a client would receive
    fn format_rejection(&self, operation: &str, error: &GuardError);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Rejected,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn rejected(operation: impl Into<String>, error: &GuardError) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Rejected,
            data: None,
            error: Some(error.client_message()),
            code: Some(error.code()),
        }
    }
}

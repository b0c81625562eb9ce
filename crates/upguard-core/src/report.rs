//! Upload check reporting and the client-visible outcome.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::config::UploadRoute;

/// Report of one upload check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Route the upload arrived through.
    pub route: UploadRoute,

    /// Sniffed type of the upload itself.
    pub upload_type: Option<String>,

    /// Whether the upload was unpacked and scanned.
    pub archive_scanned: bool,

    /// Number of archive entries written to the workspace.
    pub entries_extracted: usize,

    /// Number of directories created in the workspace.
    pub directories_created: usize,

    /// Number of extracted files whose type was checked.
    pub files_scanned: usize,

    /// Total bytes written to the workspace.
    pub bytes_written: u64,

    /// Duration of the check.
    pub duration: Duration,

    /// Entries skipped under the best-effort policy.
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Creates a new empty report for `route`.
    #[must_use]
    pub fn new(route: UploadRoute) -> Self {
        Self {
            route,
            upload_type: None,
            archive_scanned: false,
            entries_extracted: 0,
            directories_created: 0,
            files_scanned: 0,
            bytes_written: 0,
            duration: Duration::ZERO,
            warnings: Vec::new(),
        }
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Structured result handed back to the client.
///
/// Serializes as `{"success":false,"message":"..."}`; `message` is omitted
/// on plain success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the request succeeded.
    pub success: bool,

    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    /// Successful outcome without a message.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Successful outcome with a message.
    #[must_use]
    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report() {
        let report = CheckReport::new(UploadRoute::Manage);
        assert!(!report.archive_scanned);
        assert_eq!(report.files_scanned, 0);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_add_warning() {
        let mut report = CheckReport::new(UploadRoute::Web);
        report.add_warning("skipped bad.bin".to_string());
        assert!(report.has_warnings());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_outcome_failure_json() {
        let outcome = Outcome::failure("file b.exe type exe denied");
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(
            json,
            r#"{"success":false,"message":"file b.exe type exe denied"}"#
        );
    }

    #[test]
    fn test_outcome_ok_json_omits_message() {
        let json = serde_json::to_string(&Outcome::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}

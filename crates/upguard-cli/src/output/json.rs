//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::SniffResult;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use upguard_core::CheckReport;
use upguard_core::Config;
use upguard_core::GuardError;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_check_result(&self, file: &Path, report: &CheckReport) -> Result<()> {
        #[derive(Serialize)]
        struct CheckOutput<'a> {
            file: String,
            route: String,
            upload_type: Option<&'a str>,
            archive_scanned: bool,
            entries_extracted: usize,
            directories_created: usize,
            files_scanned: usize,
            bytes_written: u64,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = CheckOutput {
            file: file.display().to_string(),
            route: report.route.to_string(),
            upload_type: report.upload_type.as_deref(),
            archive_scanned: report.archive_scanned,
            entries_extracted: report.entries_extracted,
            directories_created: report.directories_created,
            files_scanned: report.files_scanned,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        };

        Self::output(&JsonOutput::success("check", data))
    }

    fn format_sniff_results(&self, results: &[SniffResult]) -> Result<()> {
        Self::output(&JsonOutput::success("sniff", results))
    }

    fn format_clean_result(&self, name: &str, value: &str, bypassed: bool) -> Result<()> {
        #[derive(Serialize)]
        struct CleanOutput<'a> {
            name: &'a str,
            value: &'a str,
            bypassed: bool,
        }

        Self::output(&JsonOutput::success(
            "clean",
            CleanOutput {
                name,
                value,
                bypassed,
            },
        ))
    }

    fn format_config(&self, config: &Config) -> Result<()> {
        Self::output(&JsonOutput::success("config", config))
    }

    fn format_rejection(&self, operation: &str, error: &GuardError) {
        let _ = Self::output(&JsonOutput::rejected(operation, error));
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        // stdout carries exactly one JSON document per command
        if let Ok(json) = serde_json::to_string(&output) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}

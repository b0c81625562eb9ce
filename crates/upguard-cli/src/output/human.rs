//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::SniffResult;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;
use upguard_core::CheckReport;
use upguard_core::Config;
use upguard_core::GuardError;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn headline(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_check_result(&self, file: &Path, report: &CheckReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(&format!("Upload accepted: {}", file.display()));
        let _ = self.term.write_line(&format!(
            "  Detected type: {}",
            report.upload_type.as_deref().unwrap_or("unknown")
        ));
        let _ = self.term.write_line(&format!("  Route: {}", report.route));

        if report.archive_scanned {
            let _ = self.term.write_line(&format!(
                "  Files scanned: {}",
                Self::format_number(report.files_scanned)
            ));
            let _ = self.term.write_line(&format!(
                "  Extracted size: {}",
                Self::format_size(report.bytes_written)
            ));
        } else {
            let _ = self.term.write_line("  Not an archive, nothing to scan");
        }

        if self.verbose {
            let _ = self.term.write_line(&format!(
                "  Entries extracted: {}",
                Self::format_number(report.entries_extracted)
            ));
            let _ = self
                .term
                .write_line(&format!("  Directories: {}", report.directories_created));
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        if report.has_warnings() {
            let _ = self.term.write_line("");
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("{}", style("Skipped entries:").yellow().bold()));
            } else {
                let _ = self.term.write_line("Skipped entries:");
            }
            for warning in &report.warnings {
                let _ = self.term.write_line(&format!("  - {warning}"));
            }
        }

        Ok(())
    }

    fn format_sniff_results(&self, results: &[SniffResult]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for result in results {
            let file_type = result.file_type.as_deref().unwrap_or("unknown");
            let marker = if result.archive { " (archive)" } else { "" };
            let _ = self.term.write_line(&format!(
                "{}: {file_type}{marker}",
                result.path.display()
            ));
        }

        Ok(())
    }

    fn format_clean_result(&self, name: &str, value: &str, bypassed: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if bypassed {
            self.headline(&format!(
                "Value accepted: '{name}' carries raw markup and is not checked"
            ));
        } else {
            self.headline(&format!("Value accepted: '{name}'"));
        }
        if self.verbose {
            let _ = self.term.write_line(&format!("  {value}"));
        }

        Ok(())
    }

    fn format_config(&self, config: &Config) -> Result<()> {
        let text = config.to_toml_string()?;
        let _ = self.term.write_str(&text);
        Ok(())
    }

    fn format_rejection(&self, operation: &str, error: &GuardError) {
        // Always show rejections, even in quiet mode
        let message = error.client_message();
        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} {operation}: {message}",
                style("✗ REJECTED").red().bold()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("REJECTED {operation}: {message}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

//! Error conversion utilities for CLI.
//!
//! Converts upguard-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use upguard_core::GuardError;

/// Converts `GuardError` to user-friendly anyhow error with context
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn convert_guard_error(err: GuardError, file: &Path) -> anyhow::Error {
    match err {
        GuardError::DeniedType { file: entry, file_type } => {
            anyhow!(
                "Upload '{}' rejected: archive contains '{entry}' of denied type '{file_type}'\n\
                 HINT: Adjust [upload].denied (or --denied) only if this type is expected.",
                file.display()
            )
        }
        GuardError::FilenameRequired => {
            anyhow!(
                "Upload '{}' has no usable file name\n\
                 HINT: Rename the file so its name contains more than separators or control characters.",
                file.display()
            )
        }
        GuardError::UnsafeEntryPath { path } => {
            anyhow!(
                "Security violation: Archive '{}' contains an entry escaping the workspace: '{}'\n\
                 HINT: This archive may be malicious. Do not accept it from untrusted sources.",
                file.display(),
                path.display()
            )
        }
        GuardError::ZipBomb {
            compressed,
            uncompressed,
            ratio,
        } => {
            anyhow!(
                "Security violation: Archive '{}' appears to be a zip bomb\n\
                 Compression ratio: {}:1 ({}KB → {}MB)\n\
                 HINT: Raise [upload].max_compression_ratio if the archive is legitimate.",
                file.display(),
                ratio as u64,
                compressed / 1024,
                uncompressed / 1024 / 1024
            )
        }
        GuardError::QuotaExceeded { resource } => {
            anyhow!(
                "Extraction limit exceeded for '{}': {}\n\
                 HINT: Use --max-file-size or --max-total-size, or raise the [upload] limits.",
                file.display(),
                resource
            )
        }
        GuardError::Timeout { elapsed_ms } => {
            anyhow!(
                "Checking '{}' timed out after {elapsed_ms} ms\n\
                 HINT: Raise [upload].extraction_timeout_ms for very large archives.",
                file.display()
            )
        }
        GuardError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {}\n\
                 HINT: The archive may be corrupted. Use --best-effort to skip unreadable entries.",
                file.display(),
                reason
            )
        }
        GuardError::InvalidParameter { path } => {
            anyhow!(
                "Value rejected for request path '{path}'\n\
                 HINT: The value contains markup or an SQL injection pattern."
            )
        }
        GuardError::Config(reason) => {
            anyhow!(
                "Invalid configuration '{}': {reason}\n\
                 HINT: Run `upguard config` to print a valid configuration.",
                file.display()
            )
        }
        GuardError::Io(io_err) => {
            anyhow!("I/O error while processing '{}': {}", file.display(), io_err)
        }
    }
}

/// Adds context to a core result about the file being processed
pub fn add_file_context<T>(result: Result<T, GuardError>, file: &Path) -> anyhow::Result<T> {
    result.map_err(|e| convert_guard_error(e, file))
}

//! Archive upload guard.
//!
//! Rejects zip uploads, including zip containers such as office documents
//! and jars, that hold a file whose sniffed type is on the route's
//! denylist. Uploads that are not zip containers pass untouched.

use std::path::Path;
use std::time::Instant;

use crate::CheckReport;
use crate::GuardError;
use crate::Result;
use crate::config::UploadConfig;
use crate::config::UploadRoute;
use crate::extract::Workspace;
use crate::extract::extract_zip;
use crate::security::Deadline;
use crate::sniff::is_archive;
use crate::sniff::sniff_bytes;
use crate::sniff::sniff_file;

/// Characters never allowed in an uploaded file name.
const INVALID_FILE_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// A file received by an upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name the client sent.
    pub original_name: String,
    /// Content type the client declared. Never trusted.
    pub declared_type: Option<String>,
    /// Raw bytes.
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Creates an upload from a name and its bytes.
    #[must_use]
    pub fn new(original_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            declared_type: None,
            data,
        }
    }

    /// Reads an upload from disk, keeping the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, data))
    }
}

/// Removes path separators, wildcard and control characters from a
/// client-supplied file name.
///
/// # Examples
///
/// ```
/// use upguard_core::guard::clean_file_name;
///
/// assert_eq!(clean_file_name("../a:b*c?.zip"), "..abc.zip");
/// assert_eq!(clean_file_name("\u{0}\t"), "");
/// ```
#[must_use]
pub fn clean_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !INVALID_FILE_NAME_CHARS.contains(c))
        .collect()
}

/// Validates uploads against the configured denylist.
///
/// Borrows the process-wide configuration; construct one per request.
///
/// # Examples
///
/// ```
/// use upguard_core::ArchiveGuard;
/// use upguard_core::UploadedFile;
/// use upguard_core::config::{UploadConfig, UploadRoute};
/// use upguard_core::test_utils::{ZipTestBuilder, pe_executable};
///
/// let config = UploadConfig {
///     denied: "exe,bat".parse().unwrap(),
///     ..Default::default()
/// };
/// let zip = ZipTestBuilder::new()
///     .add_file("a.txt", b"hello")
///     .add_file("b.exe", &pe_executable())
///     .build();
///
/// let err = ArchiveGuard::new(&config)
///     .check(&UploadedFile::new("bundle.zip", zip), UploadRoute::Manage)
///     .unwrap_err();
/// assert_eq!(err.to_string(), "file b.exe type exe denied");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArchiveGuard<'c> {
    config: &'c UploadConfig,
}

impl<'c> ArchiveGuard<'c> {
    /// Creates a guard over `config`.
    #[must_use]
    pub fn new(config: &'c UploadConfig) -> Self {
        Self { config }
    }

    /// Checks one upload.
    ///
    /// # Errors
    ///
    /// - `GuardError::FilenameRequired` if the cleaned name is blank
    /// - `GuardError::DeniedType` for the first denied file found
    /// - limit and entry errors from extraction
    pub fn check(&self, upload: &UploadedFile, route: UploadRoute) -> Result<CheckReport> {
        let started = Instant::now();
        let mut report = CheckReport::new(route);

        let file_name = clean_file_name(&upload.original_name);
        if file_name.trim().is_empty() {
            return Err(GuardError::FilenameRequired);
        }

        report.upload_type = sniff_bytes(&upload.data, &file_name);
        tracing::debug!(
            file = %file_name,
            declared = upload.declared_type.as_deref().unwrap_or("-"),
            detected = report.upload_type.as_deref().unwrap_or("-"),
            %route,
            "checking upload"
        );

        if !is_archive(report.upload_type.as_deref()) {
            report.duration = started.elapsed();
            return Ok(report);
        }

        let mut workspace = Workspace::create(&self.config.temp_root())?;
        let result = self.scan_archive(&mut workspace, upload, &mut report);
        workspace.close();
        result?;

        report.archive_scanned = true;
        report.duration = started.elapsed();
        Ok(report)
    }

    /// Checks a file on disk as if it had been uploaded.
    pub fn check_path(&self, path: &Path, route: UploadRoute) -> Result<CheckReport> {
        self.check(&UploadedFile::from_path(path)?, route)
    }

    fn scan_archive(
        &self,
        workspace: &mut Workspace,
        upload: &UploadedFile,
        report: &mut CheckReport,
    ) -> Result<()> {
        let archive = workspace.persist_archive(&upload.data)?;
        let deadline = self.config.extraction_timeout().map(Deadline::after);

        extract_zip(
            &archive,
            workspace.path(),
            self.config,
            deadline.as_ref(),
            report,
        )?;

        let denied = self.config.denylist(report.route);
        for file in workspace.files() {
            let file = file?;
            if let Some(deadline) = &deadline {
                deadline.check()?;
            }
            report.files_scanned += 1;

            let Some(file_type) = sniff_file(&file)? else {
                continue;
            };
            if denied.contains(&file_type) {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::info!(
                    file = %name,
                    %file_type,
                    route = %report.route,
                    "denied file type in upload"
                );
                return Err(GuardError::DeniedType { file: name, file_type });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use crate::config::EntryErrorPolicy;
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::pe_executable;
    use crate::test_utils::text_file;
    use tempfile::TempDir;

    fn config_in(root: &TempDir, denied: &str) -> UploadConfig {
        let mut config = UploadConfig::default();
        config.denied = denied.parse().unwrap();
        config.temp_root = Some(root.path().to_path_buf());
        config
    }

    fn leftovers(root: &TempDir) -> usize {
        std::fs::read_dir(root.path()).unwrap().count()
    }

    #[test]
    fn test_denied_exe_is_named() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe,bat");
        let zip = ZipTestBuilder::new()
            .add_file("a.txt", &text_file())
            .add_file("b.exe", &pe_executable())
            .build();

        let err = ArchiveGuard::new(&config)
            .check(&UploadedFile::new("upload.zip", zip), UploadRoute::Manage)
            .unwrap_err();

        match err {
            GuardError::DeniedType { file, file_type } => {
                assert_eq!(file, "b.exe");
                assert_eq!(file_type, "exe");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(leftovers(&root), 0);
    }

    #[test]
    fn test_zip_containers_are_scanned() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe,bat");
        let docx_shaped = ZipTestBuilder::new()
            .add_file("[Content_Types].xml", b"<Types/>")
            .add_file("word/document.xml", b"<w:document/>")
            .add_file("b.exe", &pe_executable())
            .build();
        let jar_shaped = ZipTestBuilder::new()
            .add_file("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n")
            .add_file("b.exe", &pe_executable())
            .build();

        for (name, data) in [
            ("bundle.zip", &docx_shaped),
            ("report.docx", &docx_shaped),
            ("bundle.zip", &jar_shaped),
            ("plugin.jar", &jar_shaped),
        ] {
            let err = ArchiveGuard::new(&config)
                .check(&UploadedFile::new(name, data.clone()), UploadRoute::Manage)
                .unwrap_err();
            assert!(
                matches!(err, GuardError::DeniedType { ref file, .. } if file == "b.exe"),
                "{name}: {err}"
            );
        }
        assert_eq!(leftovers(&root), 0);
    }

    #[test]
    fn test_clean_archive_passes() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe,bat");
        let zip = ZipTestBuilder::new().add_file("a.txt", &text_file()).build();

        let report = ArchiveGuard::new(&config)
            .check(&UploadedFile::new("upload.zip", zip), UploadRoute::Manage)
            .unwrap();

        assert!(report.archive_scanned);
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.upload_type.as_deref(), Some("zip"));
        assert_eq!(leftovers(&root), 0);
    }

    #[test]
    fn test_disguised_executable_is_caught() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe");
        let zip = ZipTestBuilder::new()
            .add_file("docs/readme.txt", &pe_executable())
            .build();

        let err = ArchiveGuard::new(&config)
            .check(&UploadedFile::new("docs.zip", zip), UploadRoute::Manage)
            .unwrap_err();
        assert!(matches!(err, GuardError::DeniedType { ref file, .. } if file == "readme.txt"));
    }

    #[test]
    fn test_extension_only_type_denied() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "BAT");
        let zip = ZipTestBuilder::new()
            .add_file("scripts/run.Bat", b"@echo off\r\n")
            .build();

        let err = ArchiveGuard::new(&config)
            .check(&UploadedFile::new("s.zip", zip), UploadRoute::Manage)
            .unwrap_err();
        assert!(matches!(err, GuardError::DeniedType { ref file_type, .. } if file_type == "bat"));
    }

    #[test]
    fn test_non_archive_skips_filesystem() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe");

        let report = ArchiveGuard::new(&config)
            .check(
                &UploadedFile::new("setup.zip", pe_executable()),
                UploadRoute::Manage,
            )
            .unwrap();

        assert!(!report.archive_scanned);
        assert_eq!(report.upload_type.as_deref(), Some("exe"));
        assert_eq!(leftovers(&root), 0);
    }

    #[test]
    fn test_blank_filename_rejected_first() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe");
        let zip = ZipTestBuilder::new().add_file("b.exe", &pe_executable()).build();

        for name in ["", "   ", "///", "\u{7}"] {
            let err = ArchiveGuard::new(&config)
                .check(&UploadedFile::new(name, zip.clone()), UploadRoute::Web)
                .unwrap_err();
            assert!(matches!(err, GuardError::FilenameRequired), "name {name:?}");
        }
        assert_eq!(leftovers(&root), 0);
    }

    #[test]
    fn test_web_route_uses_web_denylist() {
        let root = TempDir::new().unwrap();
        let mut config = config_in(&root, "exe");
        config.web_denied = Some("exe,txt".parse().unwrap());
        let zip = ZipTestBuilder::new().add_file("a.txt", &text_file()).build();
        let upload = UploadedFile::new("a.zip", zip);
        let guard = ArchiveGuard::new(&config);

        assert!(guard.check(&upload, UploadRoute::Manage).is_ok());
        assert!(matches!(
            guard.check(&upload, UploadRoute::Web),
            Err(GuardError::DeniedType { .. })
        ));
    }

    #[test]
    fn test_stops_at_first_denied_file() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe,sh");
        let zip = ZipTestBuilder::new()
            .add_file("a.exe", &pe_executable())
            .add_file("b.sh", b"#!/bin/sh\n")
            .build();

        let err = ArchiveGuard::new(&config)
            .check(&UploadedFile::new("x.zip", zip), UploadRoute::Manage)
            .unwrap_err();
        assert!(matches!(err, GuardError::DeniedType { ref file, .. } if file == "a.exe"));
    }

    #[test]
    fn test_best_effort_tolerates_unsafe_entry() {
        let root = TempDir::new().unwrap();
        let mut config = config_in(&root, "exe");
        config.entry_errors = EntryErrorPolicy::BestEffort;
        let zip = ZipTestBuilder::new()
            .add_file("../../evil.txt", b"x")
            .add_file("fine.txt", &text_file())
            .build();

        let report = ArchiveGuard::new(&config)
            .check(&UploadedFile::new("x.zip", zip), UploadRoute::Manage)
            .unwrap();
        assert!(report.has_warnings());
        assert_eq!(report.files_scanned, 1);
        assert_eq!(leftovers(&root), 0);
    }

    #[test]
    fn test_check_path_reads_file() {
        let root = TempDir::new().unwrap();
        let config = config_in(&root, "exe");
        let upload_dir = TempDir::new().unwrap();
        let path = upload_dir.path().join("bundle.zip");
        std::fs::write(
            &path,
            ZipTestBuilder::new().add_file("x.exe", &pe_executable()).build(),
        )
        .unwrap();

        let result = ArchiveGuard::new(&config).check_path(&path, UploadRoute::Manage);
        assert!(matches!(result, Err(GuardError::DeniedType { .. })));
    }
}

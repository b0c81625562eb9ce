//! Path traversal attack integration tests.
//!
//! Archive entries whose names climb out of the workspace must never be
//! written, whatever the entry-error policy.

#![allow(clippy::unwrap_used, clippy::field_reassign_with_default)]

use std::fs;

use tempfile::TempDir;
use upguard_core::ArchiveGuard;
use upguard_core::GuardError;
use upguard_core::UploadedFile;
use upguard_core::config::EntryErrorPolicy;
use upguard_core::config::UploadConfig;
use upguard_core::config::UploadRoute;
use upguard_core::test_utils::ZipTestBuilder;

const MALICIOUS: [&str; 4] = [
    "../escape.txt",
    "../../escape.txt",
    "foo/../../escape.txt",
    "foo/../../../escape.txt",
];

fn config_under(root: &TempDir) -> UploadConfig {
    let mut config = UploadConfig::default();
    config.temp_root = Some(root.path().join("scratch"));
    config
}

fn nothing_escaped(root: &TempDir) -> bool {
    let scratch = root.path().join("scratch");
    !root.path().join("escape.txt").exists()
        && !scratch.join("escape.txt").exists()
        && fs::read_dir(&scratch).unwrap().next().is_none()
}

#[test]
fn test_zip_slip_rejected_fail_fast() {
    for name in MALICIOUS {
        let root = TempDir::new().unwrap();
        let config = config_under(&root);
        let zip = ZipTestBuilder::new().add_file(name, b"pwned").build();

        let upload = UploadedFile::new("slip.zip", zip);
        let result = ArchiveGuard::new(&config).check(&upload, UploadRoute::Web);

        assert!(
            matches!(result, Err(GuardError::UnsafeEntryPath { .. })),
            "entry should be rejected: {name}"
        );
        assert!(nothing_escaped(&root), "entry escaped: {name}");
    }
}

#[test]
fn test_zip_slip_skipped_best_effort() {
    let root = TempDir::new().unwrap();
    let mut config = config_under(&root);
    config.entry_errors = EntryErrorPolicy::BestEffort;

    let builder = MALICIOUS
        .iter()
        .fold(ZipTestBuilder::new(), |b, name| b.add_file(name, b"pwned"));
    let zip = builder.add_file("ok.txt", b"fine").build();

    let report = ArchiveGuard::new(&config)
        .check(&UploadedFile::new("slip.zip", zip), UploadRoute::Web)
        .unwrap();

    assert_eq!(report.warnings.len(), MALICIOUS.len());
    assert_eq!(report.entries_extracted, 1);
    assert!(nothing_escaped(&root));
}

#[test]
fn test_inner_parent_components_stay_inside() {
    let root = TempDir::new().unwrap();
    let config = config_under(&root);
    let zip = ZipTestBuilder::new()
        .add_file("docs/../readme.txt", b"inside")
        .build();

    let report = ArchiveGuard::new(&config)
        .check(&UploadedFile::new("ok.zip", zip), UploadRoute::Manage)
        .unwrap();

    assert_eq!(report.files_scanned, 1);
    assert!(nothing_escaped(&root));
}

#[test]
fn test_client_message_hides_directories() {
    let root = TempDir::new().unwrap();
    let config = config_under(&root);
    let zip = ZipTestBuilder::new()
        .add_file("../../home/admin/.ssh/authorized_keys", b"ssh-rsa AAAA")
        .build();

    let err = ArchiveGuard::new(&config)
        .check(&UploadedFile::new("slip.zip", zip), UploadRoute::Web)
        .unwrap_err();

    assert_eq!(err.client_message(), "unsafe entry path: authorized_keys");
}

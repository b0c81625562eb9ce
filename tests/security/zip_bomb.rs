//! Zip bomb detection integration tests.

#![allow(clippy::unwrap_used, clippy::field_reassign_with_default)]

use tempfile::TempDir;
use upguard_core::ArchiveGuard;
use upguard_core::GuardError;
use upguard_core::UploadedFile;
use upguard_core::config::EntryErrorPolicy;
use upguard_core::config::UploadConfig;
use upguard_core::config::UploadRoute;
use upguard_core::error::QuotaResource;
use upguard_core::security::EntrySizes;
use upguard_core::security::check_declared;
use upguard_core::test_utils::ZipTestBuilder;

fn config_in(root: &TempDir) -> UploadConfig {
    let mut config = UploadConfig::default();
    config.temp_root = Some(root.path().to_path_buf());
    config
}

fn scratch_is_clean(root: &TempDir) -> bool {
    std::fs::read_dir(root.path()).unwrap().next().is_none()
}

#[test]
fn test_42_zip_bomb_header() {
    // 42.zip: 42 KB compressed, 4.5 PB uncompressed
    let config = UploadConfig::default();
    let sizes = EntrySizes {
        compressed: 42_000,
        uncompressed: 4_500_000_000_000_000,
    };
    let result = check_declared(sizes, &config);
    assert!(matches!(result, Err(GuardError::ZipBomb { .. })));
}

#[test]
fn test_highly_compressed_entry_rejected() {
    let root = TempDir::new().unwrap();
    let config = config_in(&root);
    // 4 MB of zeros deflates far beyond the default ratio of 100.
    let zip = ZipTestBuilder::new()
        .add_deflated_file("zeros.bin", &vec![0u8; 4 * 1024 * 1024])
        .build();

    let upload = UploadedFile::new("bomb.zip", zip);
    let result = ArchiveGuard::new(&config).check(&upload, UploadRoute::Web);

    assert!(matches!(result, Err(GuardError::ZipBomb { .. })));
    assert!(scratch_is_clean(&root));
}

#[test]
fn test_bomb_fails_closed_under_best_effort() {
    let root = TempDir::new().unwrap();
    let mut config = config_in(&root);
    config.entry_errors = EntryErrorPolicy::BestEffort;
    let zip = ZipTestBuilder::new()
        .add_deflated_file("zeros.bin", &vec![0u8; 4 * 1024 * 1024])
        .build();

    let upload = UploadedFile::new("bomb.zip", zip);
    let result = ArchiveGuard::new(&config).check(&upload, UploadRoute::Web);
    assert!(matches!(result, Err(GuardError::ZipBomb { .. })));
}

#[test]
fn test_many_small_entries_hit_total_size() {
    let root = TempDir::new().unwrap();
    let mut config = config_in(&root);
    config.max_file_size = 1024;
    config.max_total_size = 4 * 1024;

    let zip = (0..8)
        .fold(ZipTestBuilder::new(), |b, i| b.add_file(&format!("part{i}.txt"), &[b'a'; 1000]))
        .build();

    let err = ArchiveGuard::new(&config)
        .check(&UploadedFile::new("parts.zip", zip), UploadRoute::Manage)
        .unwrap_err();

    assert!(matches!(
        err.quota_resource(),
        Some(QuotaResource::TotalSize { max: 4096, .. })
    ));
    assert!(scratch_is_clean(&root));
}

#[test]
fn test_entry_flood_rejected() {
    let root = TempDir::new().unwrap();
    let mut config = config_in(&root);
    config.max_entries = 50;

    let zip = (0..51)
        .fold(ZipTestBuilder::new(), |b, i| b.add_file(&format!("f{i}.txt"), b"x"))
        .build();

    let err = ArchiveGuard::new(&config)
        .check(&UploadedFile::new("flood.zip", zip), UploadRoute::Manage)
        .unwrap_err();

    assert!(matches!(
        err.quota_resource(),
        Some(QuotaResource::EntryCount { current: 51, max: 50 })
    ));
}

#[test]
fn test_normal_archive_within_limits() {
    let root = TempDir::new().unwrap();
    let config = config_in(&root);
    let text = "lorem ipsum dolor sit amet ".repeat(10);
    let zip = ZipTestBuilder::new()
        .add_deflated_file("lorem.txt", text.as_bytes())
        .build();

    let report = ArchiveGuard::new(&config)
        .check(&UploadedFile::new("ok.zip", zip), UploadRoute::Manage)
        .unwrap();
    assert_eq!(report.bytes_written, text.len() as u64);
}

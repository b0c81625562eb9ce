//! Property-based tests for the guard and the sanitizer.

#![allow(clippy::expect_used, clippy::field_reassign_with_default)]

use proptest::prelude::*;
use tempfile::TempDir;
use upguard_core::ArchiveGuard;
use upguard_core::Denylist;
use upguard_core::SanitizedRequest;
use upguard_core::SimpleRequest;
use upguard_core::UploadedFile;
use upguard_core::config::SanitizeMode;
use upguard_core::config::SanitizePolicy;
use upguard_core::config::UploadConfig;
use upguard_core::config::UploadRoute;
use upguard_core::guard::clean_file_name;
use upguard_core::request::HttpRequest;
use upguard_core::sanitize::Cleaner;
use upguard_core::sniff::sniff_bytes;

proptest! {
    /// Uploads that are not zip archives never create a workspace.
    #[test]
    fn prop_non_archive_uploads_pass_without_workspace(
        data in prop::collection::vec(any::<u8>(), 0..512),
        name in "[a-z]{1,8}\\.(txt|exe|bin|zip)"
    ) {
        prop_assume!(!data.starts_with(b"PK"));
        prop_assume!(sniff_bytes(&data, &name).as_deref() != Some("zip"));

        let root = TempDir::new().expect("temp root");
        let mut config = UploadConfig::default();
        config.temp_root = Some(root.path().to_path_buf());

        let report = ArchiveGuard::new(&config)
            .check(&UploadedFile::new(name, data), UploadRoute::Manage)
            .expect("non-archive upload must pass");
        prop_assert!(!report.archive_scanned);
        prop_assert!(std::fs::read_dir(root.path()).expect("read root").next().is_none());
    }

    /// Cleaned file names never contain separators or wildcards.
    #[test]
    fn prop_clean_file_name_strips_invalid(name in "\\PC{0,40}") {
        let cleaned = clean_file_name(&name);
        prop_assert!(!cleaned.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']));
        prop_assert!(!cleaned.chars().any(char::is_control));
    }

    /// Denylist membership ignores case and surrounding whitespace.
    #[test]
    fn prop_denylist_case_insensitive(token in "[a-z0-9]{1,6}", pad in " {0,3}") {
        let list: Denylist = format!("{pad}{}{pad}", token.to_uppercase())
            .parse()
            .expect("infallible");
        prop_assert!(list.contains(&token));
        prop_assert!(list.contains(&token.to_uppercase()));
    }

    /// Plain words and punctuation without markup are accepted unchanged.
    #[test]
    fn prop_plain_text_accepted(value in "[a-zA-Z0-9 ,.!?()+=-]{0,64}") {
        let policy = SanitizePolicy::default();
        let cleaner = Cleaner::new(&policy);
        prop_assert_eq!(cleaner.clean_header("/p", "h", &value).expect("plain text"), value);
    }

    /// Pass-through mode returns every value unchanged.
    #[test]
    fn prop_pass_through_is_identity(value in "\\PC{0,64}") {
        let mut policy = SanitizePolicy::default();
        policy.mode = SanitizeMode::PassThrough;
        let cleaner = Cleaner::new(&policy);
        let raw = SimpleRequest::new("POST", "/p").with_parameter("q", value.clone());
        let request = SanitizedRequest::new(&raw, &cleaner);
        prop_assert_eq!(request.parameter("q").expect("pass-through"), Some(value));
    }

    /// A script element anywhere in a value is always rejected.
    #[test]
    fn prop_script_always_rejected(before in "[a-z ]{0,10}", after in "[a-z ]{0,10}") {
        let policy = SanitizePolicy::default();
        let value = format!("{before}<script>alert(1)</script>{after}");
        let cleaner = Cleaner::new(&policy);
        let raw = SimpleRequest::new("POST", "/p").with_parameter("q", value);
        let request = SanitizedRequest::new(&raw, &cleaner);
        prop_assert!(request.parameter("q").is_err());
    }
}

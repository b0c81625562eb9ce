//! True file type detection.
//!
//! Types are taken from the leading signature bytes first. Only when no
//! signature matches does the lower-cased file extension decide, which is
//! how text formats without magic numbers (`bat`, `txt`, `csv`) still get a
//! type token.
//!
//! Anything starting with a zip signature is a zip container, whatever its
//! first entries suggest. Office documents, jars and the like keep their
//! extension as the token but are still unpacked and scanned.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::Result;

/// Number of leading bytes inspected when sniffing a file on disk.
pub const SNIFF_LEN: usize = 8 * 1024;

/// Type token reported for zip archives.
pub const ZIP: &str = "zip";

/// Formats stored as zip containers. Each is unpacked like a plain zip.
const ZIP_CONTAINERS: [&str; 13] = [
    ZIP, "jar", "war", "ear", "apk", "docx", "xlsx", "pptx", "odt", "ods", "odp", "epub", "xpi",
];

/// Local file header, empty archive and spanned archive markers.
const ZIP_SIGNATURES: [&[u8]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];

/// Detects the type token of `data`, falling back to the extension of
/// `file_name`.
///
/// Returns `None` when neither the bytes nor the name say anything.
///
/// # Examples
///
/// ```
/// use upguard_core::sniff::sniff_bytes;
///
/// // PNG renamed to look like an executable.
/// let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
/// assert_eq!(sniff_bytes(png, "setup.exe").as_deref(), Some("png"));
/// assert_eq!(sniff_bytes(b"plain words", "notes.TXT").as_deref(), Some("txt"));
/// assert_eq!(sniff_bytes(b"", "README"), None);
/// ```
#[must_use]
pub fn sniff_bytes(data: &[u8], file_name: &str) -> Option<String> {
    if has_zip_signature(data) {
        let token = extension_of(file_name)
            .filter(|ext| ZIP_CONTAINERS.contains(&ext.as_str()))
            .unwrap_or_else(|| ZIP.to_string());
        return Some(token);
    }
    if data.starts_with(b"#!") {
        return Some("sh".to_string());
    }
    if let Some(kind) = infer::get(data) {
        return Some(kind.extension().to_ascii_lowercase());
    }
    extension_of(file_name)
}

/// Detects the type token of a file on disk.
///
/// Only the first [`SNIFF_LEN`] bytes are read.
pub fn sniff_file(path: &Path) -> Result<Option<String>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    Ok(sniff_bytes(&head, &name))
}

/// Returns `true` if `data` starts with a zip signature.
#[must_use]
pub fn has_zip_signature(data: &[u8]) -> bool {
    ZIP_SIGNATURES.iter().any(|sig| data.starts_with(sig))
}

/// Returns `true` if `file_type` names a zip container the guard unpacks.
#[must_use]
pub fn is_archive(file_type: Option<&str>) -> bool {
    file_type.is_some_and(|t| ZIP_CONTAINERS.iter().any(|c| c.eq_ignore_ascii_case(t)))
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        // dotfile such as `.env`
        return None;
    }
    let ext = ext.trim();
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

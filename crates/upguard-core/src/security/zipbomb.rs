//! Compression ratio limits for zip entries.
//!
//! An entry is checked twice: once against the sizes its header declares,
//! before anything is unpacked, and once against the number of bytes the
//! decompressor actually produced. A forged header only gets past the
//! first check.

use crate::GuardError;
use crate::Result;
use crate::config::UploadConfig;

/// Sizes of one archive entry, as declared or as observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySizes {
    /// Bytes the entry occupies inside the archive.
    pub compressed: u64,
    /// Bytes the entry expands to.
    pub uncompressed: u64,
}

impl EntrySizes {
    /// Expansion factor, or `None` for entries stored in zero bytes.
    #[must_use]
    pub fn ratio(self) -> Option<f64> {
        (self.compressed > 0).then(|| self.uncompressed as f64 / self.compressed as f64)
    }
}

/// Rejects an entry whose header promises a suspicious expansion.
///
/// # Errors
///
/// `GuardError::ZipBomb` if the declared ratio is above
/// `config.max_compression_ratio`.
pub fn check_declared(sizes: EntrySizes, config: &UploadConfig) -> Result<()> {
    check_ratio(sizes, config)
}

/// Rejects an entry that expanded further than allowed while unpacking.
///
/// # Errors
///
/// `GuardError::ZipBomb` if `written` bytes from `compressed` input exceed
/// `config.max_compression_ratio`.
pub fn check_produced(compressed: u64, written: u64, config: &UploadConfig) -> Result<()> {
    let sizes = EntrySizes {
        compressed,
        uncompressed: written,
    };
    check_ratio(sizes, config).inspect_err(|_| {
        tracing::warn!(compressed, written, "entry expanded past its declared size");
    })
}

fn check_ratio(sizes: EntrySizes, config: &UploadConfig) -> Result<()> {
    match sizes.ratio() {
        Some(ratio) if ratio > config.max_compression_ratio => Err(GuardError::ZipBomb {
            compressed: sizes.compressed,
            uncompressed: sizes.uncompressed,
            ratio,
        }),
        _ => Ok(()),
    }
}

//! Error types for upload validation and request sanitization.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `GuardError`.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Represents a specific extraction limit that was exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaResource {
    /// Entry count limit exceeded.
    EntryCount {
        /// Current entry count.
        current: usize,
        /// Maximum allowed entry count.
        max: usize,
    },
    /// Total extracted size limit exceeded.
    TotalSize {
        /// Current total size in bytes.
        current: u64,
        /// Maximum allowed total size in bytes.
        max: u64,
    },
    /// Single entry size limit exceeded.
    FileSize {
        /// Entry size in bytes.
        size: u64,
        /// Maximum allowed entry size in bytes.
        max: u64,
    },
    /// Integer overflow detected in quota tracking.
    IntegerOverflow,
}

impl std::fmt::Display for QuotaResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntryCount { current, max } => {
                write!(f, "quota exceeded: entry count ({current} > {max})")
            }
            Self::TotalSize { current, max } => {
                write!(f, "quota exceeded: total size ({current} > {max})")
            }
            Self::FileSize { size, max } => {
                write!(f, "quota exceeded: single file size ({size} > {max})")
            }
            Self::IntegerOverflow => {
                write!(f, "quota exceeded: integer overflow in quota tracking")
            }
        }
    }
}

/// Errors raised by the archive guard, the sanitizer and the config loader.
#[derive(Error, Debug)]
pub enum GuardError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload carried no usable filename.
    #[error("filename required")]
    FilenameRequired,

    /// An archive entry has a denied file type.
    #[error("file {file} type {file_type} denied")]
    DeniedType {
        /// Name of the offending file.
        file: String,
        /// Detected (lower-cased) type token.
        file_type: String,
    },

    /// Archive is corrupted or unreadable.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Archive entry name would land outside the workspace.
    #[error("unsafe entry path: {path}")]
    UnsafeEntryPath {
        /// The raw entry name.
        path: PathBuf,
    },

    /// Potential zip bomb detected.
    #[error(
        "potential zip bomb: compressed={compressed} bytes, uncompressed={uncompressed} bytes (ratio: {ratio:.2})"
    )]
    ZipBomb {
        /// Compressed size in bytes.
        compressed: u64,
        /// Uncompressed size in bytes.
        uncompressed: u64,
        /// Compression ratio.
        ratio: f64,
    },

    /// Extraction limit exceeded.
    #[error("{resource}")]
    QuotaExceeded {
        /// Description of the exceeded resource.
        resource: QuotaResource,
    },

    /// Extraction ran past its deadline.
    #[error("archive extraction timed out after {elapsed_ms} ms")]
    Timeout {
        /// Milliseconds spent before giving up.
        elapsed_ms: u128,
    },

    /// A request value was rejected by the sanitizer.
    #[error("parameter invalid, url: {path}")]
    InvalidParameter {
        /// Request path of the rejected request.
        path: String,
    },

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GuardError {
    /// Returns `true` if the error was caused by the client's input.
    ///
    /// Client errors are reported back as a failed `Outcome` carrying
    /// [`client_message`](Self::client_message). Everything else is an
    /// internal fault.
    ///
    /// # Examples
    ///
    /// ```
    /// use upguard_core::GuardError;
    ///
    /// assert!(GuardError::FilenameRequired.is_client_error());
    /// assert!(!GuardError::Config("bad".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::FilenameRequired
                | Self::DeniedType { .. }
                | Self::InvalidArchive(_)
                | Self::UnsafeEntryPath { .. }
                | Self::ZipBomb { .. }
                | Self::QuotaExceeded { .. }
                | Self::Timeout { .. }
                | Self::InvalidParameter { .. }
        )
    }

    /// Returns the message shown to the client.
    ///
    /// Never contains a rejected parameter value. Entry paths are reduced
    /// to their file name.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::UnsafeEntryPath { path } => format!(
                "unsafe entry path: {}",
                path.file_name()
                    .map_or_else(|| "?".into(), |n| n.to_string_lossy())
            ),
            Self::Io(_) | Self::Config(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::FilenameRequired => "FILENAME_REQUIRED",
            Self::DeniedType { .. } => "DENIED_TYPE",
            Self::InvalidArchive(_) => "INVALID_ARCHIVE",
            Self::UnsafeEntryPath { .. } => "UNSAFE_ENTRY_PATH",
            Self::ZipBomb { .. } => "ZIP_BOMB",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::Config(_) => "CONFIG",
        }
    }

    /// Returns `true` if the error came from reading or writing an
    /// individual archive entry, the class of failures the
    /// [`EntryErrorPolicy`](crate::config::EntryErrorPolicy) governs.
    #[must_use]
    pub const fn is_entry_error(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::InvalidArchive(_) | Self::UnsafeEntryPath { .. }
        )
    }

    /// Returns the quota resource that was exceeded, if applicable.
    #[must_use]
    pub const fn quota_resource(&self) -> Option<&QuotaResource> {
        match self {
            Self::QuotaExceeded { resource } => Some(resource),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for GuardError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}

//! Extraction quota tracking and validation.

use crate::GuardError;
use crate::Result;
use crate::config::UploadConfig;
use crate::error::QuotaResource;

/// Tracks resource usage while an archive is unpacked.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    entries_seen: usize,
    bytes_written: u64,
}

impl QuotaTracker {
    /// Creates a new quota tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one archive entry, directory or file.
    ///
    /// # Errors
    ///
    /// Returns an error once more than `max_entries` entries were seen.
    pub fn record_entry(&mut self, config: &UploadConfig) -> Result<()> {
        self.entries_seen += 1;
        if self.entries_seen > config.max_entries {
            return Err(GuardError::QuotaExceeded {
                resource: QuotaResource::EntryCount {
                    current: self.entries_seen,
                    max: config.max_entries,
                },
            });
        }
        Ok(())
    }

    /// Bytes the next entry may still write: the smaller of the single file
    /// limit and what is left of the total budget.
    #[must_use]
    pub fn remaining_for_entry(&self, config: &UploadConfig) -> u64 {
        config
            .max_file_size
            .min(config.max_total_size.saturating_sub(self.bytes_written))
    }

    /// Records bytes written for one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the total size budget is exceeded.
    pub fn record_bytes(&mut self, size: u64, config: &UploadConfig) -> Result<()> {
        self.bytes_written = self
            .bytes_written
            .checked_add(size)
            .ok_or(GuardError::QuotaExceeded {
                resource: QuotaResource::IntegerOverflow,
            })?;

        if self.bytes_written > config.max_total_size {
            return Err(GuardError::QuotaExceeded {
                resource: QuotaResource::TotalSize {
                    current: self.bytes_written,
                    max: config.max_total_size,
                },
            });
        }

        Ok(())
    }

    /// Returns the total bytes written.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

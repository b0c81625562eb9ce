//! Zip extraction into a per-check scratch workspace.
//!
//! The workspace is a randomly named directory under the configured temp
//! root. It owns the persisted upload and everything unpacked from it and
//! is removed when the [`Workspace`] is closed or dropped.

use std::fs::File;
use std::fs::create_dir_all;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::CheckReport;
use crate::GuardError;
use crate::Result;
use crate::config::EntryErrorPolicy;
use crate::config::UploadConfig;
use crate::copy::CopyBuffer;
use crate::copy::copy_bounded;
use crate::error::QuotaResource;
use crate::security::Deadline;
use crate::security::EntrySizes;
use crate::security::QuotaTracker;
use crate::security::check_declared;
use crate::security::check_produced;

/// Scratch directory exclusive to one upload check.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    archive: Option<PathBuf>,
}

impl Workspace {
    /// Creates a fresh, randomly named workspace under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix("upguard-zip-")
            .tempdir_in(root)?;
        tracing::debug!(workspace = %dir.path().display(), "workspace created");
        Ok(Self { dir, archive: None })
    }

    /// Returns the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the uploaded bytes into the workspace under a random `.zip`
    /// name and returns that path.
    pub fn persist_archive(&mut self, data: &[u8]) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".zip")
            .tempfile_in(self.dir.path())?;
        file.write_all(data)?;
        file.flush()?;
        let (_, path) = file.keep().map_err(|e| GuardError::Io(e.error))?;
        self.archive = Some(path.clone());
        Ok(path)
    }

    /// Iterates every regular file in the workspace except the persisted
    /// upload, in file-name order. Symlinks are not followed.
    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(self.dir.path())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if self.archive.as_deref() == Some(entry.path()) {
                        None
                    } else {
                        Some(Ok(entry.into_path()))
                    }
                }
                Ok(_) => None,
                Err(e) => Some(Err(GuardError::Io(e.into()))),
            })
    }

    /// Removes the workspace and everything in it.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(workspace = %path.display(), error = %e, "failed to remove workspace");
        }
    }
}

/// Unpacks the zip at `archive_path` into `dest`.
///
/// Entry errors (unreadable entries, unsafe names, write failures) are
/// handled according to `config.entry_errors`. Limit violations always
/// abort.
pub fn extract_zip(
    archive_path: &Path,
    dest: &Path,
    config: &UploadConfig,
    deadline: Option<&Deadline>,
    report: &mut CheckReport,
) -> Result<()> {
    let reader = BufReader::new(File::open(archive_path)?);
    let mut archive = match ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(e) => {
            return tolerate(GuardError::from(e), "<archive>", config, report);
        }
    };

    if archive.len() > config.max_entries {
        return Err(GuardError::QuotaExceeded {
            resource: QuotaResource::EntryCount {
                current: archive.len(),
                max: config.max_entries,
            },
        });
    }

    let mut quota = QuotaTracker::new();
    let mut buffer = CopyBuffer::new();

    for index in 0..archive.len() {
        if let Some(deadline) = deadline {
            deadline.check()?;
        }
        quota.record_entry(config)?;

        let mut ctx = EntryContext {
            dest,
            config,
            deadline,
            quota: &mut quota,
            buffer: &mut buffer,
        };
        match extract_entry(&mut archive, index, &mut ctx) {
            Ok(Extracted::File) => report.entries_extracted += 1,
            Ok(Extracted::Directory) => report.directories_created += 1,
            Err(e) => tolerate(e, &format!("entry #{index}"), config, report)?,
        }
    }

    report.bytes_written = quota.bytes_written();
    Ok(())
}

fn tolerate(
    err: GuardError,
    what: &str,
    config: &UploadConfig,
    report: &mut CheckReport,
) -> Result<()> {
    if !err.is_entry_error() || config.entry_errors == EntryErrorPolicy::FailFast {
        return Err(err);
    }
    tracing::warn!(entry = what, error = %err, "skipping unreadable archive entry");
    report.add_warning(format!("{what}: {err}"));
    Ok(())
}

enum Extracted {
    File,
    Directory,
}

struct EntryContext<'a> {
    dest: &'a Path,
    config: &'a UploadConfig,
    deadline: Option<&'a Deadline>,
    quota: &'a mut QuotaTracker,
    buffer: &'a mut CopyBuffer,
}

fn extract_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    ctx: &mut EntryContext<'_>,
) -> Result<Extracted> {
    let mut entry = archive.by_index(index)?;
    let name = entry.name().to_string();
    let Some(relative) = entry.enclosed_name() else {
        return Err(GuardError::UnsafeEntryPath {
            path: PathBuf::from(name),
        });
    };

    let compressed = entry.compressed_size();
    check_declared(
        EntrySizes {
            compressed,
            uncompressed: entry.size(),
        },
        ctx.config,
    )?;

    let target = ctx.dest.join(&relative);
    if entry.is_dir() || is_bare_directory(&relative, entry.size()) {
        create_dir_all(&target)?;
        tracing::debug!(entry = %name, "created directory");
        return Ok(Extracted::Directory);
    }

    if let Some(parent) = target.parent() {
        create_dir_all(parent)?;
    }

    let limit = ctx.quota.remaining_for_entry(ctx.config);
    let mut writer = BufWriter::with_capacity(64 * 1024, File::create(&target)?);
    let written = match copy_bounded(&mut entry, &mut writer, ctx.buffer, limit, ctx.deadline) {
        Ok(n) => n,
        Err(GuardError::QuotaExceeded {
            resource: QuotaResource::FileSize { size, .. },
        }) if limit < ctx.config.max_file_size => {
            return Err(GuardError::QuotaExceeded {
                resource: QuotaResource::TotalSize {
                    current: ctx.quota.bytes_written().saturating_add(size),
                    max: ctx.config.max_total_size,
                },
            });
        }
        Err(e) => return Err(e),
    };
    writer.flush()?;
    check_produced(compressed, written, ctx.config)?;
    ctx.quota.record_bytes(written, ctx.config)?;

    tracing::debug!(entry = %name, bytes = written, "extracted entry");
    Ok(Extracted::File)
}

/// An entry without an extension and without data is a directory written
/// without the trailing slash.
fn is_bare_directory(relative: &Path, size: u64) -> bool {
    size == 0
        && relative
            .file_name()
            .is_some_and(|name| !name.to_string_lossy().contains('.'))
}

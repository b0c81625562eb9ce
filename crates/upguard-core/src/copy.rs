//! Bounded copy of archive entry data with a reusable buffer.
//!
//! Entry headers can lie about their uncompressed size, so the number of
//! bytes actually produced by the decompressor is what gets counted. The
//! copy stops as soon as the per-entry limit is crossed or the extraction
//! deadline passes.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::GuardError;
use crate::Result;
use crate::error::QuotaResource;
use crate::security::Deadline;

/// Buffer size for I/O operations (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Stack-allocated buffer reused for every entry of one extraction.
#[derive(Debug)]
pub struct CopyBuffer {
    #[allow(clippy::large_stack_arrays)]
    buf: [u8; COPY_BUFFER_SIZE],
}

impl CopyBuffer {
    /// Creates a new zero-initialized copy buffer.
    #[inline]
    #[must_use]
    #[allow(clippy::large_stack_arrays)]
    pub fn new() -> Self {
        Self {
            buf: [0u8; COPY_BUFFER_SIZE],
        }
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies at most `limit` bytes from `reader` to `writer`.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// - `GuardError::QuotaExceeded` with `QuotaResource::FileSize` once the
///   reader yields more than `limit` bytes
/// - `GuardError::Timeout` if `deadline` passes between two chunks
/// - `GuardError::Io` on read or write failure
///
/// # Examples
///
/// ```
/// use upguard_core::copy::{CopyBuffer, copy_bounded};
///
/// let mut buffer = CopyBuffer::new();
/// let mut out = Vec::new();
/// let n = copy_bounded(&mut &b"hello"[..], &mut out, &mut buffer, 16, None).unwrap();
/// assert_eq!(n, 5);
///
/// let too_big = copy_bounded(&mut &b"hello"[..], &mut Vec::new(), &mut buffer, 4, None);
/// assert!(too_big.is_err());
/// ```
pub fn copy_bounded<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
    limit: u64,
    deadline: Option<&Deadline>,
) -> Result<u64> {
    let mut total: u64 = 0;

    loop {
        if let Some(deadline) = deadline {
            deadline.check()?;
        }

        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(GuardError::Io(e)),
        };

        total = total
            .checked_add(bytes_read as u64)
            .ok_or(GuardError::QuotaExceeded {
                resource: QuotaResource::IntegerOverflow,
            })?;
        if total > limit {
            return Err(GuardError::QuotaExceeded {
                resource: QuotaResource::FileSize {
                    size: total,
                    max: limit,
                },
            });
        }

        writer.write_all(&buffer.buf[..bytes_read])?;
    }

    Ok(total)
}

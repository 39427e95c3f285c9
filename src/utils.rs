//! Utility helpers for page size and safe range calculations.

use crate::errors::{MappedFileError, Result};

/// Get the system page size in bytes.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    page_size.max(1) as usize
}

/// Align a value down to the nearest multiple of `alignment`.
#[must_use]
pub fn align_down(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return value;
    }
    if alignment.is_power_of_two() {
        value & !(alignment - 1)
    } else {
        value - value % alignment
    }
}

/// Ensure the requested [offset, offset+len) range is within [0, total).
///
/// # Errors
///
/// Returns `MappedFileError::OutOfBounds` if the range exceeds bounds.
pub fn ensure_in_bounds(offset: u64, len: u64, total: u64) -> Result<()> {
    let end = offset.saturating_add(len);
    if offset > total || end > total {
        return Err(MappedFileError::OutOfBounds { offset, len, total });
    }
    Ok(())
}

/// Validate a range and return it as `start..end` indices.
///
/// # Errors
///
/// Returns `MappedFileError::OutOfBounds` if the requested range exceeds the total length.
#[allow(clippy::cast_possible_truncation)]
pub fn slice_range(offset: u64, len: u64, total: u64) -> Result<(usize, usize)> {
    ensure_in_bounds(offset, len, total)?;
    // total is the length of a live mapping, so it fits in usize
    Ok((offset as usize, (offset + len) as usize))
}

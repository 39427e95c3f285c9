//! Memory advise operations for optimizing OS behavior.

use crate::errors::{MappedFileError, Result};
use crate::mmap::MappedFile;
use crate::utils::{align_down, page_size, slice_range};

const ERR_DONTNEED_PRIVATE: &str = "DontNeed would discard private copy-on-write pages";

/// Memory access pattern advice for the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmapAdvice {
    /// Normal access pattern (default).
    Normal,
    /// Random access pattern.
    Random,
    /// Sequential access pattern.
    Sequential,
    /// Will need this range soon.
    WillNeed,
    /// Won't need this range soon.
    DontNeed,
}

impl MmapAdvice {
    fn as_raw(self) -> libc::c_int {
        match self {
            Self::Normal => libc::MADV_NORMAL,
            Self::Random => libc::MADV_RANDOM,
            Self::Sequential => libc::MADV_SEQUENTIAL,
            Self::WillNeed => libc::MADV_WILLNEED,
            Self::DontNeed => libc::MADV_DONTNEED,
        }
    }
}

impl MappedFile {
    /// Advise the OS about expected access patterns for a range of the mapping.
    ///
    /// The advice is a hint and may be ignored. The start of the range is rounded
    /// down to a page boundary.
    ///
    /// # Errors
    ///
    /// Returns `MappedFileError::OutOfBounds` if the range exceeds the mapping
    /// (an unmapped instance has length zero).
    /// Returns `MappedFileError::UnsupportedMode` for `DontNeed` on a private
    /// writable mapping, where it would discard this process's private writes.
    /// Returns `MappedFileError::AdviceFailed` if `madvise` fails.
    pub fn advise(&self, offset: u64, len: u64, advice: MmapAdvice) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let (start, end) = slice_range(offset, len, self.len() as u64)?;
        let Some(region) = self.region() else {
            return Ok(());
        };
        let flags = region.flags();
        if advice == MmapAdvice::DontNeed && flags.writable() && !flags.shared() {
            return Err(MappedFileError::UnsupportedMode(ERR_DONTNEED_PRIVATE));
        }
        let aligned = align_down(start, page_size());
        region
            .advise(aligned, end - aligned, advice.as_raw())
            .map_err(|source| MappedFileError::AdviceFailed { source })
    }
}

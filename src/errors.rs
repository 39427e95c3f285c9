//! Crate-specific error types for mapped-file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for mapped-file operations.
pub type Result<T> = std::result::Result<T, MappedFileError>;

/// Error type covering the stat/open/map sequence and misuse of a mapping.
#[derive(Debug, Error)]
pub enum MappedFileError {
    /// Querying the file's metadata failed (missing file, inaccessible path component, ...).
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        /// Path that was queried.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The file exists but could not be opened with the requested access.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The file was opened but the OS declined to map it.
    #[error("failed to map {}: {source}", path.display())]
    Map {
        /// Path that was mapped.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// `map` was called on an instance that already holds a mapping.
    #[error("file is already mapped")]
    AlreadyMapped,

    /// The instance was explicitly released and cannot be mapped again.
    #[error("mapping has been released")]
    Released,

    /// The configured access mode cannot be used for this operation.
    #[error("unsupported access mode: {0}")]
    UnsupportedMode(&'static str),

    /// The file size does not fit into the address space.
    #[error("file too large to map: {size} bytes")]
    TooLarge {
        /// Size reported by the file's metadata.
        size: u64,
    },

    /// Error when a requested offset/length pair is out of bounds.
    #[error("range out of bounds: offset={offset}, len={len}, total={total}")]
    OutOfBounds {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Total size of the mapping.
        total: u64,
    },

    /// `msync` reported an error.
    #[error("flush failed: {source}")]
    FlushFailed {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// `madvise` reported an error.
    #[error("advice failed: {source}")]
    AdviceFailed {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl MappedFileError {
    /// The OS error code behind this error, if it came from a system call.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Stat { source, .. }
            | Self::Open { source, .. }
            | Self::Map { source, .. }
            | Self::FlushFailed { source }
            | Self::AdviceFailed { source } => source.raw_os_error(),
            _ => None,
        }
    }

    /// The `io::ErrorKind` of the underlying OS error, if any.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Stat { source, .. }
            | Self::Open { source, .. }
            | Self::Map { source, .. }
            | Self::FlushFailed { source }
            | Self::AdviceFailed { source } => Some(source.kind()),
            _ => None,
        }
    }
}

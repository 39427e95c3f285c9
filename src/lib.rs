//! # mapped-file: map a file into memory as a byte buffer
//!
//! This crate maps a whole file into the process address space and exposes it as
//! a contiguous byte region, read-only or read-write, private or shared. The
//! owning [`MappedFile`] unmaps the region and then closes its descriptor when it
//! is dropped or released, on every exit path.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mapped_file::{MappedFile, MapVisibility, OpenMode};
//!
//! let mut file = MappedFile::new("data.bin");
//! file.config_mut().open_mode = OpenMode::ReadWrite;
//! file.config_mut().map_visibility = MapVisibility::Shared;
//!
//! let mut view = file.map()?;
//! view.as_mut_slice()?[0] = b'!';
//! drop(view);
//!
//! file.flush()?;
//! # Ok::<(), mapped_file::MappedFileError>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: Error types for the stat/open/map sequence
//! - [`config`]: Path, open mode and visibility
//! - [`flags`]: Pure translation of a configuration into POSIX flags
//! - [`mmap`]: Core `MappedFile` implementation
//! - [`manager`]: One-call convenience functions
//! - [`utils`]: Page size and bounds helpers
//!
//! ## Feature Flags
//!
//! - `advise` (default): `MappedFile::advise` via `madvise`

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

cfg_if::cfg_if! {
    if #[cfg(not(unix))] {
        compile_error!("mapped-file requires a POSIX platform");
    }
}

pub mod config;
pub mod errors;
pub mod flags;
pub mod manager;
pub mod mmap;
pub mod utils;

#[cfg(feature = "advise")]
pub mod advise;

mod region;

pub use config::{MapConfig, MapVisibility, OpenMode};
pub use errors::MappedFileError;
pub use flags::MapFlags;
pub use manager::{map_file, map_with};
pub use mmap::{BufferView, MapState, MappedFile};

#[cfg(feature = "advise")]
pub use advise::MmapAdvice;

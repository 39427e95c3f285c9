//! Convenience functions that construct and map in one step.

use std::path::Path;

use crate::config::MapConfig;
use crate::errors::Result;
use crate::mmap::MappedFile;

/// Map `path` read-only and private, returning the owning instance.
///
/// # Errors
///
/// Returns errors from [`MappedFile::map`].
pub fn map_file<P: AsRef<Path>>(path: P) -> Result<MappedFile> {
    map_with(MapConfig::new(path))
}

/// Map according to `config`, returning the owning instance.
///
/// # Errors
///
/// Returns errors from [`MappedFile::map`].
pub fn map_with(config: MapConfig) -> Result<MappedFile> {
    let mut file = MappedFile::with_config(config);
    file.map()?;
    Ok(file)
}

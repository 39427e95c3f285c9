//! Configuration describing which file to map and how.

use std::path::{Path, PathBuf};

/// Access mode the file is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read-only access.
    #[default]
    ReadOnly,
    /// Write-only access. Rejected by [`MappedFile::map`](crate::MappedFile::map).
    WriteOnly,
    /// Read-write access.
    ReadWrite,
}

/// Visibility of writes made through the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapVisibility {
    /// Copy-on-write mapping. Writes stay in this process and never reach the file.
    #[default]
    Private,
    /// Writes are visible to other mappers and carried back to the file.
    Shared,
}

/// Path, open mode and visibility for a single mapping.
///
/// The path is fixed at construction; mode and visibility may be changed until
/// the configuration is used to map. Changing them afterwards does not affect a
/// mapping that already exists.
///
/// ```
/// use mapped_file::{MapConfig, MapVisibility, OpenMode};
///
/// let config = MapConfig::new("data.bin")
///     .with_open_mode(OpenMode::ReadWrite)
///     .with_visibility(MapVisibility::Shared);
/// assert_eq!(config.path().to_str(), Some("data.bin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConfig {
    path: PathBuf,
    /// How the file is opened; also selects the memory protection.
    pub open_mode: OpenMode,
    /// Whether writes are private to this mapping or shared.
    pub map_visibility: MapVisibility,
}

impl MapConfig {
    /// Configuration for `path`, read-only and private.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            open_mode: OpenMode::default(),
            map_visibility: MapVisibility::default(),
        }
    }

    /// Set the open mode.
    #[must_use]
    pub fn with_open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Set the mapping visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: MapVisibility) -> Self {
        self.map_visibility = visibility;
        self
    }

    /// Path of the file to map.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_read_only_private() {
        let config = MapConfig::new("/does/not/matter");
        assert_eq!(config.open_mode, OpenMode::ReadOnly);
        assert_eq!(config.map_visibility, MapVisibility::Private);
        assert_eq!(config.path(), Path::new("/does/not/matter"));
    }

    #[test]
    fn setters_chain() {
        let config = MapConfig::new("x")
            .with_open_mode(OpenMode::ReadWrite)
            .with_visibility(MapVisibility::Shared);
        assert_eq!(config.open_mode, OpenMode::ReadWrite);
        assert_eq!(config.map_visibility, MapVisibility::Shared);
    }
}

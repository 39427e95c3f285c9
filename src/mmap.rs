//! The mapping lifecycle: stat, open, mmap, and ordered teardown.

use std::fs::{self, File};
use std::ops::Deref;
use std::os::fd::AsFd;
use std::path::Path;

use log::debug;

use crate::config::{MapConfig, MapVisibility, OpenMode};
use crate::errors::{MappedFileError, Result};
use crate::flags::MapFlags;
use crate::region::MappedRegion;
use crate::utils::{align_down, page_size, slice_range};

const ERR_WRITE_ONLY: &str = "write-only files cannot be mapped";

/// Lifecycle state of a [`MappedFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    /// No mapping and no open descriptor.
    Unmapped,
    /// A mapping and its descriptor are held.
    Mapped,
    /// Resources were released; the instance cannot map again.
    Released,
}

/// A file mapped into memory.
///
/// Construction does no I/O. [`map`](Self::map) stats, opens and maps the file
/// and returns a [`BufferView`] borrowing this instance. Dropping the instance,
/// or calling [`release`](Self::release), unmaps the region and then closes the
/// descriptor.
///
/// # Examples
///
/// ```no_run
/// use mapped_file::MappedFile;
///
/// let mut file = MappedFile::new("README.md");
/// let view = file.map()?;
/// let text = String::from_utf8_lossy(&view);
/// println!("{text}");
/// # Ok::<(), mapped_file::MappedFileError>(())
/// ```
pub struct MappedFile {
    config: MapConfig,
    region: Option<MappedRegion>,
    file: Option<File>,
    released: bool,
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.config.path())
            .field("open_mode", &self.config.open_mode)
            .field("map_visibility", &self.config.map_visibility)
            .field("state", &self.state())
            .field("len", &self.len())
            .finish()
    }
}

impl MappedFile {
    /// Prepare to map `path` read-only and private. Performs no I/O.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_config(MapConfig::new(path))
    }

    /// Prepare to map using an existing configuration. Performs no I/O.
    #[must_use]
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            config,
            region: None,
            file: None,
            released: false,
        }
    }

    /// The configuration this instance maps with.
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Mutable access to the open mode and visibility.
    ///
    /// Changes only apply to the next call to [`map`](Self::map).
    pub fn config_mut(&mut self) -> &mut MapConfig {
        &mut self.config
    }

    /// Path of the file to map.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.config.path()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MapState {
        if self.released {
            MapState::Released
        } else if self.region.is_some() {
            MapState::Mapped
        } else {
            MapState::Unmapped
        }
    }

    /// Whether a mapping is currently held.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.region.is_some()
    }

    /// Length of the mapping in bytes, or zero when unmapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.as_ref().map_or(0, MappedRegion::len)
    }

    /// Whether the mapping is absent or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flags of the current mapping, as translated when it was created.
    #[must_use]
    pub fn flags(&self) -> Option<MapFlags> {
        self.region.as_ref().map(MappedRegion::flags)
    }

    /// Map the whole file and return a view of it.
    ///
    /// The size is taken from the file's metadata at this moment and is not
    /// re-checked later. On failure nothing stays open.
    ///
    /// # Errors
    ///
    /// - `AlreadyMapped` / `Released` if the instance is not in the unmapped state.
    /// - `UnsupportedMode` if the open mode is write-only.
    /// - `Stat`, `Open` or `Map` carrying the OS error of the failing step.
    /// - `TooLarge` if the size does not fit in `usize`.
    pub fn map(&mut self) -> Result<BufferView<'_>> {
        match self.state() {
            MapState::Mapped => return Err(MappedFileError::AlreadyMapped),
            MapState::Released => return Err(MappedFileError::Released),
            MapState::Unmapped => {}
        }
        if self.config.open_mode == OpenMode::WriteOnly {
            return Err(MappedFileError::UnsupportedMode(ERR_WRITE_ONLY));
        }

        let path = self.config.path();
        let size = fs::metadata(path)
            .map_err(|source| MappedFileError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let len = usize::try_from(size).map_err(|_| MappedFileError::TooLarge { size })?;

        let flags = MapFlags::translate(self.config.open_mode, self.config.map_visibility);

        let file = flags
            .open_options()
            .open(path)
            .map_err(|source| MappedFileError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        // `file` is dropped, and so closed, before the error leaves this function.
        let region = MappedRegion::map(file.as_fd(), len, flags).map_err(|source| {
            MappedFileError::Map {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!(
            "mapped {} ({} bytes, {:?}, {:?})",
            path.display(),
            len,
            self.config.open_mode,
            self.config.map_visibility
        );

        self.file = Some(file);
        let region = self.region.insert(region);
        Ok(BufferView { region })
    }

    /// Re-borrow the view of the current mapping.
    pub fn view(&mut self) -> Option<BufferView<'_>> {
        self.region.as_mut().map(|region| BufferView { region })
    }

    /// The mapped bytes, if mapped.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[u8]> {
        self.region.as_ref().map(MappedRegion::as_slice)
    }

    /// The mapped bytes, if mapped with write access.
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        self.region
            .as_mut()
            .filter(|region| region.flags().writable())
            .map(MappedRegion::as_mut_slice)
    }

    /// Flush the whole mapping to the file. No-op unless the mapping is shared and writable.
    ///
    /// # Errors
    ///
    /// Returns `MappedFileError::FlushFailed` if `msync` fails.
    pub fn flush(&self) -> Result<()> {
        self.flush_range(0, self.len() as u64)
    }

    /// Flush `[offset, offset+len)` to the file. No-op unless the mapping is shared and writable.
    ///
    /// # Errors
    ///
    /// Returns `MappedFileError::OutOfBounds` if the range exceeds the mapping.
    /// Returns `MappedFileError::FlushFailed` if `msync` fails.
    pub fn flush_range(&self, offset: u64, len: u64) -> Result<()> {
        let Some(region) = &self.region else {
            return Ok(());
        };
        let (start, end) = slice_range(offset, len, region.len() as u64)?;
        let flags = region.flags();
        if start == end || !flags.shared() || !flags.writable() {
            return Ok(());
        }
        // msync wants a page-aligned address
        let aligned = align_down(start, page_size());
        region
            .sync(aligned, end - aligned)
            .map_err(|source| MappedFileError::FlushFailed { source })
    }

    /// Unmap the region, then close the descriptor.
    ///
    /// The instance moves to [`MapState::Released`] and cannot be mapped again.
    /// Dropping the instance does the same.
    pub fn release(&mut self) {
        self.teardown();
        self.released = true;
    }

    fn teardown(&mut self) {
        if let Some(region) = self.region.take() {
            drop(region);
        }
        if let Some(file) = self.file.take() {
            drop(file);
            debug!("released {}", self.config.path().display());
        }
    }

    #[cfg(feature = "advise")]
    pub(crate) fn region(&self) -> Option<&MappedRegion> {
        self.region.as_ref()
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Non-owning view of a mapping, borrowed from its [`MappedFile`].
///
/// Dereferences to the mapped bytes.
pub struct BufferView<'a> {
    region: &'a mut MappedRegion,
}

impl std::fmt::Debug for BufferView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("ptr", &self.as_ptr())
            .field("len", &self.len())
            .finish()
    }
}

impl BufferView<'_> {
    /// Start address of the mapping.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.region.as_ptr()
    }

    /// Length of the mapping in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the mapping was created with write access.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.region.flags().writable()
    }

    /// The mapped bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.region.as_slice()
    }

    /// The mapped bytes, writable.
    ///
    /// Writes reach the file only for shared mappings.
    ///
    /// # Errors
    ///
    /// Returns `MappedFileError::UnsupportedMode` for read-only mappings.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        if !self.is_writable() {
            return Err(MappedFileError::UnsupportedMode(
                "mutable access on read-only mapping",
            ));
        }
        Ok(self.region.as_mut_slice())
    }

    /// Visibility the mapping was created with.
    #[must_use]
    pub fn visibility(&self) -> MapVisibility {
        if self.region.flags().shared() {
            MapVisibility::Shared
        } else {
            MapVisibility::Private
        }
    }
}

impl Deref for BufferView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for BufferView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(contents: &[u8]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("tempfile");
        tmp.write_all(contents).expect("write");
        tmp.flush().expect("flush");
        tmp
    }

    #[test]
    fn new_holds_nothing() {
        let mf = MappedFile::new("/definitely/not/here");
        assert_eq!(mf.state(), MapState::Unmapped);
        assert!(mf.file.is_none());
        assert!(mf.region.is_none());
        assert_eq!(mf.len(), 0);
    }

    #[test]
    fn stat_failure_leaves_nothing_open() {
        let mut mf = MappedFile::new("/definitely/not/here");
        let err = mf.map().expect_err("missing file");
        assert!(matches!(err, MappedFileError::Stat { .. }));
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        assert!(mf.file.is_none());
        assert!(mf.region.is_none());
        assert_eq!(mf.state(), MapState::Unmapped);
    }

    #[test]
    fn map_failure_closes_descriptor() {
        let tmp = temp_with(b"");
        let mut mf = MappedFile::new(tmp.path());
        let err = mf.map().expect_err("zero-length mapping");
        assert!(matches!(err, MappedFileError::Map { .. }));
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
        assert!(mf.file.is_none());
        assert!(mf.region.is_none());
        assert_eq!(mf.state(), MapState::Unmapped);
    }

    #[test]
    fn success_holds_descriptor_and_region() {
        let tmp = temp_with(b"abc");
        let mut mf = MappedFile::new(tmp.path());
        assert_eq!(mf.map().expect("map").len(), 3);
        assert!(mf.file.is_some());
        assert!(mf.region.is_some());
        assert_eq!(mf.state(), MapState::Mapped);

        mf.release();
        assert!(mf.file.is_none());
        assert!(mf.region.is_none());
        assert_eq!(mf.state(), MapState::Released);
    }

    #[test]
    fn guards_reject_misuse() {
        let tmp = temp_with(b"abc");
        let mut mf = MappedFile::new(tmp.path());
        mf.map().expect("map");
        assert!(matches!(mf.map(), Err(MappedFileError::AlreadyMapped)));

        mf.release();
        assert!(matches!(mf.map(), Err(MappedFileError::Released)));

        let mut wo = MappedFile::new(tmp.path());
        wo.config_mut().open_mode = OpenMode::WriteOnly;
        assert!(matches!(wo.map(), Err(MappedFileError::UnsupportedMode(_))));
        assert!(wo.file.is_none());
    }

    #[test]
    fn config_changes_do_not_touch_live_mapping() {
        let tmp = temp_with(b"abc");
        let mut mf = MappedFile::new(tmp.path());
        mf.map().expect("map");
        mf.config_mut().open_mode = OpenMode::ReadWrite;
        mf.config_mut().map_visibility = MapVisibility::Shared;

        let flags = mf.flags().expect("mapped");
        assert!(!flags.writable());
        assert!(!flags.shared());
        assert!(mf.as_mut_slice().is_none());
    }

    #[test]
    fn flush_on_private_and_unmapped_is_noop() {
        let tmp = temp_with(b"abcdef");
        let mut mf = MappedFile::new(tmp.path());
        mf.flush().expect("unmapped flush");
        mf.map().expect("map");
        mf.flush().expect("private flush");
        assert!(mf.flush_range(4, 10).is_err());
    }
}

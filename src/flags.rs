//! Translation of [`OpenMode`] and [`MapVisibility`] into POSIX open, protection and mapping flags.
//!
//! Everything here is pure; nothing touches the filesystem.

use std::fs::OpenOptions;

use libc::c_int;

use crate::config::{MapVisibility, OpenMode};

/// The OS-level flag sets derived from a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapFlags {
    access: c_int,
    prot: c_int,
    flags: c_int,
}

impl MapFlags {
    /// Translate an open mode and visibility.
    #[must_use]
    pub const fn translate(mode: OpenMode, visibility: MapVisibility) -> Self {
        let (access, prot) = match mode {
            OpenMode::ReadOnly => (libc::O_RDONLY, libc::PROT_READ),
            OpenMode::WriteOnly => (libc::O_WRONLY, libc::PROT_WRITE),
            OpenMode::ReadWrite => (libc::O_RDWR, libc::PROT_READ | libc::PROT_WRITE),
        };
        let flags = match visibility {
            MapVisibility::Private => libc::MAP_PRIVATE,
            MapVisibility::Shared => libc::MAP_SHARED,
        };
        Self { access, prot, flags }
    }

    /// Access bits for `open(2)` (`O_RDONLY`, `O_WRONLY` or `O_RDWR`).
    #[must_use]
    pub const fn access(&self) -> c_int {
        self.access
    }

    /// Protection bits for `mmap(2)`.
    #[must_use]
    pub const fn prot(&self) -> c_int {
        self.prot
    }

    /// Mapping flags for `mmap(2)`.
    #[must_use]
    pub const fn flags(&self) -> c_int {
        self.flags
    }

    /// Whether the mapping can be read.
    #[must_use]
    pub const fn readable(&self) -> bool {
        self.prot & libc::PROT_READ != 0
    }

    /// Whether the mapping can be written.
    #[must_use]
    pub const fn writable(&self) -> bool {
        self.prot & libc::PROT_WRITE != 0
    }

    /// Whether writes propagate to the file.
    #[must_use]
    pub const fn shared(&self) -> bool {
        self.flags & libc::MAP_SHARED != 0
    }

    /// `OpenOptions` carrying the access bits. Never creates or truncates.
    #[must_use]
    pub fn open_options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.access != libc::O_WRONLY)
            .write(self.access != libc::O_RDONLY);
        opts
    }
}

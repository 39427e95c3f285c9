//! Owned memory region returned by `mmap`.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::ptr::{self, NonNull};
use std::slice;

use log::{trace, warn};

use crate::flags::MapFlags;

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", target_env = "gnu"))] {
        use libc::mmap64 as sys_mmap;
    } else {
        use libc::mmap as sys_mmap;
    }
}

/// A live mapping of `len` bytes at `ptr`. Unmapped exactly once, on drop.
#[derive(Debug)]
pub(crate) struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
    flags: MapFlags,
}

// SAFETY: the region is exclusively owned; the bytes are only mutated through `&mut self`.
unsafe impl Send for MappedRegion {}
// SAFETY: shared references only hand out `&[u8]`.
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Map `len` bytes of `fd` from offset zero.
    pub(crate) fn map(fd: BorrowedFd<'_>, len: usize, flags: MapFlags) -> io::Result<Self> {
        // SAFETY: a null hint lets the kernel pick the address; the fd is open for the
        // duration of the call and the resulting region is owned by the returned value.
        let addr = unsafe {
            sys_mmap(
                ptr::null_mut(),
                len,
                flags.prot(),
                flags.flags(),
                fd.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        let ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EINVAL))?;
        trace!("mmap {:p} len={} prot={:#x} flags={:#x}", ptr, len, flags.prot(), flags.flags());
        Ok(Self { ptr, len, flags })
    }

    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Flags the region was created with.
    pub(crate) fn flags(&self) -> MapFlags {
        self.flags
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: every mapping this crate creates is readable, and `len` bytes at
        // `ptr` stay mapped until drop.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above; callers check `flags.writable()` before handing this out.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// `msync(MS_SYNC)` over `[start, start+len)`; `start` must be page aligned.
    pub(crate) fn sync(&self, start: usize, len: usize) -> io::Result<()> {
        // SAFETY: the caller validated the range against this live region.
        let rc = unsafe {
            libc::msync(
                self.ptr.as_ptr().add(start).cast::<libc::c_void>(),
                len,
                libc::MS_SYNC,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(feature = "advise")]
    pub(crate) fn advise(&self, start: usize, len: usize, advice: libc::c_int) -> io::Result<()> {
        // SAFETY: the caller validated the range against this live region.
        let rc = unsafe {
            libc::madvise(
                self.ptr.as_ptr().add(start).cast::<libc::c_void>(),
                len,
                advice,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/len describe a mapping created by `map` and not yet unmapped.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast::<libc::c_void>(), self.len) };
        if rc != 0 {
            warn!("munmap {:p} len={} failed: {}", self.ptr, self.len, io::Error::last_os_error());
        } else {
            trace!("munmap {:p} len={}", self.ptr, self.len);
        }
    }
}

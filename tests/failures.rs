//! Failure paths of the stat/open/map sequence.

use mapped_file::{MapState, MappedFile, MappedFileError, OpenMode};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn missing_file_is_a_stat_failure() {
    let dir = tempdir().expect("tempdir");
    let mut mf = MappedFile::new(dir.path().join("this_file_does_not_exist"));

    let err = mf.map().expect_err("missing");
    assert!(matches!(err, MappedFileError::Stat { .. }), "{err:?}");
    assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    assert_eq!(mf.state(), MapState::Unmapped);
    assert!(!mf.is_mapped());
}

#[test]
fn unreadable_file_is_an_open_failure() {
    // SAFETY: geteuid has no preconditions.
    if unsafe { libc::geteuid() } == 0 {
        // root bypasses permission bits
        return;
    }
    let tmp = NamedTempFile::new().expect("tempfile");
    fs::write(tmp.path(), b"secret").expect("write");
    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o000)).expect("chmod");

    let mut mf = MappedFile::new(tmp.path());
    let err = mf.map().expect_err("no permission");
    assert!(
        matches!(err, MappedFileError::Open { .. } | MappedFileError::Stat { .. }),
        "{err:?}"
    );
    assert_eq!(err.raw_os_error(), Some(libc::EACCES));
    assert!(!mf.is_mapped());

    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)).expect("chmod back");
}

#[test]
fn empty_file_is_a_map_failure() {
    let tmp = NamedTempFile::new().expect("tempfile");
    let mut mf = MappedFile::new(tmp.path());

    let err = mf.map().expect_err("empty");
    assert!(matches!(err, MappedFileError::Map { .. }), "{err:?}");
    assert!(err.raw_os_error().is_some_and(|code| code != 0));
    assert_eq!(mf.state(), MapState::Unmapped);
}

#[test]
fn failed_map_can_be_retried() {
    let tmp = NamedTempFile::new().expect("tempfile");
    let mut mf = MappedFile::new(tmp.path());
    assert!(mf.map().is_err());

    fs::write(tmp.path(), b"now there is data").expect("write");
    assert_eq!(mf.map().expect("retry").len(), 17);
}

#[test]
fn directory_cannot_be_mapped() {
    let dir = tempdir().expect("tempdir");
    let mut mf = MappedFile::new(dir.path());
    assert!(mf.map().is_err());
    assert!(!mf.is_mapped());
}

#[test]
fn write_only_is_rejected_before_io() {
    let dir = tempdir().expect("tempdir");
    // The path does not exist, so any I/O would have produced a stat failure.
    let mut mf = MappedFile::new(dir.path().join("absent"));
    mf.config_mut().open_mode = OpenMode::WriteOnly;
    assert!(matches!(mf.map(), Err(MappedFileError::UnsupportedMode(_))));
}

#[test]
fn second_map_is_rejected() {
    let tmp = NamedTempFile::new().expect("tempfile");
    fs::write(tmp.path(), b"once").expect("write");
    let mut mf = MappedFile::new(tmp.path());
    mf.map().expect("first");
    assert!(matches!(mf.map(), Err(MappedFileError::AlreadyMapped)));
    assert_eq!(mf.as_slice().expect("still mapped"), b"once");
}

//! File primitives for a region directory.
//!
//! Every write that needs to survive a crash is followed by `fsync` on the
//! file and, separately, on the containing directory: without the directory
//! sync, a new file's directory entry can still be lost on crash even if
//! the file's own contents are durable.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, trace};
use memmap2::{Mmap, MmapMut};

use crate::wire;

/// Suffix appended to a segment's data-file path to name its log file.
pub const LOG_EXT: &str = ".log";

pub fn log_path(data_path: &Path) -> std::path::PathBuf {
    let mut s = data_path.as_os_str().to_owned();
    s.push(LOG_EXT);
    std::path::PathBuf::from(s)
}

/// `fsync` a directory so that directory-entry creation (new files) is
/// itself durable, not just the file contents.
pub fn fsync_dir(dir: &Path) -> io::Result<()> {
    // Opening a directory for reading is the portable way to obtain a
    // handle whose `sync_all` flushes directory metadata on unix; on
    // platforms where this isn't meaningful it is a harmless no-op.
    let dir_file = File::open(dir)?;
    dir_file.sync_all()
}

/// Ensure a data file exists at `path` with a logical length of at least
/// `want_len`, creating it (and an empty sibling log file) if absent, or
/// extending it in place (zero-filled tail) if shorter. Returns the
/// resulting logical length (`want_len` unless the file was already
/// longer than that, in which case the prior length is kept).
pub fn ensure_data(path: &Path, want_len: u32) -> io::Result<u32> {
    if !path.exists() {
        debug!("creating data file {}", path.display());
        // If any step below fails, don't leave a half-written data file
        // behind for the next `map` to trip over.
        let cleanup = scopeguard::guard(path, |path| {
            let _ = fs::remove_file(*path);
        });

        let mut file = File::create(path)?;
        wire::write_u32(&mut file, want_len)?;
        file.write_all(&vec![0u8; want_len as usize])?;
        file.sync_all()?;

        let log = log_path(path);
        File::create(&log)?.sync_all()?;

        if let Some(dir) = path.parent() {
            fsync_dir(dir)?;
        }

        scopeguard::ScopeGuard::into_inner(cleanup);
        return Ok(want_len);
    }

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let existing_len = wire::read_u32(&mut file)?.unwrap_or(0);
    if existing_len >= want_len {
        return Ok(existing_len);
    }

    debug!(
        "extending data file {} from {} to {} bytes",
        path.display(),
        existing_len,
        want_len
    );

    file.seek(SeekFrom::Start(0))?;
    wire::write_u32(&mut file, want_len)?;
    file.seek(SeekFrom::End(0))?;
    let pad = want_len - existing_len;
    file.write_all(&vec![0u8; pad as usize])?;
    file.sync_all()?;

    Ok(want_len)
}

/// Read a data file's logical length and contents in full.
pub fn read_segment(path: &Path) -> io::Result<(u32, Vec<u8>)> {
    let mut file = File::open(path)?;
    let len = wire::read_u32(&mut file)?.unwrap_or(0);
    let mut buf = vec![0u8; len as usize];
    file.read_exact(&mut buf)?;
    Ok((len, buf))
}

/// Append one redo record to `<path>.log`, `fsync`ing the log file and the
/// containing directory before returning.
pub fn append_log(data_path: &Path, record: &wire::Record) -> io::Result<()> {
    let path = log_path(data_path);
    let mut file = OpenOptions::new().append(true).open(&path)?;
    record.write(&mut file)?;
    file.sync_all()?;
    trace!("appended redo record to {}", path.display());
    Ok(())
}

/// A pair of memory maps used to replay a log onto its data file.
pub struct ReplayView {
    pub log: Mmap,
    pub data: MmapMut,
}

/// Memory-map `<path>.log` read-only and `path` read/write, for recovery.
pub fn map_for_replay(path: &Path) -> io::Result<ReplayView> {
    let log_file = File::open(log_path(path))?;
    let log = unsafe { Mmap::map(&log_file)? };

    let data_file = OpenOptions::new().read(true).write(true).open(path)?;
    let data = unsafe { MmapMut::map_mut(&data_file)? };

    Ok(ReplayView { log, data })
}

/// Truncate `<path>.log` back to zero bytes by removing and recreating it.
pub fn reset_log(path: &Path) -> io::Result<()> {
    let log = log_path(path);
    fs::remove_file(&log)?;
    File::create(&log)?.sync_all()?;
    Ok(())
}

/// Remove both the data file and its log file. Succeeds if both are
/// already absent.
pub fn remove_segment(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    match fs::remove_file(log_path(path)) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_data_creates_zero_filled_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg1");
        let len = ensure_data(&path, 16).unwrap();
        assert_eq!(len, 16);

        let (read_len, bytes) = read_segment(&path).unwrap();
        assert_eq!(read_len, 16);
        assert_eq!(bytes, vec![0u8; 16]);
        assert!(log_path(&path).exists());
    }

    #[test]
    fn ensure_data_extends_preserving_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg1");
        ensure_data(&path, 10).unwrap();

        // write some recognizable bytes directly, simulating a mapped segment
        {
            let (_, mut bytes) = read_segment(&path).unwrap();
            bytes[0..4].copy_from_slice(b"DATA");
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            wire::write_u32(&mut file, 10).unwrap();
            file.write_all(&bytes).unwrap();
        }

        ensure_data(&path, 20).unwrap();
        let (len, bytes) = read_segment(&path).unwrap();
        assert_eq!(len, 20);
        assert_eq!(&bytes[0..4], b"DATA");
        assert_eq!(&bytes[10..20], &[0u8; 10]);
    }

    #[test]
    fn append_and_reset_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg1");
        ensure_data(&path, 8).unwrap();

        append_log(
            &path,
            &wire::Record {
                offset: 0,
                data: vec![1, 2, 3],
            },
        )
        .unwrap();

        let log_bytes = fs::read(log_path(&path)).unwrap();
        assert!(!log_bytes.is_empty());

        reset_log(&path).unwrap();
        let log_bytes = fs::read(log_path(&path)).unwrap();
        assert!(log_bytes.is_empty());
    }

    #[test]
    fn remove_segment_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg1");
        ensure_data(&path, 8).unwrap();
        remove_segment(&path).unwrap();
        assert!(!path.exists());
        // calling again on already-absent files must not error
        remove_segment(&path).unwrap();
    }
}

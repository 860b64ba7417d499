//! Recovery / truncation: replay every log file in a region directory onto
//! its data file, then empty the log.
//!
//! Re-runnable by construction: applying an empty log is a no-op, and a log
//! is only ever reset *after* its replay has been synced to the data file,
//! so a crash mid-truncate just means the same (idempotent) replay happens
//! again on the next pass.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::backend::{self, LOG_EXT};
use crate::wire;

/// Scan `region_dir` for `<name>.log` files with a matching `<name>` data
/// file, replay each non-empty log onto its data file, and reset the log
/// to empty. Directory order is unspecified and does not matter: each log
/// only ever affects its own data file. The region directory is `fsync`'d
/// once for the whole call, after every log has been applied and reset,
/// since log reset recreates directory entries that must themselves be
/// durable.
pub fn truncate_log(region_dir: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(region_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let Some(_stem) = name.strip_suffix(LOG_EXT) else {
            continue;
        };

        let data_path = region_dir.join(name.strip_suffix(LOG_EXT).unwrap());
        if !data_path.is_file() {
            debug!(
                "log file {} has no matching data file, skipping",
                path.display()
            );
            continue;
        }

        apply_log(&data_path)?;
    }

    backend::fsync_dir(region_dir)?;
    Ok(())
}

/// Replay one segment's log onto its data file and reset the log to empty.
/// A no-op if the log is already empty.
fn apply_log(data_path: &Path) -> std::io::Result<()> {
    let log_len = fs::metadata(backend::log_path(data_path))?.len();
    if log_len == 0 {
        return Ok(());
    }

    let mut view = backend::map_for_replay(data_path)?;
    let mut cursor: &[u8] = &view.log[..];
    let mut applied = 0usize;

    while let Some((record, rest)) = wire::Record::read_from_slice(cursor) {
        cursor = rest;

        // The data file's own length prefix occupies the first 4 bytes;
        // record offsets are relative to the logical segment, so skip past
        // that prefix here.
        let Some(start) = (record.offset as usize).checked_add(4) else {
            warn!("log record offset overflowed for {}", data_path.display());
            break;
        };
        let Some(end) = start.checked_add(record.data.len()) else {
            warn!("log record end overflowed for {}", data_path.display());
            break;
        };
        if end > view.data.len() {
            warn!(
                "log record for {} falls outside data file bounds, discarding remainder",
                data_path.display()
            );
            break;
        }
        view.data[start..end].copy_from_slice(&record.data);
        applied += 1;
    }
    debug!("applied {applied} record(s) to {}", data_path.display());

    view.data.flush()?;
    drop(view);

    backend::reset_log(data_path)?;
    Ok(())
}

//! Transaction lifecycle: begin/about_to_modify/commit/abort over a set of
//! segments within one region.

use log::debug;

use crate::backend;
use crate::error::{Error, Result, UsageError};
use crate::region::Region;
use crate::registry::SegmentHandle;
use crate::segment::UndoEntry;
use crate::wire;

/// A bounded window during which one set of segments may be mutated
/// atomically. Holds no I/O resources of its own; all state lives in the
/// region's segment descriptors.
pub struct Transaction {
    handles: Vec<SegmentHandle>,
}

/// Lock `handles` for exclusive mutation within `region`.
///
/// All-or-nothing: every handle is resolved and checked for non-dirty
/// status before any descriptor is marked dirty. If any lookup fails, or
/// any segment is already owned by a live transaction, no descriptor is
/// touched and [`UsageError::SegmentBusy`]/[`UsageError::SegmentNotMapped`]
/// is returned.
pub fn begin_trans(region: &mut Region, handles: &[SegmentHandle]) -> Result<Transaction> {
    for &handle in handles {
        let desc = region
            .registry()
            .get(handle)
            .ok_or(Error::Usage(UsageError::SegmentNotMapped))?;
        if desc.dirty {
            return Err(Error::Usage(UsageError::SegmentBusy));
        }
    }

    for &handle in handles {
        region.registry_mut().get_mut(handle).unwrap().dirty = true;
    }

    debug!("began transaction over {} segment(s)", handles.len());
    Ok(Transaction {
        handles: handles.to_vec(),
    })
}

/// Record a pre-image of `size` bytes at `offset` in `handle`'s segment,
/// before the caller mutates it in place via [`Region::segment_mut`].
pub fn about_to_modify(
    region: &mut Region,
    tx: &Transaction,
    handle: SegmentHandle,
    offset: u32,
    size: u32,
) -> Result<()> {
    if !tx.handles.contains(&handle) {
        return Err(Error::Usage(UsageError::NotInTransaction));
    }

    let desc = region
        .registry_mut()
        .get_mut(handle)
        .ok_or(Error::Usage(UsageError::SegmentNotMapped))?;

    let end = offset
        .checked_add(size)
        .ok_or(Error::Usage(UsageError::OutOfBounds {
            offset,
            size,
            len: desc.length,
        }))?;
    if end > desc.length {
        return Err(Error::Usage(UsageError::OutOfBounds {
            offset,
            size,
            len: desc.length,
        }));
    }

    let pre_image = desc.data[offset as usize..end as usize].to_vec();
    desc.undo.push(UndoEntry { offset, pre_image });
    Ok(())
}

/// Walk each segment's undo stack oldest-first, appending one redo record
/// per entry (the current, post-mutation bytes at that offset). A segment's
/// stack is only cleared once every one of its records has actually reached
/// the log -- an append failure partway through leaves the remaining
/// entries in place rather than losing them, so the segment stays `dirty`
/// with its undo history intact for a future retry. The region directory is
/// `fsync`'d once for the whole call, after every segment's log appends
/// have completed, not once per segment.
pub fn commit_trans(region: &mut Region, tx: Transaction) -> Result<()> {
    for &handle in &tx.handles {
        let desc = region
            .registry_mut()
            .get_mut(handle)
            .ok_or(Error::Usage(UsageError::SegmentNotMapped))?;

        let path = desc.path.clone();
        for entry in desc.undo.iter_front_to_back() {
            let end = entry.offset as usize + entry.pre_image.len();
            let record = wire::Record {
                offset: entry.offset,
                data: desc.data[entry.offset as usize..end].to_vec(),
            };
            backend::append_log(&path, &record)?;
        }
        desc.undo.clear();
        desc.dirty = false;
    }

    backend::fsync_dir(region.directory())?;

    debug!("committed transaction over {} segment(s)", tx.handles.len());
    Ok(())
}

/// Pop each segment's undo entries LIFO, restoring the pre-image bytes, then
/// clear the dirty flag. No disk I/O occurs.
pub fn abort_trans(region: &mut Region, tx: Transaction) {
    for &handle in &tx.handles {
        let Some(desc) = region.registry_mut().get_mut(handle) else {
            continue;
        };
        while let Some(entry) = desc.undo.pop() {
            let end = entry.offset as usize + entry.pre_image.len();
            desc.data[entry.offset as usize..end].copy_from_slice(&entry.pre_image);
        }
        desc.dirty = false;
    }
    debug!("aborted transaction over {} segment(s)", tx.handles.len());
}

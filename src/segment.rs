//! Segment descriptors and their per-segment undo buffers.

use std::path::PathBuf;

/// One pre-image captured by `about_to_modify`, pushed in call order and
/// reverted in LIFO order on abort.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub offset: u32,
    pub pre_image: Vec<u8>,
}

/// Ordered sequence of [`UndoEntry`] for a single segment, most recent last.
///
/// Grows monotonically between `begin_trans` and transaction end: no pops
/// occur until abort (LIFO) or the transaction ends (drained on commit, in
/// push order, to produce redo records).
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
}

impl UndoStack {
    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries oldest-first, for commit's redo-record pass. Borrows
    /// rather than drains: the caller only calls [`Self::clear`] once every
    /// record for this segment has actually reached the log, so a failure
    /// partway through never loses entries that weren't yet durable.
    pub fn iter_front_to_back(&self) -> std::slice::Iter<'_, UndoEntry> {
        self.entries.iter()
    }

    /// Discard all entries. Called once commit has durably appended a redo
    /// record for every one of them, or on abort after they've been popped.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// In-memory descriptor for one mapped segment.
pub struct SegmentDescriptor {
    pub path: PathBuf,
    pub length: u32,
    pub dirty: bool,
    pub data: Box<[u8]>,
    pub undo: UndoStack,
}

impl SegmentDescriptor {
    pub fn new(path: PathBuf, length: u32, data: Vec<u8>) -> Self {
        Self {
            path,
            length,
            dirty: false,
            data: data.into_boxed_slice(),
            undo: UndoStack::default(),
        }
    }
}

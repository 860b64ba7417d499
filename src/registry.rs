//! Per-region table mapping an opaque segment handle to its descriptor.
//!
//! Node identity is never exposed to callers: they only ever see
//! [`SegmentHandle`] values, which stay stable from `map` until the
//! matching `unmap` regardless of how the underlying table reshuffles.

use std::collections::HashMap;

use crate::segment::SegmentDescriptor;

/// Opaque identity of a mapped segment within one region.
///
/// Stands in for the "in-memory base address" of the original API. It is
/// `Copy`, cheap to compare, and stable from `map` until the matching
/// `unmap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentHandle(u64);

#[derive(Default)]
pub struct Registry {
    next: u64,
    segments: HashMap<SegmentHandle, SegmentDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new descriptor, returning the handle it was assigned.
    pub fn put(&mut self, descriptor: SegmentDescriptor) -> SegmentHandle {
        let handle = SegmentHandle(self.next);
        self.next += 1;
        self.segments.insert(handle, descriptor);
        handle
    }

    pub fn get(&self, handle: SegmentHandle) -> Option<&SegmentDescriptor> {
        self.segments.get(&handle)
    }

    pub fn get_mut(&mut self, handle: SegmentHandle) -> Option<&mut SegmentDescriptor> {
        self.segments.get_mut(&handle)
    }

    pub fn erase(&mut self, handle: SegmentHandle) -> Option<SegmentDescriptor> {
        self.segments.remove(&handle)
    }

    /// Find the handle, if any, of a currently-mapped segment with the
    /// given backing path.
    pub fn find_by_path(&self, path: &std::path::Path) -> Option<SegmentHandle> {
        self.segments
            .iter()
            .find(|(_, desc)| desc.path == path)
            .map(|(handle, _)| *handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentHandle, &SegmentDescriptor)> {
        self.segments.iter().map(|(h, d)| (*h, d))
    }
}

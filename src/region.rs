//! Region manager: owns a region directory, its segment registry, and
//! orchestrates `map`/`unmap`/`destroy`/`truncate_log`.

use std::path::{Path, PathBuf};

use log::debug;

use crate::backend;
use crate::error::{Error, Result, UsageError};
use crate::recovery;
use crate::registry::{Registry, SegmentHandle};
use crate::segment::SegmentDescriptor;

/// A directory on disk holding zero or more segments, plus the in-memory
/// registry tracking which of them are currently mapped.
pub struct Region {
    directory: PathBuf,
    registry: Registry,
}

impl Region {
    /// Create the region directory if absent and return an empty region.
    pub fn init(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            registry: Registry::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn segment_path(&self, segname: &str) -> PathBuf {
        self.directory.join(segname)
    }

    /// Map `segname` into memory, creating or extending its backing data
    /// file to at least `size` bytes. Replays and truncates every log in
    /// the region directory first, exactly as the original `rvm_map` did.
    ///
    /// It is a usage error to map the same `segname` twice within a live
    /// region, or to map a name ending in `.log`.
    pub fn map(&mut self, segname: &str, size: u32) -> Result<SegmentHandle> {
        if segname.ends_with(backend::LOG_EXT) {
            return Err(Error::Usage(UsageError::ReservedSegmentName));
        }

        let path = self.segment_path(segname);
        if self.registry.find_by_path(&path).is_some() {
            return Err(Error::Usage(UsageError::AlreadyMapped));
        }

        backend::ensure_data(&path, size)?;
        recovery::truncate_log(&self.directory)?;

        let (length, data) = backend::read_segment(&path)?;
        debug!("mapped segment {segname} ({length} bytes)");

        let descriptor = SegmentDescriptor::new(path, length, data);
        Ok(self.registry.put(descriptor))
    }

    /// Unmap a previously-mapped segment, discarding its in-memory copy.
    pub fn unmap(&mut self, handle: SegmentHandle) -> Result<()> {
        self.registry
            .erase(handle)
            .ok_or(Error::Usage(UsageError::SegmentNotMapped))?;
        Ok(())
    }

    /// Remove both backing files for `segname`. An error if the segment is
    /// currently mapped.
    pub fn destroy(&mut self, segname: &str) -> Result<()> {
        let path = self.segment_path(segname);
        if self.registry.find_by_path(&path).is_some() {
            return Err(Error::Usage(UsageError::DestroyWhileMapped));
        }
        backend::remove_segment(&path)?;
        Ok(())
    }

    /// Replay all logs in the region directory onto their data files and
    /// empty them. Idempotent: applying an already-empty log is a no-op.
    pub fn truncate_log(&mut self) -> Result<()> {
        recovery::truncate_log(&self.directory)?;
        Ok(())
    }

    pub fn segment(&self, handle: SegmentHandle) -> Result<&[u8]> {
        let desc = self
            .registry
            .get(handle)
            .ok_or(Error::Usage(UsageError::SegmentNotMapped))?;
        Ok(desc.data.as_ref())
    }

    pub fn segment_mut(&mut self, handle: SegmentHandle) -> Result<&mut [u8]> {
        let desc = self
            .registry
            .get_mut(handle)
            .ok_or(Error::Usage(UsageError::SegmentNotMapped))?;
        Ok(desc.data.as_mut())
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

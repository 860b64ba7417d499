//! Recoverable virtual memory: transactional segments backed by an undo
//! buffer and a durable redo log.
//!
//! An application holds working data as ordinary in-process byte buffers
//! ("segments"), but mutations enclosed between [`txn::begin_trans`] and
//! [`txn::commit_trans`] are atomically durable -- a post-commit crash
//! still leaves every committed byte in place the next time the segment is
//! mapped. [`txn::abort_trans`] cleanly reverts an in-flight transaction
//! with no disk I/O at all.
//!
//! This is a single-process library, not a server: there is no
//! multi-process concurrency, no isolation between transactions beyond a
//! mutual-exclusion rule on overlapping segments, and no nested or
//! distributed transactions.
//!
//! ```no_run
//! use rvm::{txn, Rvm};
//!
//! # fn main() -> rvm::error::Result<()> {
//! let mut lib = Rvm::new();
//! let region_id = lib.init("./rvmdir")?;
//! let region = lib.region(region_id).unwrap();
//!
//! let base = region.map("accounts", 100)?;
//! let tx = txn::begin_trans(region, &[base])?;
//! txn::about_to_modify(region, &tx, base, 0, 5)?;
//! region.segment_mut(base)?[0..5].copy_from_slice(b"HELLO");
//! txn::commit_trans(region, tx)?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod recovery;
mod region;
mod registry;
mod segment;
mod wire;

pub mod error;
pub mod txn;

use std::collections::HashMap;
use std::path::Path;

pub use region::Region;
pub use registry::SegmentHandle;
pub use txn::Transaction;

use error::{Error, Result, UsageError};

/// Tunables for an [`Rvm`] library context.
#[derive(Clone, Copy, Debug)]
pub struct RvmOptions {
    /// Maximum number of regions this context will host at once.
    ///
    /// Default: 128.
    pub max_regions: usize,
}

impl Default for RvmOptions {
    fn default() -> Self {
        Self { max_regions: 128 }
    }
}

/// Opaque identifier for a region owned by an [`Rvm`] context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(u64);

/// Owns a bounded table of [`Region`]s.
///
/// An ordinary owned value rather than a process-global table: nothing here
/// is a `static`, so multiple independent contexts (e.g. in tests) can
/// coexist.
#[derive(Default)]
pub struct Rvm {
    options: RvmOptions,
    next_id: u64,
    regions: HashMap<RegionId, Region>,
}

impl Rvm {
    pub fn new() -> Self {
        Self::with_options(RvmOptions::default())
    }

    pub fn with_options(options: RvmOptions) -> Self {
        Self {
            options,
            next_id: 0,
            regions: HashMap::new(),
        }
    }

    /// Create (or adopt, if already created by a prior process) the region
    /// rooted at `directory`.
    pub fn init(&mut self, directory: impl AsRef<Path>) -> Result<RegionId> {
        if self.regions.len() >= self.options.max_regions {
            return Err(Error::Usage(UsageError::TooManyRegions {
                max: self.options.max_regions,
            }));
        }

        let region = Region::init(directory)?;
        let id = RegionId(self.next_id);
        self.next_id += 1;
        self.regions.insert(id, region);
        Ok(id)
    }

    pub fn region(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }
}

#[cfg(test)]
mod tests;

//! Error types returned by public operations.
//!
//! Recoverable usage mistakes and storage failures are distinguished: a
//! [`UsageError`] means the library state is unchanged and the caller may
//! retry with corrected arguments; a [`std::io::Error`] means some
//! underlying file operation failed.

use std::io;

use thiserror::Error;

/// Top-level error returned by every public operation in this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("storage operation failed")]
    Storage(#[from] io::Error),
}

/// A caller mistake: library state is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("segment is already mapped in this region")]
    AlreadyMapped,
    #[error("segment handle is not mapped in this region")]
    SegmentNotMapped,
    #[error("segment is already owned by a live transaction")]
    SegmentBusy,
    #[error("cannot destroy a segment that is currently mapped")]
    DestroyWhileMapped,
    #[error("segment is not part of this transaction")]
    NotInTransaction,
    #[error("modification range offset={offset} size={size} exceeds segment length={len}")]
    OutOfBounds { offset: u32, size: u32, len: u32 },
    #[error("segment names ending in \".log\" are reserved")]
    ReservedSegmentName,
    #[error("maximum number of regions ({max}) already in use")]
    TooManyRegions { max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

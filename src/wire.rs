//! Fixed-width little-endian framing shared by data files and log records.
//!
//! The on-disk formats are:
//!
//! - data file: `u32 length ∥ length bytes`
//! - log file: zero or more records of `u32 size ∥ u32 offset ∥ size bytes`
//!
//! Fields are fixed at 32-bit little-endian so files are portable across
//! runs and hosts, rather than tied to the host's native word size.

use std::io::{self, Read, Write};

/// One redo record: the post-image of `size` bytes written at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: u32,
    pub data: Vec<u8>,
}

impl Record {
    pub fn encoded_len(&self) -> usize {
        4 + 4 + self.data.len()
    }

    pub fn write<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(&(self.data.len() as u32).to_le_bytes())?;
        out.write_all(&self.offset.to_le_bytes())?;
        out.write_all(&self.data)?;
        Ok(())
    }

    /// Read one record from `reader`.
    ///
    /// Returns `Ok(None)` if the reader is exhausted before a single byte of
    /// a new record could be read. Returns `Ok(None)` as well if a header or
    /// payload is only partially present (a torn trailing record) -- the
    /// caller is expected to treat this as "no more records" rather than an
    /// error, per the recovery scanner's discard-the-tail contract.
    pub fn read<R: Read>(mut reader: R) -> io::Result<Option<Self>> {
        let mut size_buf = [0u8; 4];
        if !read_fully(&mut reader, &mut size_buf)? {
            return Ok(None);
        }
        let size = u32::from_le_bytes(size_buf);

        let mut offset_buf = [0u8; 4];
        if !read_fully(&mut reader, &mut offset_buf)? {
            return Ok(None);
        }
        let offset = u32::from_le_bytes(offset_buf);

        let mut data = vec![0u8; size as usize];
        if !read_fully(&mut reader, &mut data)? {
            return Ok(None);
        }

        Ok(Some(Record { offset, data }))
    }

    /// Parse one record from the front of `buf`, returning it together with
    /// the remainder of the slice.
    ///
    /// Unlike [`Self::read`], this never allocates based on an unvalidated
    /// `size` field: the header's `size` is checked against `buf`'s actual
    /// remaining length *before* any payload bytes are copied out, so a
    /// corrupted header (e.g. a single flipped bit turning `size` into a
    /// huge number) is treated as a torn tail rather than an attempted
    /// multi-gigabyte allocation.
    pub fn read_from_slice(buf: &[u8]) -> Option<(Self, &[u8])> {
        if buf.len() < 8 {
            return None;
        }
        let size = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        let offset = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let rest = &buf[8..];
        if rest.len() < size {
            return None;
        }
        let (data, rest) = rest.split_at(size);
        Some((
            Record {
                offset,
                data: data.to_vec(),
            },
            rest,
        ))
    }
}

/// Like `Read::read_exact`, but reports a short read (including zero bytes
/// read) as `Ok(false)` instead of an `UnexpectedEof` error, so torn tails
/// can be distinguished from genuine I/O failures.
fn read_fully<R: Read>(mut reader: R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

pub fn write_u32<W: Write>(mut out: W, v: u32) -> io::Result<()> {
    out.write_all(&v.to_le_bytes())
}

pub fn read_u32<R: Read>(mut reader: R) -> io::Result<Option<u32>> {
    let mut buf = [0u8; 4];
    if !read_fully(&mut reader, &mut buf)? {
        return Ok(None);
    }
    Ok(Some(u32::from_le_bytes(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let rec = Record {
            offset: 42,
            data: vec![1, 2, 3, 4, 5],
        };
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        assert_eq!(buf.len(), rec.encoded_len());

        let back = Record::read(&mut buf.as_slice()).unwrap().unwrap();
        assert_eq!(rec, back);
    }

    #[test]
    fn record_empty_payload_is_noop_shaped() {
        let rec = Record {
            offset: 7,
            data: Vec::new(),
        };
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        let back = Record::read(&mut buf.as_slice()).unwrap().unwrap();
        assert!(back.data.is_empty());
    }

    #[test]
    fn torn_header_is_none() {
        let buf = [0u8; 3];
        assert!(Record::read(&mut &buf[..]).unwrap().is_none());
    }

    #[test]
    fn torn_payload_is_none() {
        let rec = Record {
            offset: 1,
            data: vec![9; 16],
        };
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(Record::read(&mut buf.as_slice()).unwrap().is_none());
    }

    #[test]
    fn empty_reader_is_none() {
        let buf: [u8; 0] = [];
        assert!(Record::read(&mut &buf[..]).unwrap().is_none());
    }
}

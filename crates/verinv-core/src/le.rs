//! Bounds-checked little-endian reads over byte slices.
//!
//! Every structure in a PE image and in a version resource is little-endian
//! and addressed by offsets taken from the file itself, so no read may trust
//! an offset before checking it against the slice length.

use crate::error::{Error, Result};

/// Returns `len` bytes starting at `offset`, or a malformed-structure error.
pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            Error::malformed(
                offset,
                format!(
                    "need {} bytes, have {}",
                    len,
                    data.len().saturating_sub(offset)
                ),
            )
        })
}

/// Adds `delta` to a file-supplied `offset`, failing instead of wrapping.
pub(crate) fn advance(offset: usize, delta: usize) -> Result<usize> {
    offset
        .checked_add(delta)
        .ok_or_else(|| Error::malformed(offset, format!("offset overflows adding {}", delta)))
}

/// Reads a `u16` at `offset`.
pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Reads a `u32` at `offset`.
pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let b = slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Rounds `offset` up to the next 32-bit boundary.
pub(crate) fn align4(offset: usize) -> usize {
    offset.saturating_add(3) & !3
}

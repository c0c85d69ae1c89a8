//! `VS_FIXEDFILEINFO` decoding.

use crate::error::{Error, Result};
use crate::le::read_u32;
use crate::resource::ResourceBlock;
use std::fmt;
use tracing::trace;

/// `dwSignature` of every fixed-info record
pub const FIXED_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// Size of `VS_FIXEDFILEINFO` (thirteen `u32` fields)
pub const FIXED_INFO_LEN: usize = 52;

/// Rendering of a missing or unreadable version
pub const DEFAULT_VERSION: &str = "0.0.0.0";

/// The numeric file version of a binary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedVersion {
    /// High word of `dwFileVersionMS`
    pub major: u16,
    /// Low word of `dwFileVersionMS`
    pub minor: u16,
    /// High word of `dwFileVersionLS`
    pub build: u16,
    /// Low word of `dwFileVersionLS`
    pub revision: u16,
}

impl FixedVersion {
    /// Splits the two packed version words into their four components
    pub const fn from_words(ms: u32, ls: u32) -> Self {
        Self {
            major: (ms >> 16) as u16,
            minor: (ms & 0xFFFF) as u16,
            build: (ls >> 16) as u16,
            revision: (ls & 0xFFFF) as u16,
        }
    }

    /// Decodes the root record of `block`, or `0.0.0.0` when it is missing
    /// or fails validation.
    pub fn decode(block: &ResourceBlock) -> Self {
        Self::try_decode(block).unwrap_or_else(|e| {
            trace!("No fixed version record: {}", e);
            Self::default()
        })
    }

    /// Decodes the root record of `block`.
    pub fn try_decode(block: &ResourceBlock) -> Result<Self> {
        let root = block.query("\\")?;
        let record = root.value();
        if record.len() < FIXED_INFO_LEN {
            return Err(Error::malformed(
                0,
                format!(
                    "fixed info holds {} bytes, need {}",
                    record.len(),
                    FIXED_INFO_LEN
                ),
            ));
        }

        let signature = read_u32(record, 0)?;
        if signature != FIXED_INFO_SIGNATURE {
            return Err(Error::malformed(
                0,
                format!("fixed info signature {:#010x}", signature),
            ));
        }

        Ok(Self::from_words(read_u32(record, 8)?, read_u32(record, 12)?))
    }
}

impl fmt::Display for FixedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

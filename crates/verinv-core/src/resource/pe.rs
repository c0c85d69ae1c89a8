//! Minimal Portable Executable header and resource-tree parsing.
//!
//! Only the structures on the path to the version resource are decoded:
//!
//! - DOS header (`MZ`, `e_lfanew`)
//! - NT signature, COFF file header, optional header magic
//! - The resource entry of the data directory (PE32 and PE32+)
//! - The section table, for RVA to file offset mapping
//! - The three-level resource directory: type, name, language

use crate::error::{Error, Result};
use crate::le::{advance, read_u16, read_u32, slice};
use tracing::trace;

/// `MZ`
const DOS_MAGIC: u16 = 0x5A4D;
/// Offset of `e_lfanew` in the DOS header
const DOS_LFANEW_OFFSET: usize = 0x3C;
const DOS_HEADER_LEN: usize = 0x40;
/// `PE\0\0`
const NT_SIGNATURE: u32 = 0x0000_4550;
const COFF_HEADER_LEN: usize = 20;
const OPTIONAL_MAGIC_PE32: u16 = 0x10B;
const OPTIONAL_MAGIC_PE32_PLUS: u16 = 0x20B;
const SECTION_HEADER_LEN: usize = 40;
const DATA_DIRECTORY_LEN: usize = 8;
/// Index of the resource table in the data directory
const RESOURCE_DIRECTORY_INDEX: usize = 2;

/// Resource type id of version resources
pub const RT_VERSION: u32 = 16;

const RESOURCE_DIRECTORY_HEADER_LEN: usize = 16;
const RESOURCE_ENTRY_LEN: usize = 8;
const RESOURCE_SUBDIRECTORY_FLAG: u32 = 0x8000_0000;
const RESOURCE_NAME_FLAG: u32 = 0x8000_0000;

/// A `(virtual address, size)` pair from the data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDirectory {
    /// Relative virtual address
    pub rva: u32,
    /// Size in bytes
    pub size: u32,
}

/// The fields of a section header needed for address mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// RVA of the section
    pub virtual_address: u32,
    /// Size of the section's data on disk
    pub raw_size: u32,
    /// File offset of the section's data
    pub raw_pointer: u32,
}

impl SectionHeader {
    /// Maps an RVA inside this section to a file offset.
    ///
    /// RVAs that fall into the zero-filled tail (past the raw data) have no
    /// file offset.
    fn file_offset(&self, rva: u32) -> Option<usize> {
        let delta = rva.checked_sub(self.virtual_address)?;
        if delta >= self.raw_size {
            return None;
        }
        (self.raw_pointer as usize).checked_add(delta as usize)
    }
}

/// A single entry of a resource directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResourceEntry {
    /// Numeric id, or `None` for string-named entries
    id: Option<u32>,
    /// Offset from the start of the resource section, high bit marks subdirectories
    target: u32,
}

impl ResourceEntry {
    fn is_directory(&self) -> bool {
        self.target & RESOURCE_SUBDIRECTORY_FLAG != 0
    }

    fn offset(&self) -> usize {
        (self.target & !RESOURCE_SUBDIRECTORY_FLAG) as usize
    }
}

/// A parsed PE image borrowing the raw file bytes
#[derive(Debug, Clone)]
pub struct PeImage<'a> {
    data: &'a [u8],
    is_64bit: bool,
    sections: Vec<SectionHeader>,
    resources: Option<DataDirectory>,
}

impl<'a> PeImage<'a> {
    /// Parses the headers and section table of a PE image.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < DOS_HEADER_LEN {
            return Err(Error::not_pe("file too small for a DOS header"));
        }
        if read_u16(data, 0)? != DOS_MAGIC {
            return Err(Error::not_pe("missing MZ signature"));
        }

        let nt_offset = read_u32(data, DOS_LFANEW_OFFSET)? as usize;
        match read_u32(data, nt_offset) {
            Ok(NT_SIGNATURE) => {}
            _ => return Err(Error::not_pe("missing PE signature")),
        }

        let coff = advance(nt_offset, 4)?;
        let section_count = read_u16(data, advance(coff, 2)?)? as usize;
        let optional_len = read_u16(data, advance(coff, 16)?)? as usize;
        let optional = advance(coff, COFF_HEADER_LEN)?;

        let (is_64bit, count_offset, directories_offset) = match read_u16(data, optional)? {
            OPTIONAL_MAGIC_PE32 => (false, 92, 96),
            OPTIONAL_MAGIC_PE32_PLUS => (true, 108, 112),
            magic => {
                return Err(Error::not_pe(format!(
                    "unknown optional header magic {:#x}",
                    magic
                )))
            }
        };

        let resources = Self::resource_directory(
            data,
            optional,
            optional_len,
            count_offset,
            directories_offset,
        )?;

        let table = advance(optional, optional_len)?;
        let mut sections = Vec::with_capacity(section_count);
        for i in 0..section_count {
            let at = advance(table, i * SECTION_HEADER_LEN)?;
            let header = slice(data, at, SECTION_HEADER_LEN)?;
            sections.push(SectionHeader {
                virtual_size: read_u32(header, 8)?,
                virtual_address: read_u32(header, 12)?,
                raw_size: read_u32(header, 16)?,
                raw_pointer: read_u32(header, 20)?,
            });
        }

        trace!(
            "PE image: {} sections, 64-bit: {}, resources: {:?}",
            sections.len(),
            is_64bit,
            resources
        );

        Ok(Self {
            data,
            is_64bit,
            sections,
            resources,
        })
    }

    fn resource_directory(
        data: &[u8],
        optional: usize,
        optional_len: usize,
        count_offset: usize,
        directories_offset: usize,
    ) -> Result<Option<DataDirectory>> {
        if optional_len < count_offset + 4 {
            return Ok(None);
        }
        let count = read_u32(data, advance(optional, count_offset)?)? as usize;
        let entry = directories_offset + RESOURCE_DIRECTORY_INDEX * DATA_DIRECTORY_LEN;
        if count <= RESOURCE_DIRECTORY_INDEX || optional_len < entry + DATA_DIRECTORY_LEN {
            return Ok(None);
        }

        let entry = advance(optional, entry)?;
        let rva = read_u32(data, entry)?;
        let size = read_u32(data, advance(entry, 4)?)?;
        if rva == 0 || size == 0 {
            return Ok(None);
        }
        Ok(Some(DataDirectory { rva, size }))
    }

    /// Returns true for PE32+ images
    pub fn is_64bit(&self) -> bool {
        self.is_64bit
    }

    /// Returns the parsed section headers
    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    /// Returns the resource entry of the data directory, if any
    pub fn resources(&self) -> Option<DataDirectory> {
        self.resources
    }

    /// Maps an RVA to a file offset using the section table
    pub fn rva_to_offset(&self, rva: u32) -> Option<usize> {
        self.sections.iter().find_map(|s| s.file_offset(rva))
    }

    /// Finds the raw bytes of the first version resource.
    ///
    /// Follows `RT_VERSION → first name → first language`, which is the
    /// resource the platform loader hands out for language-neutral queries.
    pub fn version_resource(&self) -> Result<&'a [u8]> {
        let directory = self.resources.ok_or(Error::NoResourceDirectory)?;
        let base = self.rva_to_offset(directory.rva).ok_or_else(|| {
            Error::malformed(0, format!("resource RVA {:#x} maps to no section", directory.rva))
        })?;
        let tree = self
            .data
            .get(base..)
            .ok_or_else(|| Error::malformed(base, "resource directory past end of file"))?;

        let by_type = find_entry(tree, 0, Some(RT_VERSION))?.ok_or(Error::NoVersionResource)?;
        let by_name = find_entry(tree, subdirectory(&by_type)?, None)?
            .ok_or(Error::NoVersionResource)?;
        let by_language = find_entry(tree, subdirectory(&by_name)?, None)?
            .ok_or(Error::NoVersionResource)?;
        if by_language.is_directory() {
            return Err(Error::malformed(
                by_language.offset(),
                "language entry points to a directory",
            ));
        }

        let data_entry = by_language.offset();
        let rva = read_u32(tree, data_entry)?;
        let size = read_u32(tree, advance(data_entry, 4)?)? as usize;
        let offset = self.rva_to_offset(rva).ok_or_else(|| {
            Error::malformed(data_entry, format!("version data RVA {:#x} maps to no section", rva))
        })?;

        trace!("Version resource at file offset {:#x} ({} bytes)", offset, size);
        slice(self.data, offset, size)
    }
}

fn subdirectory(entry: &ResourceEntry) -> Result<usize> {
    if entry.is_directory() {
        Ok(entry.offset())
    } else {
        Err(Error::malformed(entry.offset(), "expected a resource subdirectory"))
    }
}

/// Finds an entry in the resource directory at `offset`.
///
/// With `id` set, only numeric entries with that id match; otherwise the
/// first entry wins. Named entries precede numeric ones in the table.
fn find_entry(tree: &[u8], offset: usize, id: Option<u32>) -> Result<Option<ResourceEntry>> {
    let named = read_u16(tree, advance(offset, 12)?)? as usize;
    let numbered = read_u16(tree, advance(offset, 14)?)? as usize;
    let first = advance(offset, RESOURCE_DIRECTORY_HEADER_LEN)?;

    for i in 0..named + numbered {
        let at = advance(first, i * RESOURCE_ENTRY_LEN)?;
        let name = read_u32(tree, at)?;
        let entry = ResourceEntry {
            id: (name & RESOURCE_NAME_FLAG == 0).then_some(name),
            target: read_u32(tree, advance(at, 4)?)?,
        };
        match id {
            None => return Ok(Some(entry)),
            Some(wanted) if entry.id == Some(wanted) => return Ok(Some(entry)),
            Some(_) => {}
        }
    }
    Ok(None)
}

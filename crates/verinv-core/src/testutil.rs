//! Builders for synthetic version resources and PE images used in tests.

use crate::resource::RT_VERSION;
use crate::version::{FIXED_INFO_LEN, FIXED_INFO_SIGNATURE};

/// Builds `VS_VERSIONINFO` blocks
#[derive(Debug, Default)]
pub(crate) struct VersionBuilder {
    fixed: Option<Vec<u8>>,
    translation: Option<Vec<u8>>,
    tables: Vec<(String, Vec<(String, String)>)>,
}

impl VersionBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the file version in the fixed-info record
    pub(crate) fn version(self, major: u16, minor: u16, build: u16, revision: u16) -> Self {
        let ms = (u32::from(major) << 16) | u32::from(minor);
        let ls = (u32::from(build) << 16) | u32::from(revision);

        let mut record = Vec::with_capacity(FIXED_INFO_LEN);
        for word in [
            FIXED_INFO_SIGNATURE,
            0x0001_0000, // struct version
            ms,
            ls,
            ms, // product version
            ls,
            0x3F,        // flags mask
            0,           // flags
            0x0004_0004, // VOS_NT_WINDOWS32
            1,           // VFT_APP
            0,
            0,
            0,
        ] {
            record.extend_from_slice(&word.to_le_bytes());
        }
        self.fixed_bytes(record)
    }

    /// Sets the raw root value
    pub(crate) fn fixed_bytes(mut self, record: Vec<u8>) -> Self {
        self.fixed = Some(record);
        self
    }

    /// Declares a translation table
    pub(crate) fn translations(self, pairs: &[(u16, u16)]) -> Self {
        let raw = pairs
            .iter()
            .flat_map(|(language, codepage)| {
                let mut pair = language.to_le_bytes().to_vec();
                pair.extend_from_slice(&codepage.to_le_bytes());
                pair
            })
            .collect();
        self.translation_bytes(raw)
    }

    /// Sets the raw translation table value
    pub(crate) fn translation_bytes(mut self, raw: Vec<u8>) -> Self {
        self.translation = Some(raw);
        self
    }

    /// Adds a string table
    pub(crate) fn table(mut self, code: &str, strings: &[(&str, &str)]) -> Self {
        self.tables.push((
            code.to_string(),
            strings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut children = Vec::new();

        if !self.tables.is_empty() {
            let tables: Vec<Vec<u8>> = self
                .tables
                .iter()
                .map(|(code, strings)| {
                    let strings: Vec<Vec<u8>> = strings
                        .iter()
                        .map(|(key, value)| {
                            let text = utf16z(value);
                            node(key, &text, (text.len() / 2) as u16, 1, &[])
                        })
                        .collect();
                    node(code, &[], 0, 1, &strings)
                })
                .collect();
            children.push(node("StringFileInfo", &[], 0, 1, &tables));
        }

        if let Some(raw) = &self.translation {
            let translation = node("Translation", raw, raw.len() as u16, 0, &[]);
            children.push(node("VarFileInfo", &[], 0, 1, &[translation]));
        }

        let fixed = self.fixed.clone().unwrap_or_default();
        node("VS_VERSION_INFO", &fixed, fixed.len() as u16, 0, &children)
    }
}

fn utf16z(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Encodes one node; nodes always start on a 32-bit boundary
fn node(key: &str, value: &[u8], value_len: u16, value_type: u16, children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0u8; 6];
    out.extend(utf16z(key));
    pad4(&mut out);
    out.extend_from_slice(value);
    for child in children {
        pad4(&mut out);
        out.extend_from_slice(child);
    }

    let length = out.len() as u16;
    out[0..2].copy_from_slice(&length.to_le_bytes());
    out[2..4].copy_from_slice(&value_len.to_le_bytes());
    out[4..6].copy_from_slice(&value_type.to_le_bytes());
    out
}

const SECTION_RVA: u32 = 0x1000;
const SECTION_FILE_OFFSET: usize = 0x200;

/// A PE32 image whose only resource is `block` as the version resource
pub(crate) fn pe_image(block: &[u8]) -> Vec<u8> {
    pe_image_with(false, RT_VERSION, block)
}

/// A PE image with one resource of type `type_id`; the resource data is
/// the last thing in the file.
pub(crate) fn pe_image_with(is_64bit: bool, type_id: u32, block: &[u8]) -> Vec<u8> {
    let mut rsrc = Vec::new();
    // Type directory -> name directory -> language directory -> data entry
    directory(&mut rsrc, type_id, 0x8000_0000 | 0x18);
    directory(&mut rsrc, 1, 0x8000_0000 | 0x30);
    directory(&mut rsrc, 0x0409, 0x48);
    put_u32(&mut rsrc, SECTION_RVA + 0x58);
    put_u32(&mut rsrc, block.len() as u32);
    put_u32(&mut rsrc, 0);
    put_u32(&mut rsrc, 0);
    rsrc.extend_from_slice(block);

    image(is_64bit, Some(&rsrc))
}

/// A PE32 image without a resource directory
pub(crate) fn pe_image_without_resources() -> Vec<u8> {
    image(false, None)
}

/// A resource directory with a single numeric entry
fn directory(out: &mut Vec<u8>, id: u32, target: u32) {
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    put_u32(out, id);
    put_u32(out, target);
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn image(is_64bit: bool, rsrc: Option<&[u8]>) -> Vec<u8> {
    let section_data = rsrc.unwrap_or(&[0u8; 16]);
    let mut out = vec![0u8; SECTION_FILE_OFFSET];

    // DOS header
    out[0..2].copy_from_slice(b"MZ");
    out[0x3C..0x40].copy_from_slice(&0x40u32.to_le_bytes());

    // NT signature and COFF header
    out[0x40..0x44].copy_from_slice(b"PE\0\0");
    let coff = 0x44;
    let (machine, optional_len, magic, count_at, directories_at): (u16, u16, u16, usize, usize) =
        if is_64bit {
            (0x8664, 240, 0x20B, 108, 112)
        } else {
            (0x014C, 224, 0x10B, 92, 96)
        };
    out[coff..coff + 2].copy_from_slice(&machine.to_le_bytes());
    out[coff + 2..coff + 4].copy_from_slice(&1u16.to_le_bytes());
    out[coff + 16..coff + 18].copy_from_slice(&optional_len.to_le_bytes());

    // Optional header
    let optional = coff + 20;
    out[optional..optional + 2].copy_from_slice(&magic.to_le_bytes());
    out[optional + count_at..optional + count_at + 4].copy_from_slice(&16u32.to_le_bytes());
    if let Some(rsrc) = rsrc {
        let entry = optional + directories_at + 2 * 8;
        out[entry..entry + 4].copy_from_slice(&SECTION_RVA.to_le_bytes());
        out[entry + 4..entry + 8].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
    }

    // Section table
    let section = optional + optional_len as usize;
    let size = section_data.len() as u32;
    out[section..section + 5].copy_from_slice(b".rsrc");
    out[section + 8..section + 12].copy_from_slice(&size.to_le_bytes());
    out[section + 12..section + 16].copy_from_slice(&SECTION_RVA.to_le_bytes());
    out[section + 16..section + 20].copy_from_slice(&size.to_le_bytes());
    out[section + 20..section + 24].copy_from_slice(&(SECTION_FILE_OFFSET as u32).to_le_bytes());
    out[section + 36..section + 40].copy_from_slice(&0x4000_0040u32.to_le_bytes());

    out.extend_from_slice(section_data);
    out
}

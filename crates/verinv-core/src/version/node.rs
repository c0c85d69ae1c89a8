//! `VS_VERSIONINFO` node tree walking.
//!
//! A version resource is a tree of variable-length nodes. Each node is:
//!
//! ```text
//! u16 wLength        total node length, children included
//! u16 wValueLength   value length (in WCHARs when wType == 1, bytes otherwise)
//! u16 wType          1 = text, 0 = binary
//! WCHAR szKey[]      NUL-terminated UTF-16LE key
//! padding            to a 32-bit boundary
//! value
//! padding            to a 32-bit boundary
//! children           each starting on a 32-bit boundary
//! ```
//!
//! Offsets are relative to the start of the block, which the loader always
//! places on a 32-bit boundary.

use crate::error::{Error, Result};
use crate::le::{align4, read_u16};

const NODE_HEADER_LEN: usize = 6;
const TEXT_VALUE_TYPE: u16 = 1;

/// Key of the root node
pub const ROOT_KEY: &str = "VS_VERSION_INFO";

/// One node of a version resource, borrowing the block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNode<'a> {
    block: &'a [u8],
    key: String,
    value_type: u16,
    declared_len: usize,
    value_start: usize,
    value_end: usize,
    children_start: usize,
    end: usize,
}

impl<'a> VersionNode<'a> {
    /// Parses the root node of a block
    pub fn root(block: &'a [u8]) -> Result<Self> {
        let root = Self::parse(block, 0, block.len())?;
        if !root.key.eq_ignore_ascii_case(ROOT_KEY) {
            return Err(Error::malformed(
                NODE_HEADER_LEN,
                format!("unexpected root key '{}'", root.key),
            ));
        }
        Ok(root)
    }

    /// Parses the node at `start`; `limit` is the end of the enclosing node.
    ///
    /// Lengths that overrun the parent are clamped to it.
    fn parse(block: &'a [u8], start: usize, limit: usize) -> Result<Self> {
        let length = read_u16(block, start)? as usize;
        if length < NODE_HEADER_LEN {
            return Err(Error::malformed(start, format!("node length {} too small", length)));
        }
        let end = (start + length).min(limit).min(block.len());
        let declared_len = read_u16(block, start + 2)? as usize;
        let value_type = read_u16(block, start + 4)?;

        let (key, key_end) = read_utf16z(block, start + NODE_HEADER_LEN, end)
            .ok_or_else(|| Error::malformed(start + NODE_HEADER_LEN, "unterminated node key"))?;

        let value_start = align4(key_end).min(end);
        let value_bytes = if value_type == TEXT_VALUE_TYPE {
            declared_len * 2
        } else {
            declared_len
        };
        let value_end = (value_start + value_bytes).min(end);
        let children_start = align4(value_start + value_bytes).min(end);

        Ok(Self {
            block,
            key,
            value_type,
            declared_len,
            value_start,
            value_end,
            children_start,
            end,
        })
    }

    /// The node's key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true when `wType` marks a text value
    pub fn is_text(&self) -> bool {
        self.value_type == TEXT_VALUE_TYPE
    }

    /// `wValueLength` as stored in the node
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    /// The value bytes, clamped to the node
    pub fn value(&self) -> &'a [u8] {
        &self.block[self.value_start..self.value_end]
    }

    /// Decodes the value as a NUL-terminated UTF-16LE string.
    ///
    /// A zero `wValueLength` yields an empty string. Otherwise decoding runs
    /// to the first NUL inside the node, because producers disagree about
    /// whether the length counts characters or bytes.
    pub fn text(&self) -> String {
        if self.declared_len == 0 {
            return String::new();
        }
        read_utf16z(self.block, self.value_start, self.end)
            .map(|(text, _)| text)
            .unwrap_or_else(|| decode_utf16(&self.block[self.value_start..self.end]))
    }

    /// Iterates over the child nodes
    pub fn children(&self) -> Children<'a> {
        Children {
            block: self.block,
            position: self.children_start,
            end: self.end,
        }
    }

    /// Finds the first child whose key matches `key` case-insensitively
    pub fn child(&self, key: &str) -> Result<Option<VersionNode<'a>>> {
        for child in self.children() {
            let child = child?;
            if child.key.eq_ignore_ascii_case(key) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }
}

/// Iterator over the children of a [`VersionNode`]
#[derive(Debug, Clone)]
pub struct Children<'a> {
    block: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<VersionNode<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position + NODE_HEADER_LEN > self.end {
            return None;
        }
        match VersionNode::parse(self.block, self.position, self.end) {
            Ok(node) => {
                // Advance by the declared length, not the clamped end
                let length = read_u16(self.block, self.position).unwrap_or(0) as usize;
                self.position = align4(self.position + length.max(NODE_HEADER_LEN));
                Some(Ok(node))
            }
            Err(e) => {
                self.position = self.end;
                Some(Err(e))
            }
        }
    }
}

/// Reads a NUL-terminated UTF-16LE string in `start..end`.
///
/// Returns the string and the offset just past the terminator, or `None`
/// when no terminator exists before `end`.
fn read_utf16z(block: &[u8], start: usize, end: usize) -> Option<(String, usize)> {
    let region = block.get(start..end)?;
    let terminator = region
        .chunks_exact(2)
        .position(|pair| pair == [0, 0])?;
    let text = decode_utf16(&region[..terminator * 2]);
    Some((text, start + terminator * 2 + 2))
}

fn decode_utf16(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::VersionBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_and_children() {
        let block = VersionBuilder::new()
            .version(1, 0, 0, 0)
            .translations(&[(0x0409, 0x04B0)])
            .table("040904B0", &[("CompanyName", "Acme"), ("ProductName", "Tool")])
            .build();

        let root = VersionNode::root(&block).unwrap();
        assert_eq!(root.key(), ROOT_KEY);
        assert_eq!(root.value().len(), 52);

        let keys: Vec<String> = root
            .children()
            .map(|c| c.unwrap().key().to_string())
            .collect();
        assert_eq!(keys, vec!["StringFileInfo", "VarFileInfo"]);

        let table = root
            .child("StringFileInfo")
            .unwrap()
            .unwrap()
            .child("040904B0")
            .unwrap()
            .unwrap();
        let strings: Vec<(String, String)> = table
            .children()
            .map(|c| {
                let c = c.unwrap();
                (c.key().to_string(), c.text())
            })
            .collect();
        assert_eq!(
            strings,
            vec![
                ("CompanyName".to_string(), "Acme".to_string()),
                ("ProductName".to_string(), "Tool".to_string()),
            ]
        );
    }

    #[test]
    fn test_wrong_root_key() {
        let mut block = VersionBuilder::new().build();
        // Corrupt the first key character: 'V' -> 'X'
        block[6] = b'X';
        assert!(matches!(
            VersionNode::root(&block),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_truncated_block() {
        let block = VersionBuilder::new().version(1, 2, 3, 4).build();
        assert!(VersionNode::root(&block[..4]).is_err());
        assert!(VersionNode::root(&[]).is_err());
    }

    #[test]
    fn test_zero_length_child_stops_iteration() {
        let mut block = VersionBuilder::new()
            .table("040904B0", &[("ProductName", "Tool")])
            .build();
        let root = VersionNode::root(&block).unwrap();
        let first_child = root.children_start;
        block[first_child] = 0;
        block[first_child + 1] = 0;

        let root = VersionNode::root(&block).unwrap();
        let mut children = root.children();
        assert!(children.next().unwrap().is_err());
        assert!(children.next().is_none());
    }

    #[test]
    fn test_read_utf16z() {
        let bytes = [b'h', 0, b'i', 0, 0, 0, b'x', 0];
        assert_eq!(read_utf16z(&bytes, 0, bytes.len()), Some(("hi".to_string(), 6)));
        assert_eq!(read_utf16z(&bytes, 6, bytes.len()), None);
    }
}

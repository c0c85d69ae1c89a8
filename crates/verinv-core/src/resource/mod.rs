//! Version resource location.
//!
//! Given a file, [`locate`] returns an owned copy of its version resource
//! ([`ResourceBlock`]) or `None`. Every failure along the way (unreadable
//! file, not a PE image, no resource section, truncated tables) means the
//! same thing to callers: the file carries no usable version metadata.

mod pe;

use crate::error::{Error, Result};
use crate::version::node::VersionNode;
use std::path::Path;
use tracing::trace;

pub use pe::{DataDirectory, PeImage, SectionHeader, RT_VERSION};

/// Owned bytes of one file's version resource.
///
/// A block belongs to exactly one extraction and is dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    data: Vec<u8>,
}

impl ResourceBlock {
    /// Wraps raw `VS_VERSIONINFO` bytes
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length of the block in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the block holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parses the root `VS_VERSIONINFO` node
    pub fn root(&self) -> Result<VersionNode<'_>> {
        VersionNode::root(&self.data)
    }

    /// Resolves a backslash-separated query path such as `\`,
    /// `\VarFileInfo\Translation` or `\StringFileInfo\040904B0\ProductName`.
    ///
    /// Segments match node keys case-insensitively.
    pub fn query(&self, path: &str) -> Result<VersionNode<'_>> {
        let mut node = self.root()?;
        for segment in path.split('\\').filter(|s| !s.is_empty()) {
            node = node
                .child(segment)?
                .ok_or_else(|| Error::value_not_found(path))?;
        }
        Ok(node)
    }
}

/// Extracts the version resource from an in-memory PE image.
pub fn locate_in(data: &[u8]) -> Result<ResourceBlock> {
    let image = PeImage::parse(data)?;
    let bytes = image.version_resource()?;
    if bytes.is_empty() {
        return Err(Error::NoVersionResource);
    }
    Ok(ResourceBlock::from_bytes(bytes))
}

/// Reads a file and extracts its version resource.
pub fn try_locate(path: impl AsRef<Path>) -> Result<ResourceBlock> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    locate_in(&data)
}

/// Reads a file and extracts its version resource, or `None` when absent.
pub fn locate(path: impl AsRef<Path>) -> Option<ResourceBlock> {
    let path = path.as_ref();
    match try_locate(path) {
        Ok(block) => Some(block),
        Err(e) => {
            trace!("No version resource in {}: {}", path.display(), e);
            None
        }
    }
}

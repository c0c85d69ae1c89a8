//! String field resolution across localized string tables.
//!
//! A field such as `ProductName` may live under any of the block's string
//! tables. Resolution is "first non-empty match wins" over an ordered list of
//! variants, and over an ordered list of [`FieldSource`]s:
//!
//! 1. [`DeclaredVariants`]: probes `\StringFileInfo\<variant>\<key>` for each
//!    variant in order (declared table or fallback list)
//! 2. [`PresentTables`]: probes every string table physically present in the
//!    block, in block order, catching tables no variant points at
//!
//! ## Extensibility
//!
//! ```
//! use verinv_core::version::{FieldResolver, FieldSource, VersionVariant};
//! use verinv_core::ResourceBlock;
//!
//! #[derive(Debug)]
//! struct Fixed(&'static str);
//!
//! impl FieldSource for Fixed {
//!     fn name(&self) -> &'static str {
//!         "fixed"
//!     }
//!
//!     fn resolve_field(&self, _: &ResourceBlock, _: &str, _: &[VersionVariant]) -> Option<String> {
//!         Some(self.0.to_string())
//!     }
//! }
//!
//! let resolver = FieldResolver::with_sources(vec![Box::new(Fixed("Acme"))]);
//! let block = ResourceBlock::from_bytes(Vec::new());
//! assert_eq!(resolver.resolve(&block, "ProductName", &[]), "Acme");
//! ```

use crate::resource::ResourceBlock;
use crate::version::translation::VersionVariant;
use std::fmt;
use tracing::trace;

/// Query prefix of all string tables
pub const STRING_FILE_INFO: &str = "StringFileInfo";

/// A way of looking up a string field in a version resource
pub trait FieldSource: fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns the first non-empty, trimmed value of `key`, if any.
    ///
    /// Lookup failures are not errors: a source that cannot answer returns
    /// `None` and the next source is consulted.
    fn resolve_field(
        &self,
        block: &ResourceBlock,
        key: &str,
        variants: &[VersionVariant],
    ) -> Option<String>;
}

/// Probes `\StringFileInfo\<variant>\<key>` for each variant in order
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredVariants;

impl FieldSource for DeclaredVariants {
    fn name(&self) -> &'static str {
        "declared-variants"
    }

    fn resolve_field(
        &self,
        block: &ResourceBlock,
        key: &str,
        variants: &[VersionVariant],
    ) -> Option<String> {
        variants.iter().find_map(|variant| {
            let query = format!("\\{}\\{}\\{}", STRING_FILE_INFO, variant, key);
            match block.query(&query) {
                Ok(node) => non_empty(&node.text()),
                Err(e) => {
                    trace!("Skipping {}: {}", query, e);
                    None
                }
            }
        })
    }
}

/// Probes every string table present in the block, in block order
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentTables;

impl FieldSource for PresentTables {
    fn name(&self) -> &'static str {
        "present-tables"
    }

    fn resolve_field(
        &self,
        block: &ResourceBlock,
        key: &str,
        _variants: &[VersionVariant],
    ) -> Option<String> {
        let tables = block.query(STRING_FILE_INFO).ok()?;
        tables.children().find_map(|table| {
            let table = table.ok()?;
            let value = table.child(key).ok()??;
            non_empty(&value.text())
        })
    }
}

/// An ordered list of field sources
#[derive(Debug)]
pub struct FieldResolver {
    sources: Vec<Box<dyn FieldSource>>,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::with_sources(vec![Box::new(DeclaredVariants), Box::new(PresentTables)])
    }
}

impl FieldResolver {
    /// Creates a resolver with the default source order
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver consulting `sources` in the given order
    pub fn with_sources(sources: Vec<Box<dyn FieldSource>>) -> Self {
        Self { sources }
    }

    /// Names of the sources, in consultation order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns the first non-empty value of `key`, or an empty string
    pub fn resolve(&self, block: &ResourceBlock, key: &str, variants: &[VersionVariant]) -> String {
        self.sources
            .iter()
            .find_map(|source| {
                let value = source.resolve_field(block, key, variants)?;
                trace!("Resolved {} via {}", key, source.name());
                Some(value)
            })
            .unwrap_or_default()
    }
}

/// Resolves `key` by probing the given variants only.
///
/// Returns an empty string when no variant carries a non-empty value.
pub fn resolve_string(block: &ResourceBlock, key: &str, variants: &[VersionVariant]) -> String {
    DeclaredVariants
        .resolve_field(block, key, variants)
        .unwrap_or_default()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

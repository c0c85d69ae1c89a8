//! Label and version fallback policy.
//!
//! The package label of a file takes one of two shapes:
//!
//! - the value of the requested key, when the block carries it
//! - `"{label} - {version}"` otherwise, where `label` walks
//!   [`LABEL_FALLBACK_KEYS`] over the declared variants, then
//!   [`SECONDARY_LABEL_KEYS`] through the [`FieldResolver`], and finally the
//!   file's own name, and `version` is the fixed file version (`0.0.0.0`
//!   when absent)
//!
//! The requested key is only looked up under the declared variants.

use crate::resource::ResourceBlock;
use crate::version::field::{resolve_string, FieldResolver};
use crate::version::fixed::FixedVersion;
use crate::version::translation::{read_translations, VersionVariant};
use std::fmt;
use std::path::Path;

/// Keys consulted, in order, over the declared variants when the requested
/// key is missing
pub const LABEL_FALLBACK_KEYS: [&str; 4] = [
    "ProductName",
    "FileDescription",
    "InternalName",
    "OriginalFilename",
];

/// Keys consulted, in order, through the resolver once
/// [`LABEL_FALLBACK_KEYS`] found nothing
pub const SECONDARY_LABEL_KEYS: [&str; 3] = ["ProductName", "FileDescription", "InternalName"];

/// Fallback key whose value is a file name, stripped of its extension
const FILE_NAME_KEY: &str = "OriginalFilename";

/// The package label of one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageLabel {
    /// Value of the requested key, used as is
    Requested(String),
    /// Fallback label and decoded version, rendered `"{label} - {version}"`
    Composed {
        /// Label from the fallback chain or the file name
        label: String,
        /// Dotted four-part version
        version: String,
    },
}

impl fmt::Display for PackageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested(value) => f.write_str(value),
            Self::Composed { label, version } => write!(f, "{} - {}", label, version),
        }
    }
}

/// Applies the fallback policy; the [`FieldResolver`] serves the second
/// label pass
#[derive(Debug, Default)]
pub struct FieldChain {
    resolver: FieldResolver,
}

impl FieldChain {
    /// Creates a chain with the default field sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain over a custom resolver
    pub fn with_resolver(resolver: FieldResolver) -> Self {
        Self { resolver }
    }

    /// Returns the underlying resolver
    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// Resolves the package label of `file`.
    ///
    /// `block` is `None` when the file has no version resource.
    pub fn package_label(
        &self,
        block: Option<&ResourceBlock>,
        requested_key: &str,
        file: &Path,
    ) -> PackageLabel {
        let Some(block) = block else {
            return PackageLabel::Composed {
                label: file_stem(file),
                version: self.resolve_version(None),
            };
        };

        let variants = read_translations(block);
        let requested = resolve_string(block, requested_key, &variants);
        if !requested.is_empty() {
            return PackageLabel::Requested(requested);
        }

        PackageLabel::Composed {
            label: self.resolve_alternate_label(Some(block), &variants, file),
            version: self.resolve_version(Some(block)),
        }
    }

    /// Resolves a label: the requested key first, then the alternate chain,
    /// then the file name.
    pub fn resolve_label(
        &self,
        block: Option<&ResourceBlock>,
        requested_key: &str,
        variants: &[VersionVariant],
        file: &Path,
    ) -> String {
        if let Some(block) = block {
            let requested = resolve_string(block, requested_key, variants);
            if !requested.is_empty() {
                return requested;
            }
        }
        self.resolve_alternate_label(block, variants, file)
    }

    /// Walks [`LABEL_FALLBACK_KEYS`] over `variants`, then
    /// [`SECONDARY_LABEL_KEYS`] through the resolver, then falls back to the
    /// file name without its extension.
    pub fn resolve_alternate_label(
        &self,
        block: Option<&ResourceBlock>,
        variants: &[VersionVariant],
        file: &Path,
    ) -> String {
        block
            .and_then(|block| {
                LABEL_FALLBACK_KEYS
                    .iter()
                    .find_map(|&key| {
                        let value = resolve_string(block, key, variants);
                        let value = if key == FILE_NAME_KEY {
                            strip_extension(&value).to_string()
                        } else {
                            value
                        };
                        (!value.is_empty()).then_some(value)
                    })
                    .or_else(|| {
                        SECONDARY_LABEL_KEYS.iter().find_map(|&key| {
                            let value = self.resolver.resolve(block, key, variants);
                            (!value.is_empty()).then_some(value)
                        })
                    })
            })
            .unwrap_or_else(|| file_stem(file))
    }

    /// Renders the fixed file version, `0.0.0.0` when absent
    pub fn resolve_version(&self, block: Option<&ResourceBlock>) -> String {
        block
            .map(FixedVersion::decode)
            .unwrap_or_default()
            .to_string()
    }
}

/// The final path component of `file` without its extension
fn file_stem(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    strip_extension(&name).to_string()
}

/// Strips the last extension of the final component of `name`.
///
/// Both `/` and `\` separate components, since embedded file names come
/// from Windows. Leading dots do not start an extension: `.profile` stays.
pub fn strip_extension(name: &str) -> &str {
    let component = name.rfind(|c| c == '/' || c == '\\').map_or(0, |i| i + 1);
    let tail = &name[component..];
    let dots = tail.len() - tail.trim_start_matches('.').len();
    match tail[dots..].rfind('.') {
        Some(dot) => &name[..component + dots + dot],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::VersionBuilder;
    use crate::version::translation::{read_translations, FALLBACK_VARIANTS};
    use pretty_assertions::assert_eq;

    fn block(builder: VersionBuilder) -> ResourceBlock {
        ResourceBlock::from_bytes(builder.build())
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("tool.exe"), "tool");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".profile"), ".profile");
        assert_eq!(strip_extension("dir.d\\name"), "dir.d\\name");
        assert_eq!(strip_extension("C:\\bin\\app.dll"), "C:\\bin\\app");
        assert_eq!(strip_extension(""), "");
    }

    #[test]
    fn test_requested_key_is_standalone() {
        let chain = FieldChain::new();
        let block = block(
            VersionBuilder::new()
                .version(1, 2, 3, 4)
                .table("040904B0", &[("Package", "ACME-PKG-7"), ("ProductName", "Acme Tool")]),
        );
        let label = chain.package_label(Some(&block), "Package", Path::new("/opt/acme.exe"));
        assert_eq!(label, PackageLabel::Requested("ACME-PKG-7".into()));
        assert!(!label.to_string().contains(" - "));
    }

    #[test]
    fn test_missing_requested_key_composes() {
        let chain = FieldChain::new();
        let block = block(
            VersionBuilder::new()
                .version(1, 2, 3, 4)
                .table("040904B0", &[("ProductName", "Acme Tool")]),
        );
        let label = chain.package_label(Some(&block), "Package", Path::new("/opt/acme.exe"));
        assert_eq!(label.to_string(), "Acme Tool - 1.2.3.4");
    }

    #[test]
    fn test_blank_requested_key_composes() {
        let chain = FieldChain::new();
        let block = block(
            VersionBuilder::new()
                .version(2, 0, 0, 0)
                .table("040904B0", &[("Package", "  "), ("ProductName", "Acme Tool")]),
        );
        let label = chain.package_label(Some(&block), "Package", Path::new("acme.exe"));
        assert_eq!(label.to_string(), "Acme Tool - 2.0.0.0");
    }

    #[test]
    fn test_requested_key_under_neutral_variant_only() {
        let chain = FieldChain::new();
        let block = block(VersionBuilder::new().table("000004E4", &[("Package", "Neutral")]));
        assert_eq!(
            chain.resolve_label(Some(&block), "Package", &FALLBACK_VARIANTS, Path::new("x.dll")),
            "Neutral"
        );
    }

    #[test]
    fn test_alternate_chain_order() {
        let chain = FieldChain::new();
        let path = Path::new("/bin/fallback.exe");
        let cases = [
            (
                vec![("FileDescription", "Desc"), ("InternalName", "Internal")],
                "Desc",
            ),
            (
                vec![("InternalName", "Internal"), ("OriginalFilename", "orig.exe")],
                "Internal",
            ),
            (vec![("OriginalFilename", "orig.tool.exe")], "orig.tool"),
            (vec![("CompanyName", "Acme")], "fallback"),
        ];

        for (fields, expected) in cases {
            let block = block(VersionBuilder::new().table("040904B0", &fields));
            assert_eq!(
                chain.resolve_alternate_label(Some(&block), &FALLBACK_VARIANTS, path),
                expected
            );
        }
    }

    #[test]
    fn test_requested_key_in_undeclared_table_composes() {
        let chain = FieldChain::new();
        let block = block(
            VersionBuilder::new()
                .version(1, 2, 3, 4)
                .translations(&[(0x0409, 0x04B0)])
                .table("040904B0", &[("ProductName", "Acme Tool")])
                .table("041904E3", &[("Package", "HIDDEN-PKG")]),
        );
        let label = chain.package_label(Some(&block), "Package", Path::new("acme.exe"));
        assert_eq!(label.to_string(), "Acme Tool - 1.2.3.4");
        assert_eq!(
            chain.resolve_label(Some(&block), "Package", &read_translations(&block), Path::new("acme.exe")),
            "Acme Tool"
        );
    }

    #[test]
    fn test_declared_chain_before_undeclared_tables() {
        let chain = FieldChain::new();
        let block = block(
            VersionBuilder::new()
                .version(1, 0, 0, 0)
                .translations(&[(0x0409, 0x04E4)])
                .table("040904E4", &[("FileDescription", "Declared Desc")])
                .table("040904B0", &[("ProductName", "Undeclared Prod")]),
        );
        let label = chain.package_label(Some(&block), "Package", Path::new("tool.exe"));
        assert_eq!(label.to_string(), "Declared Desc - 1.0.0.0");
    }

    #[test]
    fn test_undeclared_tables_after_declared_chain() {
        let chain = FieldChain::new();
        let block = block(
            VersionBuilder::new()
                .version(3, 1, 0, 0)
                .translations(&[(0x0409, 0x04B0)])
                .table("041904E3", &[("InternalName", "svc-core"), ("OriginalFilename", "svc.exe")]),
        );
        let label = chain.package_label(Some(&block), "Package", Path::new("svc.exe"));
        assert_eq!(label.to_string(), "svc-core - 3.1.0.0");

        // OriginalFilename is not part of the second pass
        let block = self::block(
            VersionBuilder::new()
                .translations(&[(0x0409, 0x04B0)])
                .table("041904E3", &[("OriginalFilename", "orig.exe")]),
        );
        assert_eq!(
            chain.resolve_alternate_label(Some(&block), &read_translations(&block), Path::new("disk.exe")),
            "disk"
        );
    }

    #[test]
    fn test_fallback_key_lists() {
        assert_eq!(
            LABEL_FALLBACK_KEYS,
            ["ProductName", "FileDescription", "InternalName", "OriginalFilename"]
        );
        assert_eq!(SECONDARY_LABEL_KEYS, ["ProductName", "FileDescription", "InternalName"]);
    }

    #[test]
    fn test_absent_block() {
        let chain = FieldChain::new();
        let path = Path::new("/usr/lib/libfoo.dll");
        assert_eq!(chain.resolve_version(None), "0.0.0.0");
        assert_eq!(
            chain.resolve_label(None, "Package", &FALLBACK_VARIANTS, path),
            "libfoo"
        );
        assert_eq!(
            chain.package_label(None, "Package", path),
            PackageLabel::Composed {
                label: "libfoo".into(),
                version: "0.0.0.0".into(),
            }
        );
    }

    #[test]
    fn test_block_without_fixed_info() {
        let chain = FieldChain::new();
        let block = block(VersionBuilder::new().table("040904B0", &[("ProductName", "Tool")]));
        assert_eq!(
            chain.package_label(Some(&block), "Package", Path::new("t.exe")).to_string(),
            "Tool - 0.0.0.0"
        );
    }
}

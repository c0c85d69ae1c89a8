//! Version resource interpretation.
//!
//! ## Query model
//!
//! A [`ResourceBlock`](crate::ResourceBlock) answers backslash-separated
//! queries over its node tree:
//!
//! - `\`: the root node, whose value is the `VS_FIXEDFILEINFO` record
//! - `\VarFileInfo\Translation`: the declared (language, codepage) pairs
//! - `\StringFileInfo\<variant>\<key>`: one localized string
//!
//! On top of that sit the translation reader ([`read_translations`]), the
//! string field sources ([`FieldResolver`]), the fixed version decoder
//! ([`FixedVersion`]) and the label policy ([`FieldChain`]).

pub(crate) mod node;

mod chain;
mod field;
mod fixed;
mod translation;

pub use chain::{strip_extension, FieldChain, PackageLabel, LABEL_FALLBACK_KEYS, SECONDARY_LABEL_KEYS};
pub use field::{
    resolve_string, DeclaredVariants, FieldResolver, FieldSource, PresentTables, STRING_FILE_INFO,
};
pub use fixed::{FixedVersion, DEFAULT_VERSION, FIXED_INFO_LEN, FIXED_INFO_SIGNATURE};
pub use node::{Children, VersionNode, ROOT_KEY};
pub use translation::{
    declared_translations, read_translations, VersionVariant, FALLBACK_VARIANTS,
    TRANSLATION_QUERY,
};

//! Language/codepage variants and the translation table.

use crate::error::{Error, Result};
use crate::le::read_u16;
use crate::resource::ResourceBlock;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Query path of the translation table
pub const TRANSLATION_QUERY: &str = "\\VarFileInfo\\Translation";

/// A (language, codepage) pair naming one localized string table.
///
/// Renders as eight uppercase hex digits, language first: `040904B0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionVariant {
    language: u16,
    codepage: u16,
}

impl VersionVariant {
    /// Creates a variant from its language and codepage ids
    pub const fn new(language: u16, codepage: u16) -> Self {
        Self { language, codepage }
    }

    /// Language id
    pub fn language(&self) -> u16 {
        self.language
    }

    /// Codepage id
    pub fn codepage(&self) -> u16 {
        self.codepage
    }

    /// Canonical eight-digit code used in `StringFileInfo` keys
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VersionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}{:04X}", self.language, self.codepage)
    }
}

impl FromStr for VersionVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::malformed(0, format!("invalid variant code '{}'", s));
        if s.len() != 8 || !s.is_ascii() {
            return Err(invalid());
        }
        let language = u16::from_str_radix(&s[..4], 16).map_err(|_| invalid())?;
        let codepage = u16::from_str_radix(&s[4..], 16).map_err(|_| invalid())?;
        Ok(Self::new(language, codepage))
    }
}

/// Variants probed when a block declares none, best first:
/// Unicode before the ANSI codepage, US English before other English,
/// then other languages, then the neutral pairs.
pub const FALLBACK_VARIANTS: [VersionVariant; 9] = [
    VersionVariant::new(0x0409, 0x04B0), // English (US), Unicode
    VersionVariant::new(0x0409, 0x04E4), // English (US), Windows-1252
    VersionVariant::new(0x0410, 0x04B0), // Italian, Unicode
    VersionVariant::new(0x0410, 0x04E4), // Italian, Windows-1252
    VersionVariant::new(0x0407, 0x04B0), // German, Unicode
    VersionVariant::new(0x040C, 0x04B0), // French, Unicode
    VersionVariant::new(0x0809, 0x04B0), // English (UK), Unicode
    VersionVariant::new(0x0000, 0x04B0), // Neutral, Unicode
    VersionVariant::new(0x0000, 0x04E4), // Neutral, Windows-1252
];

/// Returns the variants to probe for `block`, never empty.
///
/// Declared variants keep their table order. A missing, empty, or
/// misaligned table yields [`FALLBACK_VARIANTS`].
pub fn read_translations(block: &ResourceBlock) -> Vec<VersionVariant> {
    match declared_translations(block) {
        Ok(variants) => variants,
        Err(e) => {
            trace!("Using fallback variants: {}", e);
            FALLBACK_VARIANTS.to_vec()
        }
    }
}

/// Decodes the translation table exactly as declared.
pub fn declared_translations(block: &ResourceBlock) -> Result<Vec<VersionVariant>> {
    let node = block.query(TRANSLATION_QUERY)?;
    let table = node.value();
    if node.declared_len() != table.len() {
        return Err(Error::malformed(
            0,
            format!(
                "translation table declares {} bytes, holds {}",
                node.declared_len(),
                table.len()
            ),
        ));
    }
    if table.is_empty() || table.len() % 4 != 0 {
        return Err(Error::malformed(
            0,
            format!("translation table length {} is not a positive multiple of 4", table.len()),
        ));
    }

    table
        .chunks_exact(4)
        .map(|pair| Ok(VersionVariant::new(read_u16(pair, 0)?, read_u16(pair, 2)?)))
        .collect()
}

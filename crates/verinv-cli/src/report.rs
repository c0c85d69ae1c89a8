//! Delimited report output.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use verinv_core::FileRecord;

/// Column names of the report
pub const HEADER: [&str; 4] = ["FullPath", "PackageLabel", "LastModified", "SizeBytes"];

const LINE_END: &str = "\r\n";

/// Writes `records` to `path`, creating parent directories as needed
pub fn write_report(path: &Path, records: &[FileRecord], delimiter: char) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_records(&mut out, records, delimiter)
        .and_then(|()| out.flush())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(())
}

/// Writes the header row and one row per record
pub fn write_records<W: Write>(out: &mut W, records: &[FileRecord], delimiter: char) -> io::Result<()> {
    write_row(out, &HEADER, delimiter)?;
    for record in records {
        let path = record.path.to_string_lossy();
        let package = record.package.to_string();
        let modified = record.modified_display();
        let size = record.size.to_string();
        let row = [&*path, package.as_str(), modified.as_str(), size.as_str()];
        write_row(out, &row, delimiter)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, fields: &[&str], delimiter: char) -> io::Result<()> {
    let mut separator = [0u8; 4];
    let separator = delimiter.encode_utf8(&mut separator);

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.write_all(separator.as_bytes())?;
        }
        out.write_all(escape_field(field, delimiter).as_bytes())?;
    }
    out.write_all(LINE_END.as_bytes())
}

/// Quotes a field containing the delimiter, a quote or a line break
pub fn escape_field(field: &str, delimiter: char) -> Cow<'_, str> {
    let needs_quotes = field
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

// 📤 Export Service - two non-interchangeable file formats
//
// 1. Filtered export: stream of 6-element string arrays, one JSON array per
//    line, feed_type left out for the external reporting body. Refuses an
//    empty list before touching the target file.
// 2. Snapshot: every field, `|`-delimited, `\|` escaping, one pet per line.
//    Truncates and rewrites the target; an empty list yields an empty file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::entities::Pet;
use crate::error::ExportError;

/// Snapshot record separator
pub const FIELD_SEPARATOR: char = '|';

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

// ============================================================================
// EXPORTER CAPABILITY
// ============================================================================

pub trait PetExporter {
    /// Write {common_name, nickname, classification, family, genus, species}
    /// per pet. Fails on an empty list.
    fn export_without_feed_type(&self, pets: &[Pet], path: &Path) -> Result<(), ExportError>;

    /// Rewrite `path` with one escaped 7-field line per pet
    fn save_snapshot(&self, pets: &[Pet], path: &Path) -> Result<(), ExportError>;
}

/// Exporter writing to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExporter;

impl PetExporter for FileExporter {
    fn export_without_feed_type(&self, pets: &[Pet], path: &Path) -> Result<(), ExportError> {
        if pets.is_empty() {
            return Err(ExportError::EmptyInput);
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for pet in pets {
            serde_json::to_writer(&mut writer, &pet.without_feed_type())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        info!(path = %path.display(), count = pets.len(), "filtered export written");
        Ok(())
    }

    fn save_snapshot(&self, pets: &[Pet], path: &Path) -> Result<(), ExportError> {
        // File::create truncates: a snapshot is always a full rewrite
        let mut writer = BufWriter::new(File::create(path)?);
        for pet in pets {
            writer.write_all(snapshot_line(pet).as_bytes())?;
            writer.write_all(LINE_ENDING.as_bytes())?;
        }
        writer.flush()?;

        info!(path = %path.display(), count = pets.len(), "snapshot saved");
        Ok(())
    }
}

// ============================================================================
// SNAPSHOT ENCODING
// ============================================================================

pub fn escape_pipe(text: &str) -> String {
    text.replace(FIELD_SEPARATOR, "\\|")
}

/// One snapshot line, without terminator
pub fn snapshot_line(pet: &Pet) -> String {
    pet.to_fields()
        .iter()
        .map(|field| escape_pipe(field))
        .collect::<Vec<_>>()
        .join("|")
}

/// Split on unescaped `|`, turning `\|` back into `|`.
/// A backslash not followed by `|` is kept as-is.
pub fn split_snapshot_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&FIELD_SEPARATOR) => {
                current.push(FIELD_SEPARATOR);
                chars.next();
            }
            FIELD_SEPARATOR => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Read a snapshot file back into pets. Blank lines are ignored.
pub fn load_snapshot(path: &Path) -> Result<Vec<Pet>, ExportError> {
    let content = fs::read_to_string(path)?;
    let mut pets = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let fields: [String; 7] = split_snapshot_line(line)
            .try_into()
            .map_err(|fields: Vec<String>| ExportError::Malformed {
                line: index + 1,
                found: fields.len(),
            })?;

        pets.push(Pet::from_fields(fields));
    }

    Ok(pets)
}

/// Read a filtered export back as its 6-field tuples
pub fn read_filtered_export(path: &Path) -> Result<Vec<[String; 6]>, ExportError> {
    let reader = BufReader::new(File::open(path)?);

    let records = serde_json::Deserializer::from_reader(reader)
        .into_iter::<[String; 6]>()
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

// 🏗️ Import Sources - raw positional records for the bulk importer
//
// Every source produces the same thing: a list of raw records, each a list of
// up to seven positional text fields. Interpreting them (missing fields,
// completion, insertion) is the reconciler's job, not the parser's.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

use crate::error::ImportError;

/// Positional fields as read from the source, untrimmed and unchecked
pub type RawRecord = Vec<String>;

// ============================================================================
// SOURCE FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportFormat {
    /// `key=value1,value2,...` property list
    Properties,

    /// Headerless CSV, one record per row
    Csv,
}

impl ImportFormat {
    pub fn name(&self) -> &str {
        match self {
            ImportFormat::Properties => "properties",
            ImportFormat::Csv => "csv",
        }
    }
}

/// Pick a format from the file extension; anything but `.csv` is a property list
pub fn detect_format(file_path: &Path) -> ImportFormat {
    let is_csv = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        ImportFormat::Csv
    } else {
        ImportFormat::Properties
    }
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

pub trait RecordSource {
    fn read_records(&self, file_path: &Path) -> Result<Vec<RawRecord>, ImportError>;

    fn format(&self) -> ImportFormat;
}

pub fn get_source(format: ImportFormat) -> Box<dyn RecordSource> {
    match format {
        ImportFormat::Properties => Box::new(PropertiesSource),
        ImportFormat::Csv => Box::new(CsvSource),
    }
}

// ============================================================================
// PROPERTY LIST
// ============================================================================

/// Property list: each value is split on `,` into the positional fields.
/// Keys only identify entries; they carry no pet data.
pub struct PropertiesSource;

impl RecordSource for PropertiesSource {
    fn read_records(&self, file_path: &Path) -> Result<Vec<RawRecord>, ImportError> {
        let content = fs::read_to_string(file_path)?;
        let entries = parse_properties(&content)?;

        Ok(entries.iter().map(|(_, value)| split_record(value)).collect())
    }

    fn format(&self) -> ImportFormat {
        ImportFormat::Properties
    }
}

pub fn split_record(value: &str) -> RawRecord {
    value.split(',').map(str::to_string).collect()
}

/// Parse property-list text into (key, value) pairs, in file order.
///
/// Supports `#`/`!` comments, `=`, `:` or whitespace separators, trailing
/// backslash continuation and `\t \n \r \f \uXXXX` escapes. A repeated key
/// keeps its first position and takes the last value.
pub fn parse_properties(content: &str) -> Result<Vec<(String, String)>, ImportError> {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut lines = content.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let line_number = index + 1;
        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_key_value(&logical);
        let key = unescape(raw_key, line_number)?;
        let value = unescape(raw_value, line_number)?;

        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    Ok(entries)
}

/// Odd number of trailing backslashes means the line continues
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest.strip_prefix(|c: char| c == '=' || c == ':').unwrap_or(rest);

    (&line[..key_end], rest.trim_start())
}

fn unescape(text: &str, line: usize) -> Result<String, ImportError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ImportError::InvalidEscape { line });
                }
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(ImportError::InvalidEscape { line })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

// ============================================================================
// CSV
// ============================================================================

/// Headerless CSV; rows may have any number of columns
pub struct CsvSource;

impl RecordSource for CsvSource {
    fn read_records(&self, file_path: &Path) -> Result<Vec<RawRecord>, ImportError> {
        parse_csv_records(File::open(file_path)?)
    }

    fn format(&self) -> ImportFormat {
        ImportFormat::Csv
    }
}

pub fn parse_csv_records<R: std::io::Read>(reader: R) -> Result<Vec<RawRecord>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(records)
}

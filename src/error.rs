// ⚠️ Error Types - business rule violations vs infrastructure failures
//
// Business violations (duplicate, not found, missing fields) abort the single
// operation. Infrastructure failures are logged where they happen and turned
// into `false` / empty results, so the variants here that wrap them only
// travel as far as the registry.

use thiserror::Error;

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, PetError>;

// ============================================================================
// REGISTRY ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum PetError {
    /// An identical pet (same nickname and attributes) is already stored
    #[error("a pet identical to '{nickname}' already exists; insertion rejected")]
    DuplicateRecord { nickname: String },

    /// No pet is stored under the given nickname
    #[error("no pet found with nickname '{nickname}'")]
    NotFound { nickname: String },

    /// Manual entry without every required field
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Underlying store could not be opened or initialized
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

// ============================================================================
// EXPORT ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum ExportError {
    /// Filtered export requires at least one pet
    #[error("no pets to export")]
    EmptyInput,

    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object stream error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot line that does not hold exactly seven fields
    #[error("malformed snapshot line {line}: expected 7 fields, found {found}")]
    Malformed { line: usize, found: usize },
}

// ============================================================================
// IMPORT ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("cannot read import source: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse CSV import source: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid escape sequence on line {line}")]
    InvalidEscape { line: usize },
}

// Exotic Pets Registry - Core Library
// Record store, duplicate rule, exports and bulk import, used by the CLI and tests

pub mod config;
pub mod db;
pub mod deduplication;
pub mod entities;
pub mod error;
pub mod export;
pub mod parser;
pub mod reconciliation;
pub mod registry;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{setup_database, PetRepository, QueryField, SqlitePetRepository, StoreHandle};
pub use deduplication::{find_exact_duplicate, is_exact_duplicate};
pub use entities::{Animal, Pet, FIELD_NAMES};
pub use error::{ExportError, ImportError, PetError, Result};
pub use export::{load_snapshot, read_filtered_export, FileExporter, PetExporter};
pub use parser::{detect_format, get_source, ImportFormat, RawRecord, RecordSource};
pub use reconciliation::{Completion, ImportReconciler, ImportReport, PreparedBatch};
pub use registry::{PetChanges, PetRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use exotic_pets::{
    detect_format, get_source, load_snapshot, AppConfig, Completion, FileExporter, ImportFormat,
    ImportReconciler, Pet, PetChanges, PetRegistry, QueryField, SqlitePetRepository, StoreHandle,
    FIELD_NAMES,
};

type Registry = PetRegistry<SqlitePetRepository, FileExporter>;

/// Exotic pets registry
#[derive(Parser)]
#[command(name = "exotic-pets")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file (overrides PETS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (overrides PETS_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-import pets from a property list or CSV file
    Import {
        file: PathBuf,

        /// Source format; guessed from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Drop incomplete records instead of asking for the missing values
        #[arg(long)]
        skip_incomplete: bool,
    },

    /// Register one pet; every field is required
    Add {
        #[arg(long)]
        common_name: String,
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        classification: String,
        #[arg(long)]
        family: String,
        #[arg(long)]
        genus: String,
        #[arg(long)]
        species: String,
        #[arg(long)]
        feed_type: String,
    },

    /// Change common name, classification or feed type of a pet
    Modify {
        nickname: String,
        #[arg(long)]
        common_name: Option<String>,
        #[arg(long)]
        classification: Option<String>,
        #[arg(long)]
        feed_type: Option<String>,
    },

    /// Remove a pet by nickname
    Remove { nickname: String },

    /// List every registered pet
    List,

    /// Find pets by one field (exact, case-sensitive)
    Query {
        #[arg(value_enum)]
        field: FieldArg,
        value: String,
    },

    /// Write the report export (no feed type)
    Export { path: Option<PathBuf> },

    /// Write the full pipe-delimited snapshot
    Snapshot { path: Option<PathBuf> },

    /// Register the pets of a snapshot whose nickname is not yet stored
    Restore { path: Option<PathBuf> },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Properties,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Nickname,
    Classification,
    Family,
    FeedType,
}

impl From<FieldArg> for QueryField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Nickname => QueryField::Nickname,
            FieldArg::Classification => QueryField::Classification,
            FieldArg::Family => QueryField::Family,
            FieldArg::FeedType => QueryField::FeedType,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {:#}", e);
        return ExitCode::FAILURE;
    }
    init_logging(&config.log_level);

    match run(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Commands, config: &AppConfig) -> Result<bool> {
    let handle = StoreHandle::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let registry = PetRegistry::new(SqlitePetRepository::new(handle), FileExporter);

    let outcome = execute(command, &registry, config);

    let (repository, _) = registry.into_parts();
    repository
        .into_handle()
        .close()
        .context("Failed to close database")?;

    outcome
}

fn execute(command: Commands, registry: &Registry, config: &AppConfig) -> Result<bool> {
    match command {
        Commands::Import {
            file,
            format,
            skip_incomplete,
        } => {
            let format = match format {
                Some(FormatArg::Properties) => ImportFormat::Properties,
                Some(FormatArg::Csv) => ImportFormat::Csv,
                None => detect_format(&file),
            };
            let records = get_source(format)
                .read_records(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!(
                "📂 {} records read from {} ({})",
                records.len(),
                file.display(),
                format.name()
            );

            let reconciler = ImportReconciler::new(registry);
            let report = if skip_incomplete {
                reconciler.import(&records, |_| Completion::Cancelled)
            } else {
                reconciler.import(&records, prompt_completion)
            };

            println!("✓ {}", report.summary());
            println!("✓ {} pets loaded", report.inserted);
            Ok(true)
        }

        Commands::Add {
            common_name,
            nickname,
            classification,
            family,
            genus,
            species,
            feed_type,
        } => {
            let pet = Pet::new(
                common_name.trim(),
                nickname.trim(),
                classification.trim(),
                family.trim(),
                genus.trim(),
                species.trim(),
                feed_type.trim(),
            );
            let added = registry.register(&pet)?;
            report_outcome(added, "Pet added", "Could not add the pet (storage error)")
        }

        Commands::Modify {
            nickname,
            common_name,
            classification,
            feed_type,
        } => {
            let changes = PetChanges {
                nickname: nickname.trim().to_string(),
                common_name,
                classification,
                feed_type,
            };
            let modified = registry.apply_changes(&changes)?;
            report_outcome(modified, "Pet modified", "Could not modify the pet (storage error)")
        }

        Commands::Remove { nickname } => report_outcome(
            registry.remove_existing(nickname.trim()),
            "Pet removed",
            "No pet removed (unknown nickname or storage error)",
        ),

        Commands::List => {
            print_pets(&registry.list_all());
            Ok(true)
        }

        Commands::Query { field, value } => {
            print_pets(&registry.query(field.into(), &value));
            Ok(true)
        }

        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| config.export_path.clone());
            report_outcome(
                registry.export_without_feed_type(&path),
                &format!("Export written to {}", path.display()),
                "Export failed (is the registry empty?)",
            )
        }

        Commands::Snapshot { path } => {
            let path = path.unwrap_or_else(|| config.snapshot_path.clone());
            report_outcome(
                registry.save_snapshot(&path),
                &format!("Snapshot saved to {}", path.display()),
                "Snapshot failed",
            )
        }

        Commands::Restore { path } => {
            let path = path.unwrap_or_else(|| config.snapshot_path.clone());
            let pets = load_snapshot(&path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            let report = ImportReconciler::new(registry).restore(&pets);

            println!("✓ {}", report.summary());
            Ok(true)
        }
    }
}

fn report_outcome(success: bool, ok_message: &str, failure_message: &str) -> Result<bool> {
    if success {
        println!("✓ {}", ok_message);
    } else {
        eprintln!("❌ {}", failure_message);
    }
    Ok(success)
}

fn print_pets(pets: &[Pet]) {
    if pets.is_empty() {
        println!("No pets found.");
        return;
    }

    println!(
        "{:<16} {:<20} {:<14} {:<16} {:<14} {:<18} {}",
        "NICKNAME", "COMMON NAME", "CLASS", "FAMILY", "GENUS", "SPECIES", "FEED"
    );
    for pet in pets {
        println!(
            "{:<16} {:<20} {:<14} {:<16} {:<14} {:<18} {}",
            pet.nickname,
            pet.common_name(),
            pet.classification(),
            pet.family(),
            pet.genus(),
            pet.species(),
            pet.feed_type()
        );
    }
    println!("\n{} pets", pets.len());
}

/// Ask on stdin for each empty field. A required field left empty, or end of
/// input, cancels the record.
fn prompt_completion(fields: &[String; 7]) -> Completion {
    println!("\n⚠️  Incomplete record: {}", fields.join(","));

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut completed = fields.clone();

    for (index, name) in FIELD_NAMES.iter().enumerate() {
        if !completed[index].is_empty() {
            continue;
        }

        print!("   {}: ", name);
        if io::stdout().flush().is_err() {
            return Completion::Cancelled;
        }

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return Completion::Cancelled,
            Ok(_) => {}
        }

        let value = line.trim().to_string();
        if value.is_empty() && *name != "feed_type" {
            println!("   Record cancelled.");
            return Completion::Cancelled;
        }
        completed[index] = value;
    }

    Completion::Completed(completed)
}

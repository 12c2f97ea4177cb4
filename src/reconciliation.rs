// ⚖️ Import Reconciliation - raw records → registered pets
//
// Per raw record:
//   1. read the seven positional fields (missing → "", values trimmed,
//      line breaks folded into spaces so every pet fits one snapshot line)
//   2. incomplete if any field other than feed_type is empty
//   3. incomplete records go to the completion callback; cancel drops them
//   4. build the pet
//   5. insert through the registry only if the nickname is not yet stored
//
// A failing record never stops the batch. Importing the same batch twice
// inserts nothing the second time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::PetRepository;
use crate::entities::Pet;
use crate::export::PetExporter;
use crate::parser::RawRecord;
use crate::registry::PetRegistry;

/// Number of positional fields in a raw record
pub const FIELD_COUNT: usize = 7;

/// Position of feed_type, the only field allowed to be empty
const FEED_TYPE_INDEX: usize = 6;

// ============================================================================
// COMPLETION
// ============================================================================

/// Answer of the completion callback for an incomplete record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// All seven values, in positional order
    Completed([String; FIELD_COUNT]),

    /// Drop the record
    Cancelled,
}

/// Field at `index`, trimmed and on one line; out of range becomes ""
pub fn field_at(record: &[String], index: usize) -> String {
    record
        .get(index)
        .map(|value| single_line(value.trim()))
        .unwrap_or_default()
}

/// Replace each line break (`\r\n`, `\r` or `\n`) with a space
pub fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

pub fn extract_fields(record: &[String]) -> [String; FIELD_COUNT] {
    std::array::from_fn(|index| field_at(record, index))
}

/// Any of common_name, nickname, classification, family, genus, species empty
pub fn is_incomplete(fields: &[String; FIELD_COUNT]) -> bool {
    fields
        .iter()
        .enumerate()
        .any(|(index, value)| index != FEED_TYPE_INDEX && value.is_empty())
}

// ============================================================================
// IMPORT REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    /// Raw records read from the source
    pub total: usize,

    /// Records that needed completion
    pub incomplete: usize,

    /// Incomplete records the user cancelled
    pub cancelled: usize,

    /// Nickname already registered, not inserted
    pub skipped_existing: usize,

    /// Rejected by a registry rule (duplicate)
    pub rejected: usize,

    /// Insert returned false (storage failure)
    pub failed: usize,

    pub inserted: usize,

    pub imported_at: DateTime<Utc>,
}

impl ImportReport {
    fn new(total: usize) -> Self {
        ImportReport {
            total,
            incomplete: 0,
            cancelled: 0,
            skipped_existing: 0,
            rejected: 0,
            failed: 0,
            inserted: 0,
            imported_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Import at {}: {} records, {} inserted, {} already registered, \
             {} cancelled, {} rejected, {} failed",
            self.imported_at.format("%Y-%m-%d %H:%M:%S"),
            self.total,
            self.inserted,
            self.skipped_existing,
            self.cancelled,
            self.rejected,
            self.failed
        )
    }
}

/// Pets ready to insert, with the completion counts that produced them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedBatch {
    pub pets: Vec<Pet>,

    /// Records that went to the completion callback
    pub incomplete: usize,

    /// Of those, the ones dropped
    pub cancelled: usize,
}

// ============================================================================
// RECONCILER
// ============================================================================

pub struct ImportReconciler<'a, R, E> {
    registry: &'a PetRegistry<R, E>,
}

impl<'a, R: PetRepository, E: PetExporter> ImportReconciler<'a, R, E> {
    pub fn new(registry: &'a PetRegistry<R, E>) -> Self {
        ImportReconciler { registry }
    }

    /// Turn raw records into pets, asking `complete` to fill the gaps
    pub fn prepare<F>(&self, records: &[RawRecord], mut complete: F) -> PreparedBatch
    where
        F: FnMut(&[String; FIELD_COUNT]) -> Completion,
    {
        let mut batch = PreparedBatch {
            pets: Vec::with_capacity(records.len()),
            ..Default::default()
        };

        for record in records {
            let mut fields = extract_fields(record);

            if is_incomplete(&fields) {
                batch.incomplete += 1;
                match complete(&fields) {
                    Completion::Completed(completed) => {
                        fields = completed.map(|value| single_line(&value));
                    }
                    Completion::Cancelled => {
                        debug!(nickname = %fields[1], "incomplete record cancelled");
                        batch.cancelled += 1;
                        continue;
                    }
                }
            }

            batch.pets.push(Pet::from_fields(fields));
        }

        batch
    }

    /// Full import: prepare, then insert pets whose nickname is new
    pub fn import<F>(&self, records: &[RawRecord], complete: F) -> ImportReport
    where
        F: FnMut(&[String; FIELD_COUNT]) -> Completion,
    {
        let mut report = ImportReport::new(records.len());
        let batch = self.prepare(records, complete);
        report.incomplete = batch.incomplete;
        report.cancelled = batch.cancelled;

        for pet in &batch.pets {
            if self.registry.exists_by_nickname(&pet.nickname) {
                report.skipped_existing += 1;
                continue;
            }

            match self.registry.add_pet(pet) {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    warn!(nickname = %pet.nickname, error = %e, "import record skipped");
                    report.rejected += 1;
                }
            }
        }

        info!(
            total = report.total,
            inserted = report.inserted,
            skipped = report.skipped_existing,
            "import finished"
        );
        report
    }

    /// Re-register pets read from a snapshot; existing nicknames are kept
    pub fn restore(&self, pets: &[Pet]) -> ImportReport {
        let records: Vec<RawRecord> = pets.iter().map(|pet| pet.to_fields().to_vec()).collect();
        self.import(&records, |_| Completion::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{QueryField, SqlitePetRepository, StoreHandle};
    use crate::export::FileExporter;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn registry() -> PetRegistry<SqlitePetRepository, FileExporter> {
        PetRegistry::new(
            SqlitePetRepository::new(StoreHandle::open_in_memory().unwrap()),
            FileExporter,
        )
    }

    fn raw(values: &[&str]) -> RawRecord {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_batch() -> Vec<RawRecord> {
        vec![
            raw(&["Parrot", "Lunita", "Bird", "Psittacidae", "Amazona", "A. aestiva", "Herbivore"]),
            raw(&["Iguana", "Draco", "Reptile", "Iguanidae", "Iguana", "I. iguana", "Herbivore"]),
            raw(&[
                "Axolotl",
                "Axo",
                "Amphibian",
                "Ambystomatidae",
                "Ambystoma",
                "A. mexicanum",
                "",
            ]),
        ]
    }

    fn never_called(_: &[String; FIELD_COUNT]) -> Completion {
        panic!("complete records must not reach the callback")
    }

    #[test]
    fn test_extract_fields_is_defensive() {
        let fields = extract_fields(&raw(&[" Parrot ", "Lunita"]));

        assert_eq!(fields[0], "Parrot");
        assert_eq!(fields[1], "Lunita");
        assert_eq!(fields[6], "");
    }

    #[test]
    fn test_feed_type_may_be_empty() {
        let complete = extract_fields(&raw(&["a", "b", "c", "d", "e", "f", ""]));
        let missing_genus = extract_fields(&raw(&["a", "b", "c", "d", "", "f", "g"]));

        assert!(!is_incomplete(&complete));
        assert!(is_incomplete(&missing_genus));
    }

    #[test]
    fn test_import_inserts_complete_records() {
        let registry = registry();
        let report = ImportReconciler::new(&registry).import(&sample_batch(), never_called);

        assert_eq!(report.total, 3);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.incomplete, 0);
        assert_eq!(registry.list_all().len(), 3);
    }

    #[test]
    fn test_import_twice_is_idempotent() {
        let registry = registry();
        let reconciler = ImportReconciler::new(&registry);

        let first = reconciler.import(&sample_batch(), never_called);
        let after_first = registry.list_all();
        let second = reconciler.import(&sample_batch(), never_called);

        assert_eq!(first.inserted, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_existing, 3);
        assert_eq!(registry.list_all(), after_first);
    }

    #[test]
    fn test_incomplete_record_is_completed() {
        let registry = registry();
        let batch = vec![raw(&["Gecko", "Spot", "", "Gekkonidae"])];
        let mut seen = Vec::new();

        let report = ImportReconciler::new(&registry).import(&batch, |fields| {
            seen.push(fields.clone());
            let mut done = fields.clone();
            done[2] = "Reptile".to_string();
            done[4] = "Eublepharis".to_string();
            done[5] = "E. macularius".to_string();
            Completion::Completed(done)
        });

        assert_eq!(report.incomplete, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(seen[0][0], "Gecko");
        assert_eq!(seen[0][6], "");

        let stored = &registry.query_by_nickname("Spot")[0];
        assert_eq!(stored.classification(), "Reptile");
        assert_eq!(stored.species(), "E. macularius");
    }

    #[test]
    fn test_cancelled_record_is_dropped() {
        let registry = registry();
        let mut batch = sample_batch();
        batch.push(raw(&["", "Nameless"]));

        let report = ImportReconciler::new(&registry).import(&batch, |_| Completion::Cancelled);

        assert_eq!(report.cancelled, 1);
        assert_eq!(report.inserted, 3);
        assert!(!registry.exists_by_nickname("Nameless"));
    }

    #[test]
    fn test_repeated_nickname_within_batch() {
        let registry = registry();
        let batch = vec![
            raw(&["Parrot", "Lunita", "Bird", "Psittacidae", "Amazona", "A. aestiva", "Herbivore"]),
            raw(&["Macaw", "Lunita", "Bird", "Psittacidae", "Ara", "A. macao", "Frugivore"]),
        ];

        let report = ImportReconciler::new(&registry).import(&batch, never_called);

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(registry.query_by_nickname("Lunita")[0].common_name(), "Parrot");
    }

    #[test]
    fn test_storage_failure_does_not_abort_batch() {
        let registry = registry();
        registry
            .repository()
            .handle()
            .connection()
            .execute("DROP TABLE pets", [])
            .unwrap();

        let report = ImportReconciler::new(&registry).import(&sample_batch(), never_called);

        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed, 3);
    }

    #[test]
    fn test_restore_skips_existing() {
        let registry = registry();
        let reconciler = ImportReconciler::new(&registry);
        reconciler.import(&sample_batch()[..1], never_called);

        let pets: Vec<Pet> = sample_batch()
            .iter()
            .map(|r| Pet::from_fields(extract_fields(r)))
            .collect();
        let report = reconciler.restore(&pets);

        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped_existing, 1);
        assert!(report.summary().contains("2 inserted"));
    }

    #[test]
    fn test_prepare_counts() {
        let registry = registry();
        let mut batch = sample_batch();
        batch.push(raw(&["Gecko", "Spot", "", "Gekkonidae"]));
        batch.push(raw(&["", "Nameless"]));

        let prepared = ImportReconciler::new(&registry).prepare(&batch, |fields| {
            if fields[1] == "Spot" {
                let mut done = fields.clone();
                done[2] = "Reptile".to_string();
                done[4] = "Eublepharis".to_string();
                done[5] = "E. macularius".to_string();
                Completion::Completed(done)
            } else {
                Completion::Cancelled
            }
        });

        assert_eq!(prepared.pets.len(), 4);
        assert_eq!(prepared.incomplete, 2);
        assert_eq!(prepared.cancelled, 1);
        assert!(registry.list_all().is_empty());
    }

    #[test]
    fn test_line_breaks_are_folded() {
        let fields = extract_fields(&raw(&["Parrot\n", "Lu\r\nnita", "Bird\rAves"]));
        assert_eq!(fields[0], "Parrot");
        assert_eq!(fields[1], "Lu nita");
        assert_eq!(fields[2], "Bird Aves");

        let registry = registry();
        let batch = vec![raw(&["Gecko", "Spot", ""])];
        ImportReconciler::new(&registry).import(&batch, |fields| {
            let mut done = fields.clone();
            done[2] = "Reptile".to_string();
            done[3] = "Gekkonidae".to_string();
            done[4] = "Eublepharis".to_string();
            done[5] = "E. macularius".to_string();
            done[6] = "Crickets\nWorms".to_string();
            Completion::Completed(done)
        });

        assert_eq!(registry.query_by_nickname("Spot")[0].feed_type(), "Crickets Worms");
    }

    /// Store whose first nickname lookup misses a pet that is already there,
    /// like a row written between the existence check and the insert
    #[derive(Default)]
    struct LateRowRepository {
        late: Vec<Pet>,
        stored: RefCell<Vec<Pet>>,
        lookups: RefCell<HashMap<String, usize>>,
    }

    impl PetRepository for LateRowRepository {
        fn insert(&self, pet: &Pet) -> bool {
            self.stored.borrow_mut().push(pet.clone());
            true
        }

        fn update(&self, _pet: &Pet) -> bool {
            false
        }

        fn delete(&self, _nickname: &str) -> bool {
            false
        }

        fn query_by(&self, field: QueryField, value: &str) -> Vec<Pet> {
            let mut found: Vec<Pet> = self
                .stored
                .borrow()
                .iter()
                .filter(|p| field == QueryField::Nickname && p.nickname == value)
                .cloned()
                .collect();

            let mut lookups = self.lookups.borrow_mut();
            let seen = lookups.entry(value.to_string()).or_insert(0);
            *seen += 1;
            if *seen > 1 {
                found.extend(self.late.iter().filter(|p| p.nickname == value).cloned());
            }
            found
        }

        fn list_all(&self) -> Vec<Pet> {
            self.stored.borrow().clone()
        }
    }

    #[test]
    fn test_rejected_record_does_not_abort_batch() {
        let batch = sample_batch();
        let lunita = Pet::from_fields(extract_fields(&batch[0]));
        let repository = LateRowRepository {
            late: vec![lunita],
            ..Default::default()
        };
        let registry = PetRegistry::new(repository, FileExporter);

        let report = ImportReconciler::new(&registry).import(&batch, never_called);

        assert_eq!(report.rejected, 1);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 0);
        let stored: Vec<String> = registry
            .list_all()
            .into_iter()
            .map(|pet| pet.nickname)
            .collect();
        assert_eq!(stored, vec!["Draco", "Axo"]);
    }
}

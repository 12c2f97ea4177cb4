// End-to-end: property file → import → edit → exports → restore into a fresh store

use exotic_pets::{
    detect_format, get_source, load_snapshot, read_filtered_export, Completion, FileExporter,
    ImportReconciler, Pet, PetChanges, PetError, PetRegistry, SqlitePetRepository, StoreHandle,
};
use std::fs;
use tempfile::TempDir;

const PROPERTIES: &str = "\
# exotic pets
mascota1=Parrot,Lunita,Bird,Psittacidae,Amazona,A. aestiva,Corn|Seed
mascota2=Green iguana,Draco,Reptile,Iguanidae,Iguana,I. iguana,Herbivore
mascota3=Axolotl,Axo,Amphibian,,Ambystoma,A. mexicanum,Carnivore
mascota4=,Nameless
";

fn open_registry(path: &std::path::Path) -> PetRegistry<SqlitePetRepository, FileExporter> {
    PetRegistry::new(
        SqlitePetRepository::new(StoreHandle::open(path).unwrap()),
        FileExporter,
    )
}

#[test]
fn test_full_registry_flow() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("mascotas.properties");
    fs::write(&source, PROPERTIES).unwrap();

    let registry = open_registry(&dir.path().join("pets.db"));
    let records = get_source(detect_format(&source)).read_records(&source).unwrap();
    assert_eq!(records.len(), 4);

    // Fill the axolotl's family, give up on the nameless one
    let complete = |fields: &[String; 7]| {
        if fields[1] == "Axo" {
            let mut done = fields.clone();
            done[3] = "Ambystomatidae".to_string();
            Completion::Completed(done)
        } else {
            Completion::Cancelled
        }
    };

    let report = ImportReconciler::new(&registry).import(&records, complete);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.incomplete, 2);
    assert_eq!(report.cancelled, 1);

    // Importing again changes nothing
    let again = ImportReconciler::new(&registry).import(&records, complete);
    assert_eq!(again.inserted, 0);
    assert_eq!(registry.list_all().len(), 3);

    // Identical manual entry is rejected; a different diet is accepted
    let iguana = Pet::new(
        "Green iguana",
        "Draco",
        "Reptile",
        "Iguanidae",
        "Iguana",
        "I. iguana",
        "Herbivore",
    );
    assert!(matches!(registry.add_pet(&iguana), Err(PetError::DuplicateRecord { .. })));

    // Field-level edit leaves the taxonomy alone
    let changes = PetChanges::new("Draco").feed_type("Omnivore");
    assert!(registry.apply_changes(&changes).unwrap());
    let draco = &registry.query_by_nickname("Draco")[0];
    assert_eq!(draco.feed_type(), "Omnivore");
    assert_eq!(draco.family(), "Iguanidae");

    // Exports
    let export_path = dir.path().join("mascotas_idpyba.ser");
    let snapshot_path = dir.path().join("estado.dat");
    assert!(registry.export_without_feed_type(&export_path));
    assert!(registry.save_snapshot(&snapshot_path));

    let exported = read_filtered_export(&export_path).unwrap();
    assert_eq!(exported.len(), 3);
    assert!(exported.iter().all(|tuple| tuple.len() == 6));

    let snapshot = load_snapshot(&snapshot_path).unwrap();
    assert_eq!(snapshot, registry.list_all());
    assert_eq!(snapshot[0].feed_type(), "Corn|Seed");

    // Restore into an empty store
    let restored = open_registry(&dir.path().join("restored.db"));
    let report = ImportReconciler::new(&restored).restore(&snapshot);
    assert_eq!(report.inserted, 3);
    assert_eq!(restored.list_all(), snapshot);
}

#[test]
fn test_empty_registry_exports() {
    let dir = TempDir::new().unwrap();
    let registry = open_registry(&dir.path().join("pets.db"));

    let export_path = dir.path().join("report.ser");
    let snapshot_path = dir.path().join("state.dat");

    assert!(!registry.export_without_feed_type(&export_path));
    assert!(!export_path.exists());

    assert!(registry.save_snapshot(&snapshot_path));
    assert_eq!(fs::read_to_string(&snapshot_path).unwrap(), "");
}

#[test]
fn test_handle_lifecycle() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pets.db");

    let registry = open_registry(&db);
    let parrot = Pet::new(
        "Parrot",
        "Lunita",
        "Bird",
        "Psittacidae",
        "Amazona",
        "A. aestiva",
        "Seeds",
    );
    assert!(registry.register(&parrot).unwrap());

    let (repository, _) = registry.into_parts();
    repository.into_handle().close().unwrap();

    let reopened = open_registry(&db);
    assert!(reopened.exists_by_nickname("Lunita"));
}

#[test]
fn test_escaped_line_break_survives_snapshot() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("mascotas.properties");
    fs::write(
        &source,
        "mascota1=Parrot,Lunita,Bird,Psittacidae,Amazona,A. aestiva,Corn\\nSeed\n",
    )
    .unwrap();

    let registry = open_registry(&dir.path().join("pets.db"));
    let records = get_source(detect_format(&source)).read_records(&source).unwrap();
    assert_eq!(records[0][6], "Corn\nSeed");

    let report = ImportReconciler::new(&registry).import(&records, |_| Completion::Cancelled);
    assert_eq!(report.inserted, 1);

    let snapshot_path = dir.path().join("estado.dat");
    assert!(registry.save_snapshot(&snapshot_path));

    let snapshot = load_snapshot(&snapshot_path).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].feed_type(), "Corn Seed");
    assert_eq!(snapshot, registry.list_all());
}

// 🗄️ Record Store - SQLite-backed pet table
//
// One table, seven TEXT columns. Nickname is indexed but NOT unique at the
// database level: uniqueness is the registry's job.
//
// Every CRUD operation downgrades storage errors to `false` (or an empty
// list) after logging them, so a failing row never aborts a batch.

use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::entities::Pet;

// ============================================================================
// STORE HANDLE
// ============================================================================

/// Long-lived connection to the backing store.
///
/// Open it once, inject it into [`SqlitePetRepository`], close it on the way
/// out. There is no internal locking; callers serialize access.
pub struct StoreHandle {
    conn: Connection,
    path: PathBuf,
}

impl StoreHandle {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;

        // WAL for crash recovery; not fatal if the filesystem refuses it
        if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
            debug!(error = %e, "journal_mode=WAL not applied");
        }

        setup_database(&conn)?;
        debug!(path = %path.display(), "store opened");

        Ok(StoreHandle { conn, path })
    }

    /// Throwaway store for tests and dry runs
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;

        Ok(StoreHandle {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the connection, surfacing any error from the final flush
    pub fn close(self) -> rusqlite::Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| e)?;
        debug!(path = %path.display(), "store closed");
        Ok(())
    }
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            common_name TEXT NOT NULL,
            nickname TEXT NOT NULL,
            classification TEXT NOT NULL,
            family TEXT NOT NULL,
            genus TEXT NOT NULL,
            species TEXT NOT NULL,
            feed_type TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pets_nickname ON pets(nickname)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// QUERY FIELDS
// ============================================================================

/// Columns a pet can be looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Nickname,
    Classification,
    Family,
    FeedType,
}

impl QueryField {
    pub fn column(&self) -> &'static str {
        match self {
            QueryField::Nickname => "nickname",
            QueryField::Classification => "classification",
            QueryField::Family => "family",
            QueryField::FeedType => "feed_type",
        }
    }
}

// ============================================================================
// REPOSITORY CAPABILITY
// ============================================================================

/// Storage operations the registry depends on
pub trait PetRepository {
    fn insert(&self, pet: &Pet) -> bool;

    /// Applies common_name, classification and feed_type only
    fn update(&self, pet: &Pet) -> bool;

    fn delete(&self, nickname: &str) -> bool;

    /// Exact, case-sensitive match on one column
    fn query_by(&self, field: QueryField, value: &str) -> Vec<Pet>;

    fn list_all(&self) -> Vec<Pet>;

    fn query_by_nickname(&self, nickname: &str) -> Vec<Pet> {
        self.query_by(QueryField::Nickname, nickname)
    }

    fn query_by_classification(&self, classification: &str) -> Vec<Pet> {
        self.query_by(QueryField::Classification, classification)
    }

    fn query_by_family(&self, family: &str) -> Vec<Pet> {
        self.query_by(QueryField::Family, family)
    }

    fn query_by_feed_type(&self, feed_type: &str) -> Vec<Pet> {
        self.query_by(QueryField::FeedType, feed_type)
    }
}

// ============================================================================
// SQLITE ADAPTER
// ============================================================================

const SELECT_COLUMNS: &str =
    "SELECT common_name, nickname, classification, family, genus, species, feed_type FROM pets";

pub struct SqlitePetRepository {
    handle: StoreHandle,
}

impl SqlitePetRepository {
    pub fn new(handle: StoreHandle) -> Self {
        SqlitePetRepository { handle }
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Give the handle back so it can be closed
    pub fn into_handle(self) -> StoreHandle {
        self.handle
    }

    pub fn count(&self) -> rusqlite::Result<i64> {
        self.handle
            .connection()
            .query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))
    }

    fn select(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> rusqlite::Result<Vec<Pet>> {
        let mut stmt = self.handle.connection().prepare(sql)?;
        let pets = stmt
            .query_map(args, pet_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pets)
    }
}

fn pet_from_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet::new(
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, String>(5)?,
        row.get::<_, String>(6)?,
    ))
}

impl PetRepository for SqlitePetRepository {
    fn insert(&self, pet: &Pet) -> bool {
        let result = self.handle.connection().execute(
            "INSERT INTO pets (
                common_name, nickname, classification, family, genus, species, feed_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                pet.animal.common_name,
                pet.nickname,
                pet.animal.classification,
                pet.animal.family,
                pet.animal.genus,
                pet.animal.species,
                pet.animal.feed_type,
            ],
        );

        match result {
            Ok(rows) => rows > 0,
            Err(e) => {
                error!(
                    operation = "insert",
                    nickname = %pet.nickname,
                    error = %e,
                    "storage failure"
                );
                false
            }
        }
    }

    fn update(&self, pet: &Pet) -> bool {
        // family, genus, species and nickname are immutable once stored
        let result = self.handle.connection().execute(
            "UPDATE pets SET common_name = ?1, classification = ?2, feed_type = ?3
             WHERE nickname = ?4",
            params![
                pet.animal.common_name,
                pet.animal.classification,
                pet.animal.feed_type,
                pet.nickname,
            ],
        );

        match result {
            Ok(rows) => rows > 0,
            Err(e) => {
                error!(
                    operation = "update",
                    nickname = %pet.nickname,
                    error = %e,
                    "storage failure"
                );
                false
            }
        }
    }

    fn delete(&self, nickname: &str) -> bool {
        let result = self
            .handle
            .connection()
            .execute("DELETE FROM pets WHERE nickname = ?1", params![nickname]);

        match result {
            Ok(rows) => rows > 0,
            Err(e) => {
                error!(operation = "delete", nickname, error = %e, "storage failure");
                false
            }
        }
    }

    fn query_by(&self, field: QueryField, value: &str) -> Vec<Pet> {
        let column = field.column();
        let sql = format!("{} WHERE {} = ?1 ORDER BY id", SELECT_COLUMNS, column);

        self.select(&sql, &[&value as &dyn rusqlite::ToSql]).unwrap_or_else(|e| {
            error!(operation = "query", column, value, error = %e, "storage failure");
            Vec::new()
        })
    }

    fn list_all(&self) -> Vec<Pet> {
        let sql = format!("{} ORDER BY id", SELECT_COLUMNS);

        self.select(&sql, &[]).unwrap_or_else(|e| {
            error!(operation = "list_all", error = %e, "storage failure");
            Vec::new()
        })
    }
}

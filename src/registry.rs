// 📋 Pet Registry - business rules in front of the record store
//
// The registry is the only place the duplicate rule lives. Storage and
// export failures come back as `false`; rule violations come back as
// `PetError` so the caller has to look at them.

use std::path::Path;
use tracing::{error, info, warn};

use crate::db::{PetRepository, QueryField};
use crate::deduplication::find_exact_duplicate;
use crate::entities::Pet;
use crate::error::{PetError, Result};
use crate::export::{FileExporter, PetExporter};

// ============================================================================
// FIELD-LEVEL CHANGES
// ============================================================================

/// Edit request for the mutable fields of one pet.
/// `None` or a blank value keeps what is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetChanges {
    pub nickname: String,
    pub common_name: Option<String>,
    pub classification: Option<String>,
    pub feed_type: Option<String>,
}

impl PetChanges {
    pub fn new(nickname: impl Into<String>) -> Self {
        PetChanges {
            nickname: nickname.into(),
            ..Default::default()
        }
    }

    pub fn common_name(mut self, value: impl Into<String>) -> Self {
        self.common_name = Some(value.into());
        self
    }

    pub fn classification(mut self, value: impl Into<String>) -> Self {
        self.classification = Some(value.into());
        self
    }

    pub fn feed_type(mut self, value: impl Into<String>) -> Self {
        self.feed_type = Some(value.into());
        self
    }

    /// Current record with these changes laid over it
    pub fn merge_into(&self, current: &Pet) -> Pet {
        fn pick(change: &Option<String>, current: &str) -> String {
            match change {
                Some(value) if !value.trim().is_empty() => value.clone(),
                _ => current.to_string(),
            }
        }

        let mut merged = current.clone();
        merged.animal.common_name = pick(&self.common_name, current.common_name());
        merged.animal.classification = pick(&self.classification, current.classification());
        merged.animal.feed_type = pick(&self.feed_type, current.feed_type());
        merged
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

pub struct PetRegistry<R, E = FileExporter> {
    repository: R,
    exporter: E,
}

impl<R: PetRepository, E: PetExporter> PetRegistry<R, E> {
    pub fn new(repository: R, exporter: E) -> Self {
        PetRegistry { repository, exporter }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_parts(self) -> (R, E) {
        (self.repository, self.exporter)
    }

    /// Insert unless an identical pet is stored under the same nickname.
    ///
    /// Only records sharing the nickname are compared, so the same animal
    /// under a different nickname is accepted.
    pub fn add_pet(&self, pet: &Pet) -> Result<bool> {
        let existing = self.repository.query_by_nickname(&pet.nickname);
        if find_exact_duplicate(&existing, pet).is_some() {
            warn!(nickname = %pet.nickname, "duplicate pet rejected");
            return Err(PetError::DuplicateRecord {
                nickname: pet.nickname.clone(),
            });
        }

        let inserted = self.repository.insert(pet);
        if inserted {
            info!(nickname = %pet.nickname, "pet added");
        }
        Ok(inserted)
    }

    /// Manual entry: every field must be filled before the duplicate check
    pub fn register(&self, pet: &Pet) -> Result<bool> {
        let missing = pet.missing_fields();
        if !missing.is_empty() {
            return Err(PetError::MissingFields(missing));
        }
        self.add_pet(pet)
    }

    /// Update the mutable fields of an existing pet
    pub fn modify_pet(&self, pet: &Pet) -> Result<bool> {
        if self.repository.query_by_nickname(&pet.nickname).is_empty() {
            return Err(PetError::NotFound {
                nickname: pet.nickname.clone(),
            });
        }

        let updated = self.repository.update(pet);
        if updated {
            info!(nickname = %pet.nickname, "pet modified");
        }
        Ok(updated)
    }

    /// Merge blank-means-keep changes with the stored record, then modify
    pub fn apply_changes(&self, changes: &PetChanges) -> Result<bool> {
        let current = self
            .repository
            .query_by_nickname(&changes.nickname)
            .into_iter()
            .next()
            .ok_or_else(|| PetError::NotFound {
                nickname: changes.nickname.clone(),
            })?;

        self.modify_pet(&changes.merge_into(&current))
    }

    pub fn remove_pet(&self, nickname: &str) -> bool {
        let removed = self.repository.delete(nickname);
        if removed {
            info!(nickname, "pet removed");
        }
        removed
    }

    /// Remove only after confirming the nickname is registered
    pub fn remove_existing(&self, nickname: &str) -> bool {
        self.exists_by_nickname(nickname) && self.remove_pet(nickname)
    }

    pub fn list_all(&self) -> Vec<Pet> {
        self.repository.list_all()
    }

    pub fn query(&self, field: QueryField, value: &str) -> Vec<Pet> {
        self.repository.query_by(field, value)
    }

    pub fn query_by_nickname(&self, nickname: &str) -> Vec<Pet> {
        self.repository.query_by_nickname(nickname)
    }

    pub fn query_by_classification(&self, classification: &str) -> Vec<Pet> {
        self.repository.query_by_classification(classification)
    }

    pub fn query_by_family(&self, family: &str) -> Vec<Pet> {
        self.repository.query_by_family(family)
    }

    pub fn query_by_feed_type(&self, feed_type: &str) -> Vec<Pet> {
        self.repository.query_by_feed_type(feed_type)
    }

    pub fn exists_by_nickname(&self, nickname: &str) -> bool {
        !self.repository.query_by_nickname(nickname).is_empty()
    }

    // ========================================================================
    // EXPORTS (failures are logged and reported as false)
    // ========================================================================

    pub fn export_without_feed_type(&self, path: &Path) -> bool {
        let pets = self.list_all();
        match self.exporter.export_without_feed_type(&pets, path) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %path.display(), error = %e, "filtered export failed");
                false
            }
        }
    }

    pub fn save_snapshot(&self, path: &Path) -> bool {
        let pets = self.list_all();
        match self.exporter.save_snapshot(&pets, path) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %path.display(), error = %e, "snapshot failed");
                false
            }
        }
    }
}

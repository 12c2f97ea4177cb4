// 🦎 Pet Entity - biological attributes + nickname key
//
// A Pet is an Animal (six taxonomic/diet attributes) plus the nickname that
// identifies it in the registry. Field order everywhere outside this struct
// is the positional order used by imports and snapshots:
//
//   common_name, nickname, classification, family, genus, species, feed_type

use serde::{Deserialize, Serialize};

/// Names of the seven positional fields, in positional order
pub const FIELD_NAMES: [&str; 7] = [
    "common_name",
    "nickname",
    "classification",
    "family",
    "genus",
    "species",
    "feed_type",
];

// ============================================================================
// ANIMAL
// ============================================================================

/// Biological attributes shared by every pet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Animal {
    pub common_name: String,

    /// Taxonomic class, e.g. "Mammal", "Bird", "Reptile"
    pub classification: String,

    pub family: String,
    pub genus: String,
    pub species: String,

    /// Diet, e.g. "Herbivore". Excluded from the filtered export.
    pub feed_type: String,
}

// ============================================================================
// PET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pet {
    #[serde(flatten)]
    pub animal: Animal,

    /// Business key, unique across the registry
    pub nickname: String,
}

impl Pet {
    /// Build a pet from values in positional order
    pub fn new(
        common_name: impl Into<String>,
        nickname: impl Into<String>,
        classification: impl Into<String>,
        family: impl Into<String>,
        genus: impl Into<String>,
        species: impl Into<String>,
        feed_type: impl Into<String>,
    ) -> Self {
        Pet {
            animal: Animal {
                common_name: common_name.into(),
                classification: classification.into(),
                family: family.into(),
                genus: genus.into(),
                species: species.into(),
                feed_type: feed_type.into(),
            },
            nickname: nickname.into(),
        }
    }

    pub fn from_fields(fields: [String; 7]) -> Self {
        let [common_name, nickname, classification, family, genus, species, feed_type] = fields;
        Pet::new(common_name, nickname, classification, family, genus, species, feed_type)
    }

    /// All seven values in positional order
    pub fn to_fields(&self) -> [String; 7] {
        [
            self.animal.common_name.clone(),
            self.nickname.clone(),
            self.animal.classification.clone(),
            self.animal.family.clone(),
            self.animal.genus.clone(),
            self.animal.species.clone(),
            self.animal.feed_type.clone(),
        ]
    }

    /// Positional values without feed_type, for the reporting export
    pub fn without_feed_type(&self) -> [String; 6] {
        [
            self.animal.common_name.clone(),
            self.nickname.clone(),
            self.animal.classification.clone(),
            self.animal.family.clone(),
            self.animal.genus.clone(),
            self.animal.species.clone(),
        ]
    }

    /// Names of the fields left blank; manual entry requires all seven
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.to_fields()
            .iter()
            .zip(FIELD_NAMES)
            .filter(|(value, _)| value.trim().is_empty())
            .map(|(_, name)| name)
            .collect()
    }

    pub fn common_name(&self) -> &str {
        &self.animal.common_name
    }

    pub fn classification(&self) -> &str {
        &self.animal.classification
    }

    pub fn family(&self) -> &str {
        &self.animal.family
    }

    pub fn genus(&self) -> &str {
        &self.animal.genus
    }

    pub fn species(&self) -> &str {
        &self.animal.species
    }

    pub fn feed_type(&self) -> &str {
        &self.animal.feed_type
    }
}

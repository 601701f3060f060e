//! Relationship graph types
//!
//! The typed vocabulary of the inference engine: one closed variant per
//! relationship kind, so a relationship can only carry the fields that make
//! sense for its kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single inferred relationship, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Relationship {
    #[serde(rename_all = "camelCase")]
    HasOne {
        name: String,
        target_model: String,
        foreign_key: String,
        local_key: String,
    },
    #[serde(rename_all = "camelCase")]
    HasMany {
        name: String,
        target_model: String,
        foreign_key: String,
        local_key: String,
    },
    #[serde(rename_all = "camelCase")]
    BelongsTo {
        name: String,
        target_model: String,
        foreign_key: String,
        local_key: String,
    },
    #[serde(rename_all = "camelCase")]
    BelongsToMany {
        name: String,
        target_model: String,
        pivot_table: String,
        /// Junction column pointing back at the owning side
        foreign_pivot_key: String,
        /// Junction column pointing at the related side
        related_pivot_key: String,
        with_timestamps: bool,
        pivot_columns: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    MorphTo { name: String },
    #[serde(rename_all = "camelCase")]
    MorphMany {
        name: String,
        target_model: String,
        /// The polymorphic relation name declared on the discriminator
        morph_name: String,
    },
}

impl Relationship {
    /// The accessor identifier, unique within the owning table after aliasing
    pub fn name(&self) -> &str {
        match self {
            Self::HasOne { name, .. }
            | Self::HasMany { name, .. }
            | Self::BelongsTo { name, .. }
            | Self::BelongsToMany { name, .. }
            | Self::MorphTo { name }
            | Self::MorphMany { name, .. } => name,
        }
    }

    /// Rename the accessor; the only mutation the graph ever permits
    pub fn set_name(&mut self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        match self {
            Self::HasOne { name, .. }
            | Self::HasMany { name, .. }
            | Self::BelongsTo { name, .. }
            | Self::BelongsToMany { name, .. }
            | Self::MorphTo { name }
            | Self::MorphMany { name, .. } => *name = new_name,
        }
    }

    /// Resolved class name of the related model; `None` for morphTo, whose
    /// target is only known at runtime
    pub fn target_model(&self) -> Option<&str> {
        match self {
            Self::HasOne { target_model, .. }
            | Self::HasMany { target_model, .. }
            | Self::BelongsTo { target_model, .. }
            | Self::BelongsToMany { target_model, .. }
            | Self::MorphMany { target_model, .. } => Some(target_model),
            Self::MorphTo { .. } => None,
        }
    }

    /// Kind label matching the serialized tag, for log and skip messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HasOne { .. } => "hasOne",
            Self::HasMany { .. } => "hasMany",
            Self::BelongsTo { .. } => "belongsTo",
            Self::BelongsToMany { .. } => "belongsToMany",
            Self::MorphTo { .. } => "morphTo",
            Self::MorphMany { .. } => "morphMany",
        }
    }
}

/// Inferred relationships per table.
///
/// Keys iterate sorted, values keep builder insertion order; both are load
/// bearing for the idempotence guarantee. Relationships are only appended or
/// renamed, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipGraph {
    relations: BTreeMap<String, Vec<Relationship>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a relationship to a table's list
    pub fn add(&mut self, table: &str, relationship: Relationship) {
        self.relations
            .entry(table.to_string())
            .or_default()
            .push(relationship);
    }

    /// Relationships of a table, empty if the table has none
    pub fn table(&self, table: &str) -> &[Relationship] {
        self.relations.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable access for the alias pass
    pub(crate) fn table_mut(&mut self, table: &str) -> Option<&mut Vec<Relationship>> {
        self.relations.get_mut(table)
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Relationship])> {
        self.relations
            .iter()
            .map(|(table, rels)| (table.as_str(), rels.as_slice()))
    }

    /// Total number of relationships across all tables
    pub fn len(&self) -> usize {
        self.relations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// One direction of a classified many-to-many junction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingSide {
    /// Table this side attaches to
    pub table: String,
    /// The other side of the association
    pub other_table: String,
    pub junction_table: String,
    /// Junction column pointing at `table`
    pub foreign_pivot_key: String,
    /// Junction column pointing at `other_table`
    pub related_pivot_key: String,
    pub with_timestamps: bool,
    /// Non-key, non-timestamp junction columns exposed as pivot data
    pub pivot_columns: Vec<String>,
}

/// Junction table -> its two symmetric directed sides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManyToManyPairings {
    pairings: BTreeMap<String, [PairingSide; 2]>,
}

impl ManyToManyPairings {
    pub fn insert(&mut self, junction: &str, sides: [PairingSide; 2]) {
        self.pairings.insert(junction.to_string(), sides);
    }

    /// Whether a table was classified as a many-to-many junction
    pub fn is_junction(&self, table: &str) -> bool {
        self.pairings.contains_key(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PairingSide; 2])> {
        self.pairings.iter().map(|(name, sides)| (name.as_str(), sides))
    }

    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }
}

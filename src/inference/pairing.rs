//! Many-to-many pairing
//!
//! Junction tables are detected from naming and foreign-key topology alone,
//! with no configuration: a compound-named table (`post_tag`) whose foreign
//! keys point at the tables its name is built from. Classified junctions are
//! edges, not entities; the generic builder and the model planner skip them.

use crate::config::GeneratorConfig;
use crate::inference::{InferenceReport, Stage};
use crate::naming::{camel, singular, Namer};
use crate::relations::{ManyToManyPairings, PairingSide, Relationship, RelationshipGraph};
use crate::schema::{ForeignKey, SchemaSnapshot, Table, CREATED_AT, DELETED_AT, UPDATED_AT};

/// Classifies junction tables across a snapshot
pub struct PairingClassifier;

impl PairingClassifier {
    /// Classify every many-to-many junction in the snapshot.
    ///
    /// A table qualifies when its name contains a separator and exactly two
    /// of its foreign keys satisfy the junction conventions. More than two
    /// qualifying keys is ambiguous topology: the table is left to generic
    /// inference rather than guessed at.
    pub fn classify(
        snapshot: &SchemaSnapshot,
        config: &GeneratorConfig,
        report: &mut InferenceReport,
    ) -> ManyToManyPairings {
        let mut pairings = ManyToManyPairings::default();

        for table in &snapshot.tables {
            if config.is_excluded(&table.name) || !table.name.contains('_') {
                continue;
            }

            let qualifying: Vec<&ForeignKey> = table
                .foreign_keys
                .iter()
                .filter(|fk| {
                    !config.is_excluded(&fk.referenced_table) && Self::qualifies(&table.name, fk)
                })
                .collect();

            match qualifying.len() {
                2 => {
                    let (left, right) = (qualifying[0], qualifying[1]);
                    pairings.insert(&table.name, Self::build_sides(table, left, right));
                }
                n if n > 2 => {
                    report.skip(
                        Stage::Pairing,
                        &table.name,
                        format!("{n} foreign keys qualify as junction sides, expected exactly 2"),
                    );
                }
                _ => {} // ordinary compound-named table, generic inference applies
            }
        }

        pairings
    }

    /// A foreign key qualifies as a junction side when the singular of its
    /// referenced table is a leading or trailing component of the junction
    /// name AND its local column is `<singular-referenced>_id`
    fn qualifies(junction: &str, fk: &ForeignKey) -> bool {
        let Some(local) = fk.local_column() else {
            return false;
        };
        let referenced = singular(&fk.referenced_table);

        let name_matches = junction.starts_with(&format!("{referenced}_"))
            || junction.ends_with(&format!("_{referenced}"));
        let Some(stem) = local.strip_suffix("_id") else {
            return false;
        };

        name_matches && stem == referenced
    }

    fn build_sides(table: &Table, left: &ForeignKey, right: &ForeignKey) -> [PairingSide; 2] {
        let left_column = left.local_column().unwrap_or_default().to_string();
        let right_column = right.local_column().unwrap_or_default().to_string();
        let pivot_columns = Self::pivot_columns(table, &left_column, &right_column);
        let with_timestamps = table.has_timestamps();

        [
            PairingSide {
                table: left.referenced_table.clone(),
                other_table: right.referenced_table.clone(),
                junction_table: table.name.clone(),
                foreign_pivot_key: left_column.clone(),
                related_pivot_key: right_column.clone(),
                with_timestamps,
                pivot_columns: pivot_columns.clone(),
            },
            PairingSide {
                table: right.referenced_table.clone(),
                other_table: left.referenced_table.clone(),
                junction_table: table.name.clone(),
                foreign_pivot_key: right_column,
                related_pivot_key: left_column,
                with_timestamps,
                pivot_columns,
            },
        ]
    }

    /// Everything except the junction's own primary key, the two matched
    /// foreign-key columns, and the timestamp/soft-delete columns
    fn pivot_columns(table: &Table, left_column: &str, right_column: &str) -> Vec<String> {
        let primary = table.primary_key();

        table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| {
                Some(*name) != primary
                    && *name != left_column
                    && *name != right_column
                    && !matches!(*name, CREATED_AT | UPDATED_AT | DELETED_AT)
            })
            .map(String::from)
            .collect()
    }
}

/// Turns classified pairings into `belongsToMany` entries, one per side
pub struct ManyToManyBuilder;

impl ManyToManyBuilder {
    pub fn build(graph: &mut RelationshipGraph, pairings: &ManyToManyPairings, namer: &Namer) {
        for (_, sides) in pairings.iter() {
            for side in sides {
                graph.add(
                    &side.table,
                    Relationship::BelongsToMany {
                        name: camel(&side.other_table),
                        target_model: namer.model_name(&side.other_table),
                        pivot_table: side.junction_table.clone(),
                        foreign_pivot_key: side.foreign_pivot_key.clone(),
                        related_pivot_key: side.related_pivot_key.clone(),
                        with_timestamps: side.with_timestamps,
                        pivot_columns: side.pivot_columns.clone(),
                    },
                );
            }
        }
    }
}

//! One-to-one builder
//!
//! One-to-one associations cannot be told apart from one-to-many by topology
//! alone, so they are declared explicitly in configuration (owner table ->
//! owned tables) and validated against the snapshot's foreign keys.

use crate::config::GeneratorConfig;
use crate::inference::{InferenceReport, Stage};
use crate::naming::{camel, singular, Namer};
use crate::relations::{Relationship, RelationshipGraph};
use crate::schema::{ForeignKey, SchemaSnapshot};

pub struct OneToOneBuilder;

impl OneToOneBuilder {
    /// Emit a `hasOne` on each configured owner table.
    ///
    /// The owned table must carry exactly one foreign key referencing the
    /// owner; zero or several matches mean the association is ambiguous and
    /// is skipped rather than guessed.
    pub fn build(
        graph: &mut RelationshipGraph,
        snapshot: &SchemaSnapshot,
        config: &GeneratorConfig,
        namer: &Namer,
        report: &mut InferenceReport,
    ) {
        for (owner, owned_tables) in &config.one_to_one {
            if config.is_excluded(owner) {
                report.skip(Stage::OneToOne, owner, "owner table is excluded");
                continue;
            }

            for owned in owned_tables {
                if config.is_excluded(owned) {
                    report.skip(
                        Stage::OneToOne,
                        owner,
                        format!("owned table '{owned}' is excluded"),
                    );
                    continue;
                }

                // existence was validated up front
                let Some(owned_table) = snapshot.table(owned) else {
                    continue;
                };

                let matches: Vec<&ForeignKey> = owned_table
                    .foreign_keys
                    .iter()
                    .filter(|fk| fk.referenced_table == *owner)
                    .collect();

                if matches.len() != 1 {
                    report.skip(
                        Stage::OneToOne,
                        owner,
                        format!(
                            "{} foreign keys on '{owned}' reference '{owner}', expected exactly 1",
                            matches.len()
                        ),
                    );
                    continue;
                }

                let fk = matches[0];
                let (Some(foreign_key), Some(local_key)) =
                    (fk.local_column(), fk.referenced_column())
                else {
                    report.skip(
                        Stage::OneToOne,
                        owner,
                        format!("foreign key '{}' has no columns", fk.constraint_name),
                    );
                    continue;
                };

                graph.add(
                    owner,
                    Relationship::HasOne {
                        name: camel(&singular(owned)),
                        target_model: namer.model_name(owned),
                        foreign_key: foreign_key.to_string(),
                        // the referenced column, not an assumed primary key
                        local_key: local_key.to_string(),
                    },
                );
            }
        }
    }
}

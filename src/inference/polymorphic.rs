//! Polymorphic builder
//!
//! A discriminator table (e.g. `comments`) carries an id/type column pair
//! (`commentable_id` / `commentable_type`) pointing at one of several
//! dependent tables. Which tables participate cannot be read from foreign
//! keys, so the dependents are declared in configuration; the column pair
//! itself is discovered by convention.

use crate::config::GeneratorConfig;
use crate::inference::{InferenceReport, Stage};
use crate::naming::{camel, singular, Namer};
use crate::relations::{Relationship, RelationshipGraph};
use crate::schema::{SchemaSnapshot, Table};

pub struct PolymorphicBuilder;

impl PolymorphicBuilder {
    /// Emit a `morphMany` on every dependent table and one `morphTo` per
    /// discovered id/type pair on the discriminator itself
    pub fn build(
        graph: &mut RelationshipGraph,
        snapshot: &SchemaSnapshot,
        config: &GeneratorConfig,
        namer: &Namer,
        report: &mut InferenceReport,
    ) {
        for (discriminator, dependents) in &config.polymorphic {
            if config.is_excluded(discriminator) {
                report.skip(Stage::Polymorphic, discriminator, "discriminator table is excluded");
                continue;
            }

            // existence was validated up front
            let Some(table) = snapshot.table(discriminator) else {
                continue;
            };

            let pairs = Self::morph_pairs(table, &config.morph_suffix);
            let morph_name = pairs.first().cloned().unwrap_or_else(|| {
                format!("{}{}", singular(discriminator), config.morph_suffix)
            });

            for dependent in dependents {
                if config.is_excluded(dependent) {
                    report.skip(
                        Stage::Polymorphic,
                        discriminator,
                        format!("dependent table '{dependent}' is excluded"),
                    );
                    continue;
                }

                graph.add(
                    dependent,
                    Relationship::MorphMany {
                        name: camel(discriminator),
                        target_model: namer.model_name(discriminator),
                        morph_name: morph_name.clone(),
                    },
                );
            }

            for pair in &pairs {
                graph.add(discriminator, Relationship::MorphTo { name: pair.clone() });
            }
        }
    }

    /// Every `<stem><suffix>_id` column with a matching `<stem><suffix>_type`
    /// sibling, in column order; the pair's relation name is the id column
    /// minus its `_id` tail
    fn morph_pairs(table: &Table, suffix: &str) -> Vec<String> {
        let id_suffix = format!("{suffix}_id");
        let type_suffix = format!("{suffix}_type");

        table
            .columns
            .iter()
            .filter_map(|column| {
                let stem = column.name.strip_suffix(&id_suffix)?;
                table
                    .has_column(&format!("{stem}{type_suffix}"))
                    .then(|| format!("{stem}{suffix}"))
            })
            .collect()
    }
}

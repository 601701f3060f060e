//! Dependency collector
//!
//! Derives, per table, the set of other model classes its relationships
//! reach. The downstream emitter turns these into import/use statements, so
//! the list is de-duplicated, sorted, and never contains the table's own
//! model.

use std::collections::{BTreeMap, BTreeSet};

use crate::naming::Namer;
use crate::relations::{Relationship, RelationshipGraph};

pub struct DependencyCollector;

impl DependencyCollector {
    pub fn collect(graph: &RelationshipGraph, namer: &Namer) -> BTreeMap<String, Vec<String>> {
        graph
            .iter()
            .map(|(table, relationships)| {
                let own_model = namer.model_name(table);
                let targets: BTreeSet<&str> = relationships
                    .iter()
                    .filter_map(Relationship::target_model)
                    .filter(|model| *model != own_model)
                    .collect();

                (
                    table.to_string(),
                    targets.into_iter().map(String::from).collect(),
                )
            })
            .collect()
    }
}

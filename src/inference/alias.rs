//! Alias pass
//!
//! Applies the configured per-table relationship renames. Runs exactly once,
//! after all structural inference, so renames can never interfere with the
//! builders' disambiguation logic. Names only: type, target and keys are
//! untouched.

use crate::config::GeneratorConfig;
use crate::inference::{InferenceReport, Stage};
use crate::relations::RelationshipGraph;

pub struct AliasPass;

impl AliasPass {
    /// Rename each matching relationship. When duplicates share the old name
    /// (a collision the alias exists to resolve), only the first occurrence
    /// is renamed, leaving the rest distinct.
    pub fn apply(
        graph: &mut RelationshipGraph,
        config: &GeneratorConfig,
        report: &mut InferenceReport,
    ) {
        for (table, renames) in &config.aliases {
            let Some(relations) = graph.table_mut(table) else {
                report.skip(Stage::Alias, table, "alias target table has no relationships");
                continue;
            };

            for (old_name, new_name) in renames {
                match relations.iter_mut().find(|r| r.name() == old_name) {
                    Some(relationship) => relationship.set_name(new_name.clone()),
                    None => report.skip(
                        Stage::Alias,
                        table,
                        format!("no relationship named '{old_name}' to alias"),
                    ),
                }
            }
        }
    }
}

//! Generic builder
//!
//! Every foreign key on a non-junction, non-excluded table yields exactly one
//! `belongsTo` on the owning table and one `hasMany` on the referenced table.
//! The interesting part is accessor naming: a table with several foreign keys
//! into the same target (or into itself) must not produce colliding names, so
//! non-primary keys get their accessor prefixed with the stripped column stem.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::GeneratorConfig;
use crate::inference::{InferenceReport, Stage};
use crate::naming::{camel, singular, Namer};
use crate::relations::{ManyToManyPairings, Relationship, RelationshipGraph};
use crate::schema::{ForeignKey, SchemaSnapshot, Table};

static ID_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_id$").unwrap());

pub struct GenericBuilder;

impl GenericBuilder {
    pub fn build(
        graph: &mut RelationshipGraph,
        snapshot: &SchemaSnapshot,
        config: &GeneratorConfig,
        pairings: &ManyToManyPairings,
        namer: &Namer,
        report: &mut InferenceReport,
    ) {
        for table in &snapshot.tables {
            if config.is_excluded(&table.name) {
                continue;
            }
            // junction tables are edges, not entities
            if pairings.is_junction(&table.name) {
                continue;
            }

            Self::build_table(graph, table, config, namer, report);
        }
    }

    fn build_table(
        graph: &mut RelationshipGraph,
        table: &Table,
        config: &GeneratorConfig,
        namer: &Namer,
        report: &mut InferenceReport,
    ) {
        let mut usable: Vec<&ForeignKey> = Vec::new();
        for fk in &table.foreign_keys {
            if config.is_excluded(&fk.referenced_table) {
                continue;
            }
            if fk.local_column().is_none() || fk.referenced_column().is_none() {
                report.skip(
                    Stage::Generic,
                    &table.name,
                    format!("foreign key '{}' has no columns", fk.constraint_name),
                );
                continue;
            }
            usable.push(fk);
        }

        for (index, fk) in usable.iter().enumerate() {
            let local_column = fk.local_column().unwrap_or_default();
            let referenced_column = fk.referenced_column().unwrap_or_default();
            let stripped = Self::strip_id(local_column);

            graph.add(
                &table.name,
                Relationship::BelongsTo {
                    name: camel(&singular(&stripped)),
                    target_model: namer.model_name(&fk.referenced_table),
                    foreign_key: local_column.to_string(),
                    local_key: referenced_column.to_string(),
                },
            );

            let accessor = if Self::is_primary_for_target(&usable, index, &table.name) {
                camel(&table.name)
            } else {
                camel(&format!("{}_{}", stripped, table.name))
            };

            graph.add(
                &fk.referenced_table,
                Relationship::HasMany {
                    name: accessor,
                    target_model: namer.model_name(&table.name),
                    foreign_key: local_column.to_string(),
                    local_key: referenced_column.to_string(),
                },
            );
        }
    }

    /// Local column minus a trailing `_id`
    fn strip_id(column: &str) -> String {
        ID_SUFFIX.replace(column, "").into_owned()
    }

    /// Whether the key at `index` is the primary one among the table's
    /// foreign keys into the same target, and therefore owns the unprefixed
    /// accessor.
    ///
    /// The key whose stripped stem equals the singular target name is always
    /// primary (`user_id` -> `users`). When no key matches by name the first
    /// declared key into the target is primary, unless the group points back
    /// at its own table: a self-reference accessor named after the table
    /// itself would shadow nothing useful, so every self-referencing key is
    /// prefixed.
    fn is_primary_for_target(usable: &[&ForeignKey], index: usize, table_name: &str) -> bool {
        let fk = usable[index];
        let stripped = Self::strip_id(fk.local_column().unwrap_or_default());
        let target_singular = singular(&fk.referenced_table);

        if stripped == target_singular {
            return true;
        }

        let group: Vec<usize> = usable
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.referenced_table == fk.referenced_table)
            .map(|(i, _)| i)
            .collect();

        let group_has_name_match = group.iter().any(|&i| {
            Self::strip_id(usable[i].local_column().unwrap_or_default()) == target_singular
        });
        if group_has_name_match {
            return false;
        }

        if fk.referenced_table == table_name {
            return false;
        }

        group.first() == Some(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};
    use pretty_assertions::assert_eq;

    fn column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            column_type: ColumnType::Integer,
            nullable: false,
            default_value: None,
            length: None,
            auto_increment: false,
        }
    }

    fn fk(local: &str, referenced_table: &str) -> ForeignKey {
        ForeignKey {
            constraint_name: format!("{local}_fkey"),
            local_columns: vec![local.to_string()],
            referenced_table: referenced_table.to_string(),
            referenced_columns: vec!["id".to_string()],
        }
    }

    fn table(name: &str, foreign_keys: Vec<ForeignKey>) -> Table {
        let mut columns = vec![column("id")];
        for key in &foreign_keys {
            columns.push(column(&key.local_columns[0]));
        }
        Table {
            name: name.to_string(),
            columns,
            indexes: vec![],
            foreign_keys,
        }
    }

    fn build(snap: &SchemaSnapshot) -> RelationshipGraph {
        let mut graph = RelationshipGraph::new();
        let mut report = InferenceReport::default();
        GenericBuilder::build(
            &mut graph,
            snap,
            &GeneratorConfig::default(),
            &ManyToManyPairings::default(),
            &Namer::default(),
            &mut report,
        );
        graph
    }

    #[test]
    fn test_single_conventional_foreign_key() {
        let snap = SchemaSnapshot::new(vec![
            table("users", vec![]),
            table("posts", vec![fk("user_id", "users")]),
        ]);
        let graph = build(&snap);

        assert_eq!(
            graph.table("posts"),
            &[Relationship::BelongsTo {
                name: "user".to_string(),
                target_model: "User".to_string(),
                foreign_key: "user_id".to_string(),
                local_key: "id".to_string(),
            }]
        );
        assert_eq!(
            graph.table("users"),
            &[Relationship::HasMany {
                name: "posts".to_string(),
                target_model: "Post".to_string(),
                foreign_key: "user_id".to_string(),
                local_key: "id".to_string(),
            }]
        );
    }

    #[test]
    fn test_two_foreign_keys_to_same_table_disambiguate() {
        let snap = SchemaSnapshot::new(vec![
            table("users", vec![]),
            table(
                "comments",
                vec![fk("author_id", "users"), fk("reviewer_id", "users")],
            ),
        ]);
        let graph = build(&snap);

        let belongs: Vec<&str> = graph.table("comments").iter().map(Relationship::name).collect();
        assert_eq!(belongs, vec!["author", "reviewer"]);

        let has_many: Vec<&str> = graph.table("users").iter().map(Relationship::name).collect();
        assert_eq!(has_many, vec!["comments", "reviewerComments"]);
    }

    #[test]
    fn test_name_matched_key_wins_unprefixed_accessor() {
        // declared out of the "obvious" order on purpose
        let snap = SchemaSnapshot::new(vec![
            table("users", vec![]),
            table(
                "comments",
                vec![fk("reviewer_id", "users"), fk("user_id", "users")],
            ),
        ]);
        let graph = build(&snap);

        let has_many: Vec<&str> = graph.table("users").iter().map(Relationship::name).collect();
        assert_eq!(has_many, vec!["reviewerComments", "comments"]);
    }

    #[test]
    fn test_self_reference_is_always_prefixed() {
        let snap = SchemaSnapshot::new(vec![table(
            "employees",
            vec![fk("manager_id", "employees")],
        )]);
        let graph = build(&snap);

        let names: Vec<(&'static str, &str)> = graph
            .table("employees")
            .iter()
            .map(|r| (r.kind(), r.name()))
            .collect();
        assert_eq!(
            names,
            vec![("belongsTo", "manager"), ("hasMany", "managerEmployees")]
        );
    }

    #[test]
    fn test_keys_keep_actual_referenced_columns() {
        let mut order_fk = fk("customer_code", "customers");
        order_fk.referenced_columns = vec!["code".to_string()];
        let snap = SchemaSnapshot::new(vec![
            table("customers", vec![]),
            table("orders", vec![order_fk]),
        ]);
        let graph = build(&snap);

        assert_eq!(
            graph.table("orders"),
            &[Relationship::BelongsTo {
                name: "customerCode".to_string(),
                target_model: "Customer".to_string(),
                foreign_key: "customer_code".to_string(),
                local_key: "code".to_string(),
            }]
        );
        assert_eq!(
            graph.table("customers"),
            &[Relationship::HasMany {
                name: "customerCodeOrders".to_string(),
                target_model: "Order".to_string(),
                foreign_key: "customer_code".to_string(),
                local_key: "code".to_string(),
            }]
        );
    }

    #[test]
    fn test_excluded_target_produces_nothing() {
        let snap = SchemaSnapshot::new(vec![
            table("users", vec![]),
            table("posts", vec![fk("user_id", "users")]),
        ]);
        let config = GeneratorConfig {
            exclude: ["users".to_string()].into(),
            ..GeneratorConfig::default()
        };
        let mut graph = RelationshipGraph::new();
        let mut report = InferenceReport::default();
        GenericBuilder::build(
            &mut graph,
            &snap,
            &config,
            &ManyToManyPairings::default(),
            &Namer::default(),
            &mut report,
        );

        assert!(graph.is_empty());
    }

    #[test]
    fn test_junction_tables_are_skipped() {
        let mut pairings = ManyToManyPairings::default();
        pairings.insert(
            "post_tag",
            [
                crate::relations::PairingSide {
                    table: "posts".to_string(),
                    other_table: "tags".to_string(),
                    junction_table: "post_tag".to_string(),
                    foreign_pivot_key: "post_id".to_string(),
                    related_pivot_key: "tag_id".to_string(),
                    with_timestamps: false,
                    pivot_columns: vec![],
                },
                crate::relations::PairingSide {
                    table: "tags".to_string(),
                    other_table: "posts".to_string(),
                    junction_table: "post_tag".to_string(),
                    foreign_pivot_key: "tag_id".to_string(),
                    related_pivot_key: "post_id".to_string(),
                    with_timestamps: false,
                    pivot_columns: vec![],
                },
            ],
        );
        let snap = SchemaSnapshot::new(vec![
            table("posts", vec![]),
            table("tags", vec![]),
            table(
                "post_tag",
                vec![fk("post_id", "posts"), fk("tag_id", "tags")],
            ),
        ]);

        let mut graph = RelationshipGraph::new();
        let mut report = InferenceReport::default();
        GenericBuilder::build(
            &mut graph,
            &snap,
            &GeneratorConfig::default(),
            &pairings,
            &Namer::default(),
            &mut report,
        );

        assert!(graph.is_empty());
    }

    #[test]
    fn test_column_without_id_suffix_keeps_full_stem() {
        let snap = SchemaSnapshot::new(vec![
            table("users", vec![]),
            table("sessions", vec![fk("owner", "users")]),
        ]);
        let graph = build(&snap);

        let belongs: Vec<&str> = graph.table("sessions").iter().map(Relationship::name).collect();
        assert_eq!(belongs, vec!["owner"]);
    }
}

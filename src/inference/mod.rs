//! Relationship Inference Module
//!
//! The ordered pipeline that turns a schema snapshot plus configuration into
//! the relationship graph:
//!
//! 1. **Pairing**: classify many-to-many junction tables from naming/topology
//! 2. **One-to-One**: configured `hasOne` associations
//! 3. **Polymorphic**: configured `morphMany`/`morphTo` associations
//! 4. **Generic**: `belongsTo`/`hasMany` for every remaining foreign key
//! 5. **Many-to-Many**: inject `belongsToMany` entries from the pairings
//! 6. **Alias**: apply configured renames
//! 7. **Collision check**: surface accessor names that are still duplicated
//! 8. **Dependencies & plans**: per-table use-lists and emitter metadata
//!
//! The order is load bearing: generic inference needs the junction set, and
//! aliasing must not interfere with disambiguation. Running the pipeline
//! twice against the same snapshot and configuration yields identical output.

pub mod alias;
pub mod dependencies;
pub mod generic;
pub mod one_to_one;
pub mod pairing;
pub mod polymorphic;

pub use alias::AliasPass;
pub use dependencies::DependencyCollector;
pub use generic::GenericBuilder;
pub use one_to_one::OneToOneBuilder;
pub use pairing::{ManyToManyBuilder, PairingClassifier};
pub use polymorphic::PolymorphicBuilder;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{unknown_table, EngineError, EngineResult};
use crate::naming::Namer;
use crate::plan::{ModelPlan, ModelPlanner};
use crate::relations::{ManyToManyPairings, RelationshipGraph};
use crate::schema::SchemaSnapshot;

/// Pipeline stage that recorded a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pairing,
    OneToOne,
    Polymorphic,
    Generic,
    Alias,
}

/// Ambiguous or underdetermined input the engine refused to guess about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceSkip {
    pub stage: Stage,
    pub table: String,
    pub reason: String,
}

/// Non-fatal findings accumulated during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceReport {
    pub skips: Vec<InferenceSkip>,
}

impl InferenceReport {
    pub(crate) fn skip(&mut self, stage: Stage, table: &str, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(?stage, table, %reason, "inference skip");
        self.skips.push(InferenceSkip {
            stage,
            table: table.to_string(),
            reason,
        });
    }
}

/// Complete inference output consumed by the emission layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inference {
    pub graph: RelationshipGraph,
    pub pairings: ManyToManyPairings,
    pub plans: BTreeMap<String, ModelPlan>,
    pub report: InferenceReport,
}

impl Inference {
    /// Content fingerprint of the inferred output. Identical input must
    /// produce an identical fingerprint across runs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let serialized = serde_json::to_vec(self).unwrap_or_default();
        hasher.update(&serialized);
        format!("{:x}", hasher.finalize())
    }
}

/// The relationship inference engine
pub struct InferenceEngine;

impl InferenceEngine {
    /// Run the full pipeline against a snapshot.
    ///
    /// Fails only on input the engine cannot reason about: configured tables
    /// missing from the snapshot, or accessor collisions that survive the
    /// alias pass. Everything ambiguous is skipped and reported.
    pub fn run(snapshot: &SchemaSnapshot, config: &GeneratorConfig) -> EngineResult<Inference> {
        Self::validate_config(snapshot, config)?;

        let namer = Namer::new(&config.model_names);
        let mut graph = RelationshipGraph::new();
        let mut report = InferenceReport::default();

        let pairings = PairingClassifier::classify(snapshot, config, &mut report);
        OneToOneBuilder::build(&mut graph, snapshot, config, &namer, &mut report);
        PolymorphicBuilder::build(&mut graph, snapshot, config, &namer, &mut report);
        GenericBuilder::build(&mut graph, snapshot, config, &pairings, &namer, &mut report);
        ManyToManyBuilder::build(&mut graph, &pairings, &namer);
        AliasPass::apply(&mut graph, config, &mut report);

        Self::check_collisions(&graph)?;

        let uses = DependencyCollector::collect(&graph, &namer);
        let plans = Self::build_plans(snapshot, config, &pairings, &graph, &uses, &namer);

        debug!(
            tables = snapshot.tables.len(),
            relationships = graph.len(),
            junctions = pairings.len(),
            skips = report.skips.len(),
            "inference complete"
        );

        Ok(Inference {
            graph,
            pairings,
            plans,
            report,
        })
    }

    /// Configured table names the engine cannot see at all are hard errors
    fn validate_config(snapshot: &SchemaSnapshot, config: &GeneratorConfig) -> EngineResult<()> {
        for (owner, owned_tables) in &config.one_to_one {
            if !snapshot.has_table(owner) {
                return Err(unknown_table("one-to-one", owner));
            }
            for owned in owned_tables {
                if !snapshot.has_table(owned) {
                    return Err(unknown_table("one-to-one", owned));
                }
            }
        }

        for (discriminator, dependents) in &config.polymorphic {
            if !snapshot.has_table(discriminator) {
                return Err(unknown_table("polymorphic", discriminator));
            }
            for dependent in dependents {
                if !snapshot.has_table(dependent) {
                    return Err(unknown_table("polymorphic", dependent));
                }
            }
        }

        Ok(())
    }

    /// Accessor names must be unique per table once aliasing has run
    fn check_collisions(graph: &RelationshipGraph) -> EngineResult<()> {
        for (table, relationships) in graph.iter() {
            let mut seen: BTreeSet<&str> = BTreeSet::new();
            for relationship in relationships {
                let name = relationship.name();
                if !seen.insert(name) {
                    let count = relationships
                        .iter()
                        .filter(|r| r.name() == name)
                        .count();
                    return Err(EngineError::NamingCollision {
                        table: table.to_string(),
                        name: name.to_string(),
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    fn build_plans(
        snapshot: &SchemaSnapshot,
        config: &GeneratorConfig,
        pairings: &ManyToManyPairings,
        graph: &RelationshipGraph,
        uses: &BTreeMap<String, Vec<String>>,
        namer: &Namer,
    ) -> BTreeMap<String, ModelPlan> {
        snapshot
            .tables
            .iter()
            .filter(|table| !config.is_excluded(&table.name) && !pairings.is_junction(&table.name))
            .map(|table| {
                let empty = Vec::new();
                let plan = ModelPlanner::plan(
                    table,
                    namer,
                    graph.table(&table.name),
                    uses.get(&table.name).unwrap_or(&empty),
                );
                (table.name.clone(), plan)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::Relationship;
    use crate::schema::{Column, ColumnType, ForeignKey, Index, Table};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn column(name: &str, column_type: ColumnType) -> Column {
        Column {
            name: name.to_string(),
            column_type,
            nullable: false,
            default_value: None,
            length: None,
            auto_increment: false,
        }
    }

    fn fk(local: &str, referenced: &str) -> ForeignKey {
        ForeignKey {
            constraint_name: format!("{local}_fkey"),
            local_columns: vec![local.to_string()],
            referenced_table: referenced.to_string(),
            referenced_columns: vec!["id".to_string()],
        }
    }

    fn table(name: &str, columns: &[&str], foreign_keys: Vec<ForeignKey>) -> Table {
        let mut id = column("id", ColumnType::Integer);
        id.auto_increment = true;
        let mut all = vec![id];
        all.extend(columns.iter().map(|c| column(c, ColumnType::String)));

        Table {
            name: name.to_string(),
            columns: all,
            indexes: vec![Index {
                name: "primary".to_string(),
                columns: vec!["id".to_string()],
                is_unique: true,
                is_primary: true,
            }],
            foreign_keys,
        }
    }

    /// A small blog schema exercising every inference stage
    fn blog_snapshot() -> SchemaSnapshot {
        SchemaSnapshot::new(vec![
            table("users", &["email", "password"], vec![]),
            table("phones", &["number", "user_id"], vec![fk("user_id", "users")]),
            table("posts", &["title", "user_id"], vec![fk("user_id", "users")]),
            table("tags", &["label"], vec![]),
            table(
                "post_tag",
                &["post_id", "tag_id", "weight"],
                vec![fk("post_id", "posts"), fk("tag_id", "tags")],
            ),
            table(
                "comments",
                &[
                    "body",
                    "author_id",
                    "reviewer_id",
                    "commentable_id",
                    "commentable_type",
                ],
                vec![fk("author_id", "users"), fk("reviewer_id", "users")],
            ),
            table("videos", &["url"], vec![]),
            table("migrations", &["batch"], vec![]),
        ])
    }

    fn blog_config() -> GeneratorConfig {
        let mut one_to_one = BTreeMap::new();
        one_to_one.insert("users".to_string(), vec!["phones".to_string()]);
        let mut polymorphic = BTreeMap::new();
        polymorphic.insert(
            "comments".to_string(),
            vec!["posts".to_string(), "videos".to_string()],
        );
        GeneratorConfig {
            exclude: ["migrations".to_string()].into(),
            one_to_one,
            polymorphic,
            ..GeneratorConfig::default()
        }
    }

    fn names(graph: &RelationshipGraph, table: &str) -> Vec<(&'static str, String)> {
        graph
            .table(table)
            .iter()
            .map(|r| (r.kind(), r.name().to_string()))
            .collect()
    }

    #[test]
    fn test_full_pipeline_against_blog_schema() {
        let inference =
            InferenceEngine::run(&blog_snapshot(), &blog_config()).expect("inference succeeds");
        let graph = &inference.graph;

        assert_eq!(
            names(graph, "users"),
            vec![
                ("hasOne", "phone".to_string()),
                ("hasMany", "phones".to_string()),
                ("hasMany", "posts".to_string()),
                ("hasMany", "comments".to_string()),
                ("hasMany", "reviewerComments".to_string()),
            ]
        );
        assert_eq!(
            names(graph, "posts"),
            vec![
                ("morphMany", "comments".to_string()),
                ("belongsTo", "user".to_string()),
                ("belongsToMany", "tags".to_string()),
            ]
        );
        assert_eq!(
            names(graph, "comments"),
            vec![
                ("morphTo", "commentable".to_string()),
                ("belongsTo", "author".to_string()),
                ("belongsTo", "reviewer".to_string()),
            ]
        );
        assert_eq!(
            names(graph, "videos"),
            vec![("morphMany", "comments".to_string())]
        );
        assert_eq!(
            names(graph, "tags"),
            vec![("belongsToMany", "posts".to_string())]
        );

        // the junction is an edge: no graph entry, no plan
        assert!(graph.table("post_tag").is_empty());
        assert!(!inference.plans.contains_key("post_tag"));
        assert!(inference.pairings.is_junction("post_tag"));
    }

    #[test]
    fn test_each_foreign_key_yields_exactly_one_pair() {
        let inference =
            InferenceEngine::run(&blog_snapshot(), &blog_config()).expect("inference succeeds");
        let graph = &inference.graph;

        // comments.reviewer_id -> users: one belongsTo, one hasMany, actual columns
        let belongs: Vec<&Relationship> = graph
            .table("comments")
            .iter()
            .filter(|r| {
                matches!(r, Relationship::BelongsTo { foreign_key, .. } if foreign_key == "reviewer_id")
            })
            .collect();
        assert_eq!(belongs.len(), 1);

        let has_many: Vec<&Relationship> = graph
            .table("users")
            .iter()
            .filter(|r| {
                matches!(r, Relationship::HasMany { foreign_key, .. } if foreign_key == "reviewer_id")
            })
            .collect();
        assert_eq!(has_many.len(), 1);
        match has_many[0] {
            Relationship::HasMany {
                name, local_key, ..
            } => {
                assert_eq!(name, "reviewerComments");
                assert_eq!(local_key, "id");
            }
            other => panic!("expected hasMany, got {}", other.kind()),
        }
    }

    #[test]
    fn test_idempotence() {
        let snapshot = blog_snapshot();
        let config = blog_config();

        let first = InferenceEngine::run(&snapshot, &config).expect("first run");
        let second = InferenceEngine::run(&snapshot, &config).expect("second run");

        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_excluded_table_vanishes_from_output() {
        let inference =
            InferenceEngine::run(&blog_snapshot(), &blog_config()).expect("inference succeeds");

        assert!(inference.graph.table("migrations").is_empty());
        assert!(!inference.plans.contains_key("migrations"));

        for (_, relationships) in inference.graph.iter() {
            for relationship in relationships {
                assert_ne!(relationship.target_model(), Some("Migration"));
            }
        }
    }

    #[test]
    fn test_alias_renames_exactly_one_relationship() {
        let mut config = blog_config();
        let mut renames = BTreeMap::new();
        renames.insert("reviewerComments".to_string(), "reviewed".to_string());
        config.aliases.insert("users".to_string(), renames);

        let inference =
            InferenceEngine::run(&blog_snapshot(), &config).expect("inference succeeds");

        let user_names: Vec<String> = inference
            .graph
            .table("users")
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert!(user_names.contains(&"reviewed".to_string()));
        assert!(!user_names.contains(&"reviewerComments".to_string()));
        // the sibling accessor is untouched
        assert!(user_names.contains(&"comments".to_string()));
    }

    #[test]
    fn test_unknown_configured_table_is_a_hard_error() {
        let mut config = blog_config();
        config
            .one_to_one
            .insert("users".to_string(), vec!["passports".to_string()]);

        let err = InferenceEngine::run(&blog_snapshot(), &config).expect_err("must fail");
        assert_eq!(
            err,
            EngineError::UnknownTable {
                context: "one-to-one",
                table: "passports".to_string(),
            }
        );
    }

    #[test]
    fn test_surviving_collision_is_a_hard_error() {
        // "owner" and "owner_id" strip to the same belongsTo accessor
        let snapshot = SchemaSnapshot::new(vec![
            table("users", &[], vec![]),
            table(
                "sessions",
                &["owner", "owner_id"],
                vec![fk("owner", "users"), fk("owner_id", "users")],
            ),
        ]);

        let err = InferenceEngine::run(&snapshot, &GeneratorConfig::default())
            .expect_err("collision must surface");
        assert_eq!(
            err,
            EngineError::NamingCollision {
                table: "sessions".to_string(),
                name: "owner".to_string(),
                count: 2,
            }
        );
    }

    #[test]
    fn test_alias_resolves_collision() {
        let snapshot = SchemaSnapshot::new(vec![
            table("users", &[], vec![]),
            table(
                "sessions",
                &["owner", "owner_id"],
                vec![fk("owner", "users"), fk("owner_id", "users")],
            ),
        ]);
        let mut config = GeneratorConfig::default();
        let mut renames = BTreeMap::new();
        renames.insert("owner".to_string(), "ownerRef".to_string());
        config.aliases.insert("sessions".to_string(), renames);

        let inference = InferenceEngine::run(&snapshot, &config).expect("alias resolves it");
        let session_names: Vec<&str> = inference
            .graph
            .table("sessions")
            .iter()
            .map(Relationship::name)
            .collect();
        assert_eq!(session_names, vec!["ownerRef", "owner"]);
    }

    #[test]
    fn test_plans_carry_relationships_and_uses() {
        let inference =
            InferenceEngine::run(&blog_snapshot(), &blog_config()).expect("inference succeeds");

        let comments = &inference.plans["comments"];
        assert_eq!(comments.model, "Comment");
        assert_eq!(comments.relationships.len(), 3);
        assert_eq!(comments.uses, vec!["User".to_string()]);

        let users = &inference.plans["users"];
        assert!(users.fillable.contains(&"email".to_string()));
        assert!(!users.fillable.contains(&"password".to_string()));
    }

    #[test]
    fn test_skips_are_reported_not_fatal() {
        let mut snapshot = blog_snapshot();
        // second FK from phones to users makes the one-to-one ambiguous
        if let Some(phones) = snapshot.tables.iter_mut().find(|t| t.name == "phones") {
            phones.columns.push(column("carrier_user_id", ColumnType::Integer));
            phones.foreign_keys.push(fk("carrier_user_id", "users"));
        }
        let snapshot = SchemaSnapshot::new(snapshot.tables);

        let inference =
            InferenceEngine::run(&snapshot, &blog_config()).expect("still succeeds");

        assert!(inference
            .report
            .skips
            .iter()
            .any(|s| s.stage == Stage::OneToOne && s.table == "users"));
        // no hasOne was guessed
        assert!(!inference
            .graph
            .table("users")
            .iter()
            .any(|r| r.kind() == "hasOne"));
    }
}

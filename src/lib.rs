//! relgraph - Relationship Inference Engine
//!
//! Inspects a normalized relational-schema snapshot (tables, columns,
//! indexes, foreign keys) and infers the complete object-relationship graph:
//! one-to-one, one-to-many, many-to-many and polymorphic associations, with
//! deterministic, human-readable accessor names and the per-table metadata a
//! code emitter needs to describe each table as a data-access object.
//!
//! The engine is a pure, synchronous transformation. Schema introspection,
//! template rendering and the command line live elsewhere; this crate takes a
//! [`schema::SchemaSnapshot`] plus a [`config::GeneratorConfig`] of user
//! overrides and returns an [`inference::Inference`]:
//!
//! ```
//! use relgraph::{GeneratorConfig, InferenceEngine, SchemaSnapshot};
//!
//! let snapshot = SchemaSnapshot::new(vec![/* tables from your introspector */]);
//! let config = GeneratorConfig::default();
//!
//! let inference = InferenceEngine::run(&snapshot, &config)?;
//! for (table, relationships) in inference.graph.iter() {
//!     println!("{table}: {} relationships", relationships.len());
//! }
//! # Ok::<(), relgraph::EngineError>(())
//! ```
//!
//! Ambiguous topologies (a junction candidate with too many foreign keys, a
//! one-to-one with several matching keys) are skipped and reported, never
//! guessed. Repeated runs against an unchanged snapshot and configuration
//! produce identical output.

pub mod config;
pub mod error;
pub mod inference;
pub mod naming;
pub mod plan;
pub mod relations;
pub mod schema;

pub use config::GeneratorConfig;
pub use error::{EngineError, EngineResult};
pub use inference::{Inference, InferenceEngine, InferenceReport, InferenceSkip, Stage};
pub use plan::ModelPlan;
pub use relations::{ManyToManyPairings, PairingSide, Relationship, RelationshipGraph};
pub use schema::{Column, ColumnType, ForeignKey, Index, SchemaSnapshot, Table};

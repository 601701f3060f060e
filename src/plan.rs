//! Model planning
//!
//! Per-table metadata handed to the downstream emitter: the resolved model
//! class name, derived table flags, attribute classification, the inferred
//! relationship list and the models it pulls in. Junction tables get no plan;
//! they are edges of the graph, not data-access objects.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::naming::Namer;
use crate::relations::Relationship;
use crate::schema::{ColumnType, Table, CREATED_AT, DELETED_AT, UPDATED_AT};

/// Columns never exposed through mass assignment
const GUARDED_COLUMNS: &[&str] = &["password"];

/// Everything the emitter needs to describe one table as a model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPlan {
    pub table: String,
    pub model: String,
    pub has_timestamps: bool,
    pub has_soft_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    pub auto_increment: bool,
    /// Columns open to mass assignment
    pub fillable: Vec<String>,
    /// Column -> type-coerced default, for columns that carry one (or are
    /// nullable, in which case the default may be null)
    pub attribute_defaults: BTreeMap<String, serde_json::Value>,
    /// Date-like columns beyond the managed timestamps
    pub dates: Vec<String>,
    /// Column -> cast label for non-scalar columns
    pub casts: BTreeMap<String, String>,
    pub relationships: Vec<Relationship>,
    /// Models referenced by the relationships, for import generation
    pub uses: Vec<String>,
}

pub struct ModelPlanner;

impl ModelPlanner {
    pub fn plan(
        table: &Table,
        namer: &Namer,
        relationships: &[Relationship],
        uses: &[String],
    ) -> ModelPlan {
        ModelPlan {
            table: table.name.clone(),
            model: namer.model_name(&table.name),
            has_timestamps: table.has_timestamps(),
            has_soft_delete: table.has_soft_delete(),
            primary_key: table.primary_key().map(String::from),
            auto_increment: table.auto_increments(),
            fillable: Self::fillable(table),
            attribute_defaults: Self::attribute_defaults(table),
            dates: Self::dates(table),
            casts: Self::casts(table),
            relationships: relationships.to_vec(),
            uses: uses.to_vec(),
        }
    }

    fn is_managed(name: &str) -> bool {
        matches!(name, CREATED_AT | UPDATED_AT | DELETED_AT)
    }

    /// Every column except the primary key, managed timestamps and guarded
    /// columns
    fn fillable(table: &Table) -> Vec<String> {
        let primary = table.primary_key();

        table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| {
                Some(*name) != primary
                    && !Self::is_managed(name)
                    && !GUARDED_COLUMNS.contains(name)
            })
            .map(String::from)
            .collect()
    }

    fn attribute_defaults(table: &Table) -> BTreeMap<String, serde_json::Value> {
        let mut defaults = BTreeMap::new();

        for column in &table.columns {
            if Self::is_managed(&column.name) {
                continue;
            }

            match column.coerced_default() {
                Some(value) => {
                    defaults.insert(column.name.clone(), value);
                }
                None if column.nullable => {
                    defaults.insert(column.name.clone(), serde_json::Value::Null);
                }
                // NOT NULL without a default: nothing sensible to emit
                None => {}
            }
        }

        defaults
    }

    fn dates(table: &Table) -> Vec<String> {
        table
            .columns
            .iter()
            .filter(|c| c.is_date_like() && !Self::is_managed(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    fn casts(table: &Table) -> BTreeMap<String, String> {
        table
            .columns
            .iter()
            .filter(|c| !Self::is_managed(&c.name))
            .filter_map(|c| {
                let cast = match c.column_type {
                    ColumnType::Json => "array",
                    ColumnType::Boolean => "boolean",
                    _ => return None,
                };
                Some((c.name.clone(), cast.to_string()))
            })
            .collect()
    }
}

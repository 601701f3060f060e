//! Normalized schema snapshot
//!
//! Read-only view of a relational schema, produced by an external
//! introspection adapter and consumed by the inference engine. Populated once
//! per run and immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Conventional timestamp column names
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";

/// Underlying type categories, already normalized by the introspection adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    /// Any date/time flavor (date, datetime, timestamp)
    Date,
    Json,
    Binary,
    Enum,
}

/// Column representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Raw default value as reported by the database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default)]
    pub auto_increment: bool,
}

impl Column {
    /// Default value coerced through the column's type category.
    /// Unparseable numerics and booleans fall back to the raw string.
    pub fn coerced_default(&self) -> Option<serde_json::Value> {
        let raw = self.default_value.as_deref()?;
        let value = match self.column_type {
            ColumnType::Integer => raw
                .parse::<i64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::from(raw)),
            ColumnType::Float => raw
                .parse::<f64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::from(raw)),
            ColumnType::Boolean => match raw {
                "true" | "t" | "1" => serde_json::Value::from(true),
                "false" | "f" | "0" => serde_json::Value::from(false),
                other => serde_json::Value::from(other),
            },
            ColumnType::Json => {
                serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::from(raw))
            }
            _ => serde_json::Value::from(raw),
        };
        Some(value)
    }

    pub fn is_date_like(&self) -> bool {
        self.column_type == ColumnType::Date
    }
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub constraint_name: String,
    pub local_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKey {
    /// First local column; the naming heuristics operate on single-column keys
    pub fn local_column(&self) -> Option<&str> {
        self.local_columns.first().map(String::as_str)
    }

    /// First referenced column
    pub fn referenced_column(&self) -> Option<&str> {
        self.referenced_columns.first().map(String::as_str)
    }
}

/// Index representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
}

/// Table representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// First column of the primary-key index, if the table has one
    pub fn primary_key(&self) -> Option<&str> {
        self.indexes
            .iter()
            .find(|idx| idx.is_primary)
            .and_then(|idx| idx.columns.first())
            .map(String::as_str)
    }

    /// Both `created_at` and `updated_at` are present
    pub fn has_timestamps(&self) -> bool {
        self.has_column(CREATED_AT) && self.has_column(UPDATED_AT)
    }

    /// A `deleted_at` column is present
    pub fn has_soft_delete(&self) -> bool {
        self.has_column(DELETED_AT)
    }

    /// The primary-key column auto-increments
    pub fn auto_increments(&self) -> bool {
        self.primary_key()
            .and_then(|pk| self.column(pk))
            .map(|c| c.auto_increment)
            .unwrap_or(false)
    }
}

/// Complete schema snapshot at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub id: Uuid,
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    pub tables: Vec<Table>,
    pub checksum: String,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<Table>) -> Self {
        let checksum = Self::compute_checksum(&tables);
        Self {
            id: Uuid::new_v4(),
            version: 1,
            captured_at: Utc::now(),
            tables,
            checksum,
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Compute checksum from schema content
    pub fn compute_checksum(tables: &[Table]) -> String {
        let mut hasher = Sha256::new();

        // Hash table names in sorted order for consistency
        let mut table_names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        table_names.sort_unstable();

        for name in &table_names {
            hasher.update(name.as_bytes());
        }

        // Hash columns and foreign keys in declaration order
        for table in tables {
            for col in &table.columns {
                hasher.update(
                    format!("{}.{}:{:?}:{}", table.name, col.name, col.column_type, col.nullable)
                        .as_bytes(),
                );
            }
            for fk in &table.foreign_keys {
                hasher.update(
                    format!(
                        "FK:{}.{}->{}.{}",
                        table.name,
                        fk.local_columns.join(","),
                        fk.referenced_table,
                        fk.referenced_columns.join(",")
                    )
                    .as_bytes(),
                );
            }
        }

        let result = hasher.finalize();
        format!("{:x}", result)
    }
}

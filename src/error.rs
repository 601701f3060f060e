//! Error handling module
//!
//! Typed failures surfaced by the inference engine. Ambiguous input is never
//! an error (the engine skips it and reports the skip); these variants cover
//! input the engine cannot reason about at all.

use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("configured {context} table '{table}' does not exist in the schema snapshot")]
    UnknownTable {
        /// Configuration section that named the table
        context: &'static str,
        table: String,
    },

    #[error("relationship name collision on table '{table}': '{name}' is declared {count} times (resolve it with an alias)")]
    NamingCollision {
        table: String,
        name: String,
        count: usize,
    },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Helper function to create an unknown-table error
pub fn unknown_table(context: &'static str, table: impl Into<String>) -> EngineError {
    EngineError::UnknownTable {
        context,
        table: table.into(),
    }
}

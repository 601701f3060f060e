//! Naming resolver
//!
//! Pure, deterministic name transforms shared by every inference stage:
//! singularization, case conversion, and table-to-model-class resolution.
//! All heuristic naming lives here so it can be swapped without touching
//! the inference logic.

use convert_case::{Case, Casing};
use std::collections::BTreeMap;

/// Words that are the same in singular and plural form, or that the suffix
/// rules would mangle. Kept short on purpose: irregular plurals are handled
/// via the model-name override map, not guessed here.
const UNCOUNTABLE: &[&str] = &["news", "series", "species", "status", "data", "media", "metadata"];

/// Reduce a plural identifier to its singular form.
///
/// Implements the standard English suffix rules (`ies` -> `y`, `es` after a
/// sibilant, trailing `s`). Irregular plurals (`people`, `geese`, ...) pass
/// through unchanged.
pub fn singular(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }

    // addresses -> address, boxes -> box, branches -> branch, dishes -> dish
    for suffix in ["sses", "xes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{}{}", stem, &suffix[..suffix.len() - 2]);
        }
    }

    if word.ends_with("ss") {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() {
            return stem.to_string();
        }
    }

    word.to_string()
}

/// Convert an identifier to lowerCamelCase
pub fn camel(word: &str) -> String {
    word.to_case(Case::Camel)
}

/// Convert an identifier to UpperCamelCase
pub fn pascal(word: &str) -> String {
    word.to_case(Case::Pascal)
}

/// Resolves table names to model class names, honoring explicit overrides
#[derive(Debug, Clone, Default)]
pub struct Namer {
    overrides: BTreeMap<String, String>,
}

impl Namer {
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        Self {
            overrides: overrides.clone(),
        }
    }

    /// Model class name for a table: the override if one is configured,
    /// otherwise the singularized table name in UpperCamelCase
    pub fn model_name(&self, table: &str) -> String {
        if let Some(name) = self.overrides.get(table) {
            return name.clone();
        }
        pascal(&singular(table))
    }
}

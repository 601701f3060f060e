//! Engine configuration module
//!
//! User-supplied overrides consumed read-only during an inference run.
//! Everything here is optional; an empty configuration means "infer what the
//! foreign keys and naming conventions allow, nothing more".

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Default suffix marking polymorphic column pairs
/// (`commentable_id` / `commentable_type`)
pub const DEFAULT_MORPH_SUFFIX: &str = "able";

/// Complete generator configuration
///
/// Ordered maps/sets throughout: configuration iteration order feeds directly
/// into the output graph, and repeated runs must produce identical output.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Tables the engine ignores entirely; they produce no output and are
    /// never referenced as a relationship target
    pub exclude: BTreeSet<String>,

    /// Owner table -> owned tables for explicit one-to-one associations
    pub one_to_one: BTreeMap<String, Vec<String>>,

    /// Discriminator table -> dependent tables for polymorphic associations
    pub polymorphic: BTreeMap<String, Vec<String>>,

    /// Per-table relationship renames, applied once after all inference
    pub aliases: BTreeMap<String, BTreeMap<String, String>>,

    /// Column suffix marking polymorphic id/type pairs
    pub morph_suffix: String,

    /// Table -> model class name overrides
    pub model_names: BTreeMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            exclude: BTreeSet::new(),
            one_to_one: BTreeMap::new(),
            polymorphic: BTreeMap::new(),
            aliases: BTreeMap::new(),
            morph_suffix: DEFAULT_MORPH_SUFFIX.to_string(),
            model_names: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn is_excluded(&self, table: &str) -> bool {
        self.exclude.contains(table)
    }
}

//! Initial allocation of shared resources.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::PoolKey;

/// Resources available in one category: a single `(name, capacity)` pair or a
/// list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllocationEntry {
    /// One named resource.
    Single(String, u32),
    /// Several named resources.
    Many(Vec<(String, u32)>),
}

impl AllocationEntry {
    /// Iterate `(name, capacity)` pairs.
    pub fn pairs(&self) -> Vec<(&str, u32)> {
        match self {
            Self::Single(name, cap) => vec![(name.as_str(), *cap)],
            Self::Many(list) => list.iter().map(|(n, c)| (n.as_str(), *c)).collect(),
        }
    }
}

/// Category to resources mapping, e.g.
/// `{"wtiv": ["example_wtiv", 1], "port": [["salem", 1], ["njwp", 2]]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationConfig {
    /// Map of category to its resources.
    pub categories: BTreeMap<String, AllocationEntry>,
}

impl AllocationConfig {
    /// Empty allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one resource to a category, keeping any already listed.
    #[must_use]
    pub fn with(mut self, category: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
        self.add(category, name, capacity);
        self
    }

    /// Add one resource to a category, keeping any already listed.
    pub fn add(&mut self, category: impl Into<String>, name: impl Into<String>, capacity: u32) {
        let name = name.into();
        let entry = self
            .categories
            .entry(category.into())
            .or_insert_with(|| AllocationEntry::Many(Vec::new()));
        if let AllocationEntry::Single(existing, cap) = entry {
            let first = (std::mem::take(existing), *cap);
            *entry = AllocationEntry::Many(vec![first]);
        }
        if let AllocationEntry::Many(list) = entry {
            list.push((name, capacity));
        }
    }

    /// Every configured pool with its initial capacity.
    pub fn pools(&self) -> Vec<(PoolKey, u32)> {
        self.categories
            .iter()
            .flat_map(|(category, entry)| {
                entry
                    .pairs()
                    .into_iter()
                    .map(|(name, cap)| (PoolKey::new(category.as_str(), name), cap))
            })
            .collect()
    }

    /// Validate names and uniqueness.
    pub fn validate(&self) -> Result<(), String> {
        for (category, entry) in &self.categories {
            if category.trim().is_empty() {
                return Err("category names must not be empty".into());
            }
            let mut seen = BTreeSet::new();
            for (name, _) in entry.pairs() {
                if name.trim().is_empty() {
                    return Err(format!("category `{category}` lists a resource without a name"));
                }
                if !seen.insert(name) {
                    return Err(format!("category `{category}` lists `{name}` more than once"));
                }
            }
        }
        Ok(())
    }

    /// Parse allocation configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse allocation configuration from a YAML string and validate.
    pub fn from_yaml_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_yml::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

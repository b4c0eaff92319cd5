//! Scenario configurations: an allocation plus capacity arriving later.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{AllocationConfig, StartTime};

/// Extra units of one pool that arrive over the run, one per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureResource {
    /// Resource category.
    pub category: String,
    /// Resource name.
    pub name: String,
    /// When each additional unit becomes available.
    pub dates: Vec<StartTime>,
}

impl FutureResource {
    /// One unit of `(category, name)` per date.
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        dates: impl IntoIterator<Item = StartTime>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            dates: dates.into_iter().collect(),
        }
    }
}

/// A named what-if: initial allocation and future capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario identifier, e.g. `add_ports`.
    pub name: String,
    /// Resources available at the start.
    pub allocations: AllocationConfig,
    /// Capacity added during the run.
    #[serde(default)]
    pub future_resources: Vec<FutureResource>,
}

impl ScenarioConfig {
    /// Validate the allocation and that future resources name allocated pools.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("scenario name must not be empty".into());
        }
        self.allocations
            .validate()
            .map_err(|e| format!("scenario `{}` allocations invalid: {e}", self.name))?;

        let known: BTreeSet<_> = self.allocations.pools().into_iter().map(|(k, _)| k).collect();
        for future in &self.future_resources {
            let key = crate::core::PoolKey::new(future.category.as_str(), future.name.as_str());
            if !known.contains(&key) {
                return Err(format!(
                    "scenario `{}` adds future capacity to unallocated resource `{key}`",
                    self.name
                ));
            }
        }
        Ok(())
    }
}

/// A list of scenarios run against the same projects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Scenarios in run order.
    pub scenarios: Vec<ScenarioConfig>,
}

impl ScenarioSet {
    /// Validate all scenarios and ensure names are unique.
    pub fn validate(&self) -> Result<(), String> {
        if self.scenarios.is_empty() {
            return Err("at least one scenario must be defined".into());
        }
        let mut names = BTreeSet::new();
        for scenario in &self.scenarios {
            scenario.validate()?;
            if !names.insert(scenario.name.as_str()) {
                return Err(format!("scenario `{}` defined twice", scenario.name));
            }
        }
        Ok(())
    }

    /// Parse a scenario set from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a scenario set from a YAML string and validate.
    pub fn from_yaml_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_yml::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

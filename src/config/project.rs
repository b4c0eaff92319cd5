//! Project configurations and the shared-pool reference variant.
//!
//! Configurations arrive as JSON objects. A top-level string field of the
//! form `"_shared_pool_:<name>"` asks for one unit of the pool
//! `(<field>, <name>)`; it is parsed once into [`ConfigValue::SharedPool`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::core::gang::GrantedResources;
use crate::core::{CoralError, PoolKey, ResolvedConfig, SimTime};
use crate::util::dates::{format_datetime, parse_datetime};

/// Prefix marking a configuration value as a shared-pool reference.
pub const SHARED_POOL_MARKER: &str = "_shared_pool_";
/// Field holding the project's base display name.
pub const NAME_FIELD: &str = "project_name";
/// Field holding the project's start (hours or calendar date).
pub const START_FIELD: &str = "project_start";
/// Base name for projects without a `project_name`.
pub const DEFAULT_PROJECT_NAME: &str = "project";

/// When a project becomes eligible to start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartTime {
    /// Hours after the run begins.
    Offset(SimTime),
    /// Calendar date, converted relative to the run's reference start.
    Date(NaiveDateTime),
}

impl Default for StartTime {
    fn default() -> Self {
        Self::Offset(0.0)
    }
}

impl fmt::Display for StartTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(h) => write!(f, "{h}h"),
            Self::Date(d) => f.write_str(&format_datetime(d)),
        }
    }
}

impl StartTime {
    /// Interpret a JSON value as a start: numbers are hour offsets, strings
    /// are dates, `null` is time zero.
    pub fn from_value(value: &Value) -> Result<Self, CoralError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Number(n) => {
                let hours = n.as_f64().ok_or_else(|| {
                    CoralError::InvalidConfig(format!("start `{n}` is not a number of hours"))
                })?;
                if hours < 0.0 || !hours.is_finite() {
                    return Err(CoralError::InvalidConfig(format!(
                        "start offset must be a non-negative number of hours, got {hours}"
                    )));
                }
                Ok(Self::Offset(hours))
            }
            Value::String(s) => parse_datetime(s)
                .map(Self::Date)
                .ok_or_else(|| CoralError::InvalidConfig(format!("unrecognized start date `{s}`"))),
            other => Err(CoralError::InvalidConfig(format!(
                "start must be a number or a date, got {other}"
            ))),
        }
    }

    /// JSON form: a number for offsets, a string for dates.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Offset(h) => serde_json::json!(h),
            Self::Date(d) => Value::String(format_datetime(d)),
        }
    }

    /// Whether this start is a calendar date.
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

impl Serialize for StartTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Offset(h) => serializer.serialize_f64(*h),
            Self::Date(d) => serializer.serialize_str(&format_datetime(d)),
        }
    }
}

impl<'de> Deserialize<'de> for StartTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Offset(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Offset(h) => Self::from_value(&serde_json::json!(h)).map_err(D::Error::custom),
            Raw::Text(s) => Self::from_value(&Value::String(s)).map_err(D::Error::custom),
        }
    }
}

/// A configuration field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Passed to the simulator as-is.
    Literal(Value),
    /// Replaced by the pool's data once granted.
    SharedPool(PoolKey),
}

impl ConfigValue {
    /// Classify `value` found under `field`.
    pub fn parse(field: &str, value: Value) -> Result<Self, CoralError> {
        let Value::String(text) = &value else {
            return Ok(Self::Literal(value));
        };
        let Some((marker, name)) = text.split_once(':') else {
            return Ok(Self::Literal(value));
        };
        if marker != SHARED_POOL_MARKER {
            return Ok(Self::Literal(value));
        }
        if name.trim().is_empty() {
            return Err(CoralError::InvalidConfig(format!(
                "field `{field}` references a shared pool without a name"
            )));
        }
        Ok(Self::SharedPool(PoolKey::new(field, name.trim())))
    }

    /// JSON form, re-encoding shared-pool references as sentinels.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::SharedPool(key) => Value::String(format!("{SHARED_POOL_MARKER}:{}", key.name)),
        }
    }
}

/// One project's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig {
    fields: BTreeMap<String, ConfigValue>,
}

impl ProjectConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object.
    pub fn from_value(value: Value) -> Result<Self, CoralError> {
        let Value::Object(map) = value else {
            return Err(CoralError::InvalidConfig(
                "project configuration must be an object".into(),
            ));
        };
        let mut fields = BTreeMap::new();
        for (field, value) in map {
            let parsed = ConfigValue::parse(&field, value)?;
            fields.insert(field, parsed);
        }
        let config = Self { fields };
        config.start()?;
        Ok(config)
    }

    /// Parse a JSON document holding one object.
    pub fn from_json_str(input: &str) -> Result<Self, CoralError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| CoralError::InvalidConfig(format!("parse error: {e}")))?;
        Self::from_value(value)
    }

    /// Set a literal field.
    #[must_use]
    pub fn with_literal(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(field.into(), ConfigValue::Literal(value.into()));
        self
    }

    /// Request one unit of pool `(category, name)` for field `category`.
    #[must_use]
    pub fn with_shared_pool(mut self, category: impl Into<String>, name: impl Into<String>) -> Self {
        let category = category.into();
        let key = PoolKey::new(category.clone(), name);
        self.fields.insert(category, ConfigValue::SharedPool(key));
        self
    }

    /// Set the project name.
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_literal(NAME_FIELD, name.into())
    }

    /// Set the project start.
    #[must_use]
    pub fn with_start(mut self, start: StartTime) -> Self {
        self.fields
            .insert(START_FIELD.into(), ConfigValue::Literal(start.to_value()));
        self
    }

    /// All fields.
    pub const fn fields(&self) -> &BTreeMap<String, ConfigValue> {
        &self.fields
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&ConfigValue> {
        self.fields.get(field)
    }

    /// Base display name before disambiguation.
    pub fn base_name(&self) -> &str {
        match self.fields.get(NAME_FIELD) {
            Some(ConfigValue::Literal(Value::String(name))) if !name.is_empty() => name,
            _ => DEFAULT_PROJECT_NAME,
        }
    }

    /// Parsed start; defaults to time zero.
    pub fn start(&self) -> Result<StartTime, CoralError> {
        match self.fields.get(START_FIELD) {
            None => Ok(StartTime::default()),
            Some(ConfigValue::Literal(value)) => StartTime::from_value(value),
            Some(ConfigValue::SharedPool(_)) => Err(CoralError::InvalidConfig(format!(
                "`{START_FIELD}` cannot reference a shared pool"
            ))),
        }
    }

    /// Pools this project needs, in field order.
    pub fn shared_pools(&self) -> impl Iterator<Item = &PoolKey> {
        self.fields.values().filter_map(|value| match value {
            ConfigValue::SharedPool(key) => Some(key),
            ConfigValue::Literal(_) => None,
        })
    }

    /// Replace every shared-pool reference with granted data.
    pub fn resolve(
        &self,
        name: &str,
        granted: &GrantedResources,
    ) -> Result<ResolvedConfig, CoralError> {
        let mut fields = serde_json::Map::new();
        for (field, value) in &self.fields {
            let resolved = match value {
                ConfigValue::Literal(v) => v.clone(),
                ConfigValue::SharedPool(key) => granted
                    .get(&key.category)
                    .cloned()
                    .ok_or_else(|| CoralError::unknown(key))?,
            };
            fields.insert(field.clone(), resolved);
        }
        Ok(ResolvedConfig {
            name: name.to_string(),
            fields,
        })
    }

    /// JSON form with shared-pool sentinels restored.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(field, value)| (field.clone(), value.to_value()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for ProjectConfig {
    type Error = CoralError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl Serialize for ProjectConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProjectConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

//! Project execution collaborator and the inputs handed to it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{AppResult, SimTime};

/// A project configuration with every shared-pool reference replaced by the
/// granted pool's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Display name of the project.
    pub name: String,
    /// Configuration fields, ready for the simulator.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ResolvedConfig {
    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }
}

/// Outcome of one project simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Total time the project holds its resources, in hours.
    pub total_time: SimTime,
    /// Per-phase timings, informational only.
    #[serde(default)]
    pub phase_times: BTreeMap<String, SimTime>,
}

impl ExecutionReport {
    /// Report with only a total duration.
    pub fn new(total_time: SimTime) -> Self {
        Self {
            total_time,
            phase_times: BTreeMap::new(),
        }
    }
}

/// One hourly weather observation: column name to value.
pub type WeatherRecord = BTreeMap<String, f64>;

/// Hourly weather series shared by every project in a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSeries {
    records: Arc<[WeatherRecord]>,
}

impl WeatherSeries {
    /// Wrap a list of hourly records; row `i` covers hour `i` of the run.
    pub fn new(records: Vec<WeatherRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Number of hourly rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows from hour `ceil(now)` onward. Past the end yields an empty window.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn slice_from(&self, now: SimTime) -> WeatherWindow<'_> {
        let start = (now.max(0.0).ceil() as usize).min(self.records.len());
        WeatherWindow {
            start,
            records: &self.records[start..],
        }
    }
}

/// Borrowed view of a weather series starting at some hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherWindow<'a> {
    /// Hour index of the first row within the full series.
    pub start: usize,
    /// Rows from `start` to the end of the series.
    pub records: &'a [WeatherRecord],
}

/// External simulator that computes how long a project takes.
///
/// Called on the simulation thread with a fully resolved configuration; must
/// return without suspending. Errors are fatal for that project only.
///
/// # Example
///
/// ```rust,ignore
/// use coral::core::{ExecutionReport, ProjectExecutor, ResolvedConfig, WeatherWindow};
///
/// struct FixedDuration(f64);
///
/// impl ProjectExecutor for FixedDuration {
///     fn execute(
///         &self,
///         _config: &ResolvedConfig,
///         _weather: Option<WeatherWindow<'_>>,
///     ) -> anyhow::Result<ExecutionReport> {
///         Ok(ExecutionReport::new(self.0))
///     }
/// }
/// ```
pub trait ProjectExecutor: Send + Sync + 'static {
    /// Simulate one project and report its total duration.
    fn execute(
        &self,
        config: &ResolvedConfig,
        weather: Option<WeatherWindow<'_>>,
    ) -> AppResult<ExecutionReport>;
}

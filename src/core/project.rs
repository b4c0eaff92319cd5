//! Project processes: wait for the start, acquire a gang, run, release.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;
use crate::core::gang::GrantedResources;
use crate::core::{
    CoralError, Environment, GangRequest, ProjectExecutor, ResourceLibrary, SimTime, WeatherSeries,
};
use crate::util::dates::add_hours;

/// Lifecycle of a project process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectState {
    /// Sleeping until the configured start.
    WaitingToStart,
    /// Gang submitted, waiting for the grant.
    WaitingForResources,
    /// Holding resources for the reported duration.
    Running,
    /// Handing resources back.
    Releasing,
    /// Completed and logged.
    Done,
    /// The collaborator failed; resources were released and nothing logged.
    Failed,
}

impl ProjectState {
    /// Whether the process has ended, successfully or not.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Timing record of one completed project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLog {
    /// Display name.
    pub name: String,
    /// Time the project became eligible to start.
    #[serde(rename = "Initialized")]
    pub initialized: SimTime,
    /// Time its resources were granted.
    #[serde(rename = "Started")]
    pub started: SimTime,
    /// Time its resources were released.
    #[serde(rename = "Finished")]
    pub finished: SimTime,
    /// Calendar form of `Initialized`, for dated runs.
    #[serde(rename = "Date Initialized", default, skip_serializing_if = "Option::is_none")]
    pub date_initialized: Option<NaiveDateTime>,
    /// Calendar form of `Started`, for dated runs.
    #[serde(rename = "Date Started", default, skip_serializing_if = "Option::is_none")]
    pub date_started: Option<NaiveDateTime>,
    /// Calendar form of `Finished`, for dated runs.
    #[serde(rename = "Date Finished", default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<NaiveDateTime>,
}

impl ProjectLog {
    /// Hours between the grant and the release.
    pub fn duration(&self) -> SimTime {
        self.finished - self.started
    }

    /// Hours spent waiting for resources.
    pub fn delay(&self) -> SimTime {
        self.started - self.initialized
    }

    /// Copy with `Date *` fields set to `reference + hours`.
    #[must_use]
    pub fn with_dates(&self, reference: NaiveDateTime) -> Self {
        Self {
            date_initialized: Some(add_hours(reference, self.initialized)),
            date_started: Some(add_hours(reference, self.started)),
            date_finished: Some(add_hours(reference, self.finished)),
            ..self.clone()
        }
    }
}

/// A project that ended without a log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFailure {
    /// Display name.
    pub name: String,
    /// Why it ended.
    pub error: CoralError,
}

/// What every project process in a run writes to.
#[derive(Debug, Default)]
pub(crate) struct RunLedger {
    pub(crate) logs: Vec<ProjectLog>,
    pub(crate) failures: Vec<ProjectFailure>,
    pub(crate) states: BTreeMap<String, ProjectState>,
}

impl RunLedger {
    fn transition(&mut self, name: &str, state: ProjectState) {
        tracing::debug!(project = name, ?state, "project state changed");
        self.states.insert(name.to_string(), state);
    }
}

/// Handles a project process needs, shared across the run.
#[derive(Clone)]
pub(crate) struct ProjectContext {
    pub(crate) env: Environment,
    pub(crate) library: Arc<Mutex<ResourceLibrary>>,
    pub(crate) executor: Arc<dyn ProjectExecutor>,
    pub(crate) weather: Arc<Mutex<Option<WeatherSeries>>>,
    pub(crate) ledger: Arc<Mutex<RunLedger>>,
}

impl ProjectContext {
    fn transition(&self, name: &str, state: ProjectState) {
        self.ledger.lock().transition(name, state);
    }

    fn fail(&self, name: &str, error: CoralError) {
        tracing::error!(project = name, error = %error, "project failed");
        let mut ledger = self.ledger.lock();
        ledger.transition(name, ProjectState::Failed);
        ledger.failures.push(ProjectFailure {
            name: name.to_string(),
            error,
        });
    }

    /// Resolve the configuration and ask the collaborator for a duration.
    fn execute(
        &self,
        name: &str,
        config: &ProjectConfig,
        granted: &GrantedResources,
    ) -> Result<SimTime, CoralError> {
        let resolved = config.resolve(name, granted)?;
        let weather = self.weather.lock().clone();
        let window = weather.as_ref().map(|series| series.slice_from(self.env.now()));

        let report = self
            .executor
            .execute(&resolved, window)
            .map_err(|e| CoralError::Executor {
                project: name.to_string(),
                message: format!("{e:#}"),
            })?;

        if !report.total_time.is_finite() || report.total_time < 0.0 {
            return Err(CoralError::Executor {
                project: name.to_string(),
                message: format!("reported invalid duration {}", report.total_time),
            });
        }
        Ok(report.total_time)
    }
}

/// Body of one project process.
pub(crate) async fn run_project(
    ctx: ProjectContext,
    name: String,
    config: ProjectConfig,
    start: SimTime,
) {
    ctx.transition(&name, ProjectState::WaitingToStart);
    ctx.env.timeout(start).await;
    let initialized = ctx.env.now();
    tracing::info!(project = %name, at = initialized, "project initialized");

    let request = Arc::new(GangRequest::new(
        name.clone(),
        config.shared_pools().cloned(),
    ));
    ctx.transition(&name, ProjectState::WaitingForResources);
    let submitted = ctx.library.lock().submit(Arc::clone(&request));
    if let Err(e) = submitted {
        ctx.fail(&name, e);
        return;
    }

    let granted = request.wait().await;
    let started = ctx.env.now();
    ctx.transition(&name, ProjectState::Running);
    tracing::info!(project = %name, at = started, "project started");

    let duration = match ctx.execute(&name, &config, &granted) {
        Ok(duration) => duration,
        Err(e) => {
            ctx.library.lock().release(&request);
            ctx.fail(&name, e);
            return;
        }
    };
    ctx.env.timeout(duration).await;

    ctx.transition(&name, ProjectState::Releasing);
    ctx.library.lock().release(&request);
    let finished = ctx.env.now();
    tracing::info!(project = %name, at = finished, "project finished");

    let mut ledger = ctx.ledger.lock();
    ledger.logs.push(ProjectLog {
        name: name.clone(),
        initialized,
        started,
        finished,
        date_initialized: None,
        date_started: None,
        date_finished: None,
    });
    ledger.transition(&name, ProjectState::Done);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn log() -> ProjectLog {
        ProjectLog {
            name: "alpha".into(),
            initialized: 0.0,
            started: 12.0,
            finished: 36.5,
            date_initialized: None,
            date_started: None,
            date_finished: None,
        }
    }

    #[test]
    fn test_log_field_names() {
        let value = serde_json::to_value(log()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("Initialized"));
        assert!(obj.contains_key("Started"));
        assert!(obj.contains_key("Finished"));
        assert!(!obj.contains_key("Date Started"));
    }

    #[test]
    fn test_with_dates_adds_offsets() {
        let reference = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let dated = log().with_dates(reference);
        assert_eq!(
            dated.date_started,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(12, 0, 0)
        );
        assert_eq!(
            dated.date_finished,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(12, 30, 0)
        );
        let value = serde_json::to_value(&dated).unwrap();
        assert!(value.get("Date Finished").is_some());
    }

    #[test]
    fn test_duration_and_delay() {
        let log = log();
        assert!((log.delay() - 12.0).abs() < f64::EPSILON);
        assert!((log.duration() - 24.5).abs() < f64::EPSILON);
        assert!(ProjectState::Failed.is_terminal());
        assert!(!ProjectState::Running.is_terminal());
    }
}

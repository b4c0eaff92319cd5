//! Global manager: builds project processes and drives a run.
//!
//! A [`GlobalManager`] owns one [`Environment`], a shared handle to the
//! [`ResourceLibrary`], and one process per project configuration. Calendar
//! starts are converted to hour offsets relative to the earliest start date,
//! which becomes the run's reference date.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::project::START_FIELD;
use crate::config::{ConfigValue, FutureResource, ProjectConfig, StartTime};
use crate::core::project::{run_project, ProjectContext, RunLedger};
use crate::core::{
    CoralError, Environment, ProjectExecutor, ProjectFailure, ProjectLog, ProjectState,
    ResourceLibrary, SimTime, SkippedResource, WeatherSeries,
};
use crate::util::dates::{start_offset_hours, whole_day_delay_hours};

/// Outcome of [`GlobalManager::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Identifier attached to this run's tracing span.
    pub run_id: Uuid,
    /// Logs of completed projects, in completion order.
    pub logs: Vec<ProjectLog>,
    /// Projects whose collaborator failed.
    pub failures: Vec<ProjectFailure>,
    /// Resources left out of the library for missing data.
    pub skipped: Vec<SkippedResource>,
    /// Projects still waiting for resources when the run ended.
    pub unfinished: Vec<String>,
}

impl RunReport {
    /// Whether every project completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.unfinished.is_empty()
    }

    /// Latest finish time, or zero when nothing completed.
    pub fn makespan(&self) -> SimTime {
        self.logs.iter().map(|log| log.finished).fold(0.0, f64::max)
    }
}

/// Summary of one project's timing, for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Display name.
    pub name: String,
    /// Hours spent waiting for resources.
    pub delay: SimTime,
    /// Hours holding resources.
    pub duration: SimTime,
}

impl From<&ProjectLog> for ProjectSummary {
    fn from(log: &ProjectLog) -> Self {
        Self {
            name: log.name.clone(),
            delay: log.delay(),
            duration: log.duration(),
        }
    }
}

/// Builds and runs one simulation.
pub struct GlobalManager {
    run_id: Uuid,
    ctx: ProjectContext,
    reference: Option<NaiveDateTime>,
    names: Vec<String>,
}

impl std::fmt::Debug for GlobalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalManager")
            .field("run_id", &self.run_id)
            .field("now", &self.ctx.env.now())
            .field("reference", &self.reference)
            .field("projects", &self.names)
            .finish_non_exhaustive()
    }
}

impl GlobalManager {
    /// Validate the configurations against the library and spawn one process
    /// per project.
    ///
    /// # Errors
    ///
    /// [`CoralError::UnknownResource`] if a project references a pool the
    /// library does not hold, [`CoralError::InvalidConfig`] if calendar and
    /// numeric starts are mixed or a start cannot be parsed.
    pub fn new(
        configs: impl IntoIterator<Item = ProjectConfig>,
        library: ResourceLibrary,
        executor: Arc<dyn ProjectExecutor>,
    ) -> Result<Self, CoralError> {
        let configs: Vec<ProjectConfig> = configs.into_iter().collect();

        for config in &configs {
            for key in config.shared_pools() {
                library.require(key)?;
            }
        }

        let starts = configs
            .iter()
            .map(ProjectConfig::start)
            .collect::<Result<Vec<_>, _>>()?;
        let reference = reference_date(&configs, &starts)?;
        let names = unique_names(&configs);

        let ctx = ProjectContext {
            env: Environment::new(),
            library: Arc::new(Mutex::new(library)),
            executor,
            weather: Arc::new(Mutex::new(None)),
            ledger: Arc::new(Mutex::new(RunLedger::default())),
        };

        for ((config, start), name) in configs.into_iter().zip(starts).zip(&names) {
            let offset = match (start, reference) {
                (StartTime::Date(date), Some(reference)) => start_offset_hours(reference, date),
                (StartTime::Offset(hours), _) => hours,
                (StartTime::Date(_), None) => 0.0,
            };
            tracing::debug!(project = %name, offset, "spawning project process");
            ctx.env
                .process(run_project(ctx.clone(), name.clone(), config, offset));
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            ctx,
            reference,
            names,
        })
    }

    /// Attach an hourly weather series handed to every project at its start.
    #[must_use]
    pub fn with_weather(self, weather: WeatherSeries) -> Self {
        *self.ctx.weather.lock() = Some(weather);
        self
    }

    /// Schedule one additional unit of `(category, name)` at each date.
    ///
    /// Calendar dates count whole days from the reference date; offsets are
    /// taken as hours.
    ///
    /// # Errors
    ///
    /// [`CoralError::UnknownResource`] for an unknown pool,
    /// [`CoralError::NegativeDelay`] for a date before the run start, and
    /// [`CoralError::InvalidConfig`] for a calendar date in a run without one.
    pub fn add_future_resources(
        &self,
        category: &str,
        name: &str,
        dates: &[StartTime],
    ) -> Result<(), CoralError> {
        let key = crate::core::PoolKey::new(category, name);
        self.ctx.library.lock().require(&key)?;

        let mut delays = Vec::with_capacity(dates.len());
        for date in dates {
            let delay = match (*date, self.reference) {
                (StartTime::Offset(hours), _) => hours,
                (StartTime::Date(date), Some(reference)) => whole_day_delay_hours(reference, date),
                (StartTime::Date(date), None) => {
                    return Err(CoralError::InvalidConfig(format!(
                        "future resource `{key}` dated {date} but the run has no calendar start"
                    )))
                }
            };
            if delay < 0.0 {
                return Err(CoralError::NegativeDelay {
                    category: key.category.clone(),
                    name: key.name.clone(),
                    delay: -delay,
                });
            }
            delays.push(delay);
        }

        for delay in delays {
            let env = self.ctx.env.clone();
            let library = Arc::clone(&self.ctx.library);
            let key = key.clone();
            self.ctx.env.process(async move {
                env.timeout(delay).await;
                let grown = library.lock().grow_capacity(&key.category, &key.name, 1);
                if let Err(e) = grown {
                    tracing::warn!(error = %e, "future resource could not be added");
                }
            });
        }
        Ok(())
    }

    /// Schedule every future resource of a scenario.
    ///
    /// # Errors
    ///
    /// The first error [`GlobalManager::add_future_resources`] reports.
    pub fn add_future_allocations(&self, future: &[FutureResource]) -> Result<(), CoralError> {
        for resource in future {
            self.add_future_resources(&resource.category, &resource.name, &resource.dates)?;
        }
        Ok(())
    }

    /// Drive the simulation until no events remain.
    pub fn run(&self) -> RunReport {
        let span = tracing::info_span!("simulation", run_id = %self.run_id);
        let _enter = span.enter();
        tracing::info!(projects = self.names.len(), "simulation started");

        self.ctx.env.run();

        let report = self.report();
        tracing::info!(
            completed = report.logs.len(),
            failed = report.failures.len(),
            unfinished = report.unfinished.len(),
            now = self.ctx.env.now(),
            "simulation finished"
        );
        report
    }

    /// Process one instant of the timeline. Returns `false` once exhausted.
    pub fn step(&self) -> bool {
        self.ctx.env.step()
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.ctx.env.now()
    }

    /// Run identifier.
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Earliest calendar start, when the run uses dates.
    pub const fn reference_date(&self) -> Option<NaiveDateTime> {
        self.reference
    }

    /// Display names, in configuration order.
    pub fn project_names(&self) -> &[String] {
        &self.names
    }

    /// Current state of a project.
    pub fn project_state(&self, name: &str) -> Option<ProjectState> {
        self.ctx.ledger.lock().states.get(name).copied()
    }

    /// Completed logs, with `Date *` fields when the run has a reference date.
    pub fn logs(&self) -> Vec<ProjectLog> {
        let ledger = self.ctx.ledger.lock();
        match self.reference {
            Some(reference) => ledger.logs.iter().map(|log| log.with_dates(reference)).collect(),
            None => ledger.logs.clone(),
        }
    }

    /// Per-project delay and duration, in completion order.
    pub fn summaries(&self) -> Vec<ProjectSummary> {
        self.ctx.ledger.lock().logs.iter().map(ProjectSummary::from).collect()
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> Vec<ProjectFailure> {
        self.ctx.ledger.lock().failures.clone()
    }

    /// Shared handle to the resource library.
    pub fn library(&self) -> Arc<Mutex<ResourceLibrary>> {
        Arc::clone(&self.ctx.library)
    }

    fn report(&self) -> RunReport {
        let (skipped, unfinished) = {
            let library = self.ctx.library.lock();
            let unfinished = library
                .pending()
                .iter()
                .map(|request| request.project().to_string())
                .collect();
            (library.skipped().to_vec(), unfinished)
        };
        RunReport {
            run_id: self.run_id,
            logs: self.logs(),
            failures: self.failures(),
            skipped,
            unfinished,
        }
    }
}

/// Earliest calendar start. Projects that set a numeric start alongside
/// dated ones make the run ambiguous.
fn reference_date(
    configs: &[ProjectConfig],
    starts: &[StartTime],
) -> Result<Option<NaiveDateTime>, CoralError> {
    let reference = starts
        .iter()
        .filter_map(|start| match start {
            StartTime::Date(date) => Some(*date),
            StartTime::Offset(_) => None,
        })
        .min();

    if reference.is_some() {
        let explicit_offset = configs
            .iter()
            .zip(starts)
            .find(|(config, start)| !start.is_date() && sets_start(config));
        if let Some((config, start)) = explicit_offset {
            return Err(CoralError::InvalidConfig(format!(
                "project `{}` starts at offset {start} while others use calendar dates",
                config.base_name()
            )));
        }
    }
    Ok(reference)
}

/// Whether the project names a start; `null` counts as unset.
fn sets_start(config: &ProjectConfig) -> bool {
    !matches!(
        config.get(START_FIELD),
        None | Some(ConfigValue::Literal(serde_json::Value::Null))
    )
}

/// First use of a base name keeps it; later uses get `_2`, `_3`, ...
fn unique_names(configs: &[ProjectConfig]) -> Vec<String> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let mut used = BTreeSet::new();
    let mut names = Vec::with_capacity(configs.len());

    for config in configs {
        let base = config.base_name();
        let count = seen.entry(base).or_insert(0);
        let mut name = base.to_string();
        loop {
            *count += 1;
            if *count > 1 {
                name = format!("{base}_{count}");
            }
            if used.insert(name.clone()) {
                break;
            }
        }
        names.push(name);
    }
    names
}

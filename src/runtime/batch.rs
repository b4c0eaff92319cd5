//! Run independent scenarios concurrently on tokio's blocking pool.
//!
//! Each scenario is a complete simulation with its own library and manager,
//! so scenarios share nothing but the project list, the data loader, and the
//! executor. Concurrency is bounded by a semaphore, defaulting to the number
//! of CPUs.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::builders::build_library;
use crate::config::{ProjectConfig, ScenarioConfig};
use crate::core::{CoralError, GlobalManager, ProjectExecutor, RunReport, WeatherSeries};
use crate::infra::ResourceDataLoader;

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Scenario name.
    pub scenario: String,
    /// Outcome of its run.
    pub report: RunReport,
}

/// Runs scenarios against a fixed set of projects.
#[derive(Clone)]
pub struct ScenarioRunner {
    projects: Arc<[ProjectConfig]>,
    loader: Arc<dyn ResourceDataLoader>,
    executor: Arc<dyn ProjectExecutor>,
    weather: Option<WeatherSeries>,
    limit: Arc<Semaphore>,
}

impl ScenarioRunner {
    /// Runner with one concurrent scenario per CPU.
    pub fn new(
        projects: Vec<ProjectConfig>,
        loader: Arc<dyn ResourceDataLoader>,
        executor: Arc<dyn ProjectExecutor>,
    ) -> Self {
        Self {
            projects: projects.into(),
            loader,
            executor,
            weather: None,
            limit: Arc::new(Semaphore::new(num_cpus::get().max(1))),
        }
    }

    /// Limit concurrent scenarios.
    #[must_use]
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.limit = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Weather series handed to every scenario.
    #[must_use]
    pub fn with_weather(mut self, weather: WeatherSeries) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Run one scenario on the calling thread.
    pub fn run_blocking(&self, scenario: &ScenarioConfig) -> Result<ScenarioReport, CoralError> {
        scenario
            .validate()
            .map_err(CoralError::InvalidConfig)?;
        let library = build_library(&scenario.allocations, self.loader.as_ref())?;

        let mut manager = GlobalManager::new(
            self.projects.iter().cloned(),
            library,
            Arc::clone(&self.executor),
        )?;
        if let Some(weather) = &self.weather {
            manager = manager.with_weather(weather.clone());
        }
        manager.add_future_allocations(&scenario.future_resources)?;

        tracing::info!(scenario = %scenario.name, run_id = %manager.run_id(), "running scenario");
        Ok(ScenarioReport {
            scenario: scenario.name.clone(),
            report: manager.run(),
        })
    }

    /// Run one scenario on the blocking pool, waiting for a free slot.
    pub async fn run_one(&self, scenario: ScenarioConfig) -> Result<ScenarioReport, CoralError> {
        let permit = Arc::clone(&self.limit)
            .acquire_owned()
            .await
            .map_err(|e| CoralError::Runtime(e.to_string()))?;
        let runner = self.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            runner.run_blocking(&scenario)
        })
        .await
        .map_err(|e| CoralError::Runtime(format!("scenario task failed: {e}")))?
    }

    /// Run every scenario concurrently. Results keep the input order.
    pub async fn run_all(
        &self,
        scenarios: Vec<ScenarioConfig>,
    ) -> Vec<Result<ScenarioReport, CoralError>> {
        let runs = scenarios.into_iter().map(|scenario| self.run_one(scenario));
        futures::future::join_all(runs).await
    }
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("projects", &self.projects.len())
            .field("available_slots", &self.limit.available_permits())
            .finish_non_exhaustive()
    }
}

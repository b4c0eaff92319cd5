//! Tests for the tokio scenario runner

use std::sync::Arc;

use coral::config::{AllocationConfig, FutureResource, ProjectConfig, ScenarioConfig, StartTime};
use coral::core::{AppResult, CoralError, ExecutionReport, ProjectExecutor, ResolvedConfig, WeatherWindow};
use coral::infra::InMemoryLoader;
use coral::runtime::ScenarioRunner;
use serde_json::json;

struct Fixed(f64);

impl ProjectExecutor for Fixed {
    fn execute(
        &self,
        _config: &ResolvedConfig,
        _weather: Option<WeatherWindow<'_>>,
    ) -> AppResult<ExecutionReport> {
        Ok(ExecutionReport::new(self.0))
    }
}

fn runner() -> ScenarioRunner {
    let projects = (0..3)
        .map(|i| {
            ProjectConfig::new()
                .with_name(format!("farm_{i}"))
                .with_shared_pool("wtiv", "vessel")
        })
        .collect();
    let loader = InMemoryLoader::new().with("wtiv", "vessel", json!({"day_rate": 180000}));
    ScenarioRunner::new(projects, Arc::new(loader), Arc::new(Fixed(100.0))).with_concurrency(2)
}

fn scenario(name: &str, vessels: u32, future: Vec<FutureResource>) -> ScenarioConfig {
    ScenarioConfig {
        name: name.into(),
        allocations: AllocationConfig::new().with("wtiv", "vessel", vessels),
        future_resources: future,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scenarios_run_independently() {
    let runner = runner();
    let results = runner
        .run_all(vec![
            scenario("one_vessel", 1, Vec::new()),
            scenario("three_vessels", 3, Vec::new()),
            scenario(
                "vessel_later",
                1,
                vec![FutureResource::new("wtiv", "vessel", [StartTime::Offset(50.0)])],
            ),
        ])
        .await;

    let reports: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(reports[0].scenario, "one_vessel");
    assert_eq!(reports[0].report.makespan(), 300.0);
    assert_eq!(reports[1].report.makespan(), 100.0);
    assert_eq!(reports[2].report.makespan(), 200.0);
    assert!(reports.iter().all(|r| r.report.is_complete()));
}

#[tokio::test]
async fn test_invalid_scenario_reports_error() {
    let runner = runner();
    let bad = scenario(
        "bad_future",
        1,
        vec![FutureResource::new("port", "nowhere", [StartTime::Offset(1.0)])],
    );
    let err = runner.run_one(bad).await.unwrap_err();
    assert!(matches!(err, CoralError::InvalidConfig(_)));
}

#[test]
fn test_run_blocking_without_runtime() {
    let report = runner()
        .run_blocking(&scenario("sync", 1, Vec::new()))
        .unwrap();
    assert_eq!(report.report.logs.len(), 3);
}

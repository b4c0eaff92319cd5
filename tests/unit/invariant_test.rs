//! Randomized checks of pool accounting across whole runs

use std::sync::Arc;

use coral::builders::LibraryBuilder;
use coral::config::{ProjectConfig, StartTime};
use coral::core::{
    AppResult, ExecutionReport, GlobalManager, ProjectExecutor, ResolvedConfig, WeatherWindow,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

struct FromConfig;

impl ProjectExecutor for FromConfig {
    fn execute(
        &self,
        config: &ResolvedConfig,
        _weather: Option<WeatherWindow<'_>>,
    ) -> AppResult<ExecutionReport> {
        let duration = config
            .get("duration")
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow::anyhow!("duration missing"))?;
        Ok(ExecutionReport::new(duration))
    }
}

const CATEGORIES: &[&str] = &["wtiv", "feeder", "port"];
const NAMES: &[&str] = &["a", "b"];

fn random_run(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut builder = LibraryBuilder::new();
    for category in CATEGORIES {
        for name in NAMES {
            builder = builder.pool(*category, *name, rng.random_range(1..=2), Value::Null);
        }
    }
    let library = builder.build().unwrap();

    let projects: Vec<ProjectConfig> = (0..rng.random_range(1..12))
        .map(|i| {
            let mut cfg = ProjectConfig::new()
                .with_name(format!("p{i}"))
                .with_literal("duration", f64::from(rng.random_range(1..50_u32)))
                .with_start(StartTime::Offset(f64::from(rng.random_range(0..100_u32))));
            for category in CATEGORIES {
                if rng.random_bool(0.5) {
                    let name = NAMES[rng.random_range(0..NAMES.len())];
                    cfg = cfg.with_shared_pool(*category, name);
                }
            }
            cfg
        })
        .collect();
    let count = projects.len();

    let manager = GlobalManager::new(projects, library, Arc::new(FromConfig)).unwrap();
    manager
        .add_future_resources("port", "a", &[StartTime::Offset(f64::from(rng.random_range(0..200_u32)))])
        .unwrap();
    let handle = manager.library();

    let mut last = 0.0;
    while manager.step() {
        assert!(manager.now() >= last, "clock moved backwards (seed {seed})");
        last = manager.now();
        let lib = handle.lock();
        for pool in lib.pools() {
            assert!(
                pool.in_use() <= pool.capacity(),
                "{} over capacity (seed {seed})",
                pool.key()
            );
        }
    }

    let report = manager.run();
    assert_eq!(report.logs.len(), count, "seed {seed}");
    assert_eq!(handle.lock().total_in_use(), 0, "seed {seed}");
    for log in &report.logs {
        assert!(log.initialized <= log.started && log.started < log.finished);
    }
}

#[test]
fn test_random_runs_keep_pools_consistent() {
    for seed in 0..50 {
        random_run(seed);
    }
}

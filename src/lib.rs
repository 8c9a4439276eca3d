//! powerstep: Deterministic metrics for miner power-transition step tests
//!
//! A step test commands a miner from one power level to another at `t = 0`
//! and records measured power and temperatures either side of it. This
//! crate turns one such recording into ten metrics describing how the
//! device got there.
//!
//! ## Architecture
//!
//! - **Preprocessor**: action boundary check and data-quality profile
//! - **Baseline**: start power, target power, step direction, temperatures
//! - **Scanners**: segment scanner (band dwell) and window scanner (sharp changes)
//! - **Detectors**: band entry, setpoint hit, stable plateau, sharp drops and
//!   rises, overshoot / undershoot
//! - **Orchestrator**: dependency-ordered execution, failure isolation,
//!   consistency checks
//!
//! ## Usage
//!
//! ```ignore
//! use powerstep::{ingest, orchestrator};
//!
//! let loaded = ingest::load_csv("step_test.csv")?;
//! let result = orchestrator::run(&loaded.series);
//! println!("{}", result.to_json_pretty()?);
//! ```

pub mod baseline;
pub mod config;
pub mod detectors;
pub mod ingest;
pub mod orchestrator;
pub mod preprocess;
pub mod scanner;
pub mod summary;
pub mod types;

pub use config::EngineConfig;
pub use orchestrator::{run, run_with_config, MetricEngine};
pub use summary::RunSummary;

pub use types::{
    MetricError, MetricName, MetricResult, MetricStatus, OrchestrationResult, RunPhase, Sample,
    Series, StepDirection,
};

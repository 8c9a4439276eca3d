//! Metric Orchestrator - runs every calculator over one series
//!
//! Execution is tiered by the dependency graph in [`MetricName::dependencies`]:
//!
//! ```text
//! Series ──► Preprocessor ──► ┌ start_power ┐
//!                             │ target_power├──► step_direction ──► band_entry
//!                             │ temperatures│                   └─► overshoot_undershoot
//!                             │ sharp_drops │    target_power ───► setpoint_hit
//!                             └ sharp_rises ┘                  └─► stable_plateau
//!                                                        ──► consistency checks
//! ```
//!
//! The first tier has no inter-metric dependencies and is computed with
//! `rayon::join`. Results, warnings and errors are always recorded in the
//! fixed [`MetricName`] order, so two runs over the same series serialize
//! identically regardless of scheduling.
//!
//! A calculator failure never aborts the run: the metric is marked
//! `Failed`, its dependents `NotComputable`, and everything else still runs.
//! Only a series rejected by the preprocessor ends the run early.

pub mod consistency;

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::baseline::{classify_step, start_power, target_power, temperature_ranges};
use crate::config::{self, EngineConfig};
use crate::detectors::{
    detect_band_entry, detect_overshoot_undershoot, detect_setpoint_hit, detect_sharp_drops,
    detect_sharp_rises, detect_stable_plateau,
};
use crate::preprocess::Preprocessor;
use crate::types::{
    DataQualityReport, MetricError, MetricName, MetricResult, MetricStatus, OrchestrationResult,
    RunPhase, Series,
};

use consistency::ConsistencyInputs;

/// Run every metric over `series` with the process-wide configuration.
pub fn run(series: &Series) -> OrchestrationResult {
    run_with_config(series, config::get())
}

/// Run every metric over `series` with an explicit configuration.
pub fn run_with_config(series: &Series, config: &EngineConfig) -> OrchestrationResult {
    MetricEngine::new(config).run(series)
}

// ============================================================================
// Calculator Output
// ============================================================================

/// One calculator's return value plus the warnings it raised.
struct Computed<T> {
    result: Result<T, MetricError>,
    warnings: Vec<String>,
}

fn compute<T, F>(f: F) -> Computed<T>
where
    F: FnOnce(&mut Vec<String>) -> Result<T, MetricError>,
{
    let mut warnings = Vec::new();
    let result = f(&mut warnings);
    Computed { result, warnings }
}

/// Borrow an upstream result or report which dependency is missing.
fn require<T>(
    metric: MetricName,
    dependency: MetricName,
    value: &Option<T>,
) -> Result<&T, MetricError> {
    debug_assert!(
        metric.dependencies().contains(&dependency),
        "{metric} reads undeclared dependency {dependency}"
    );
    value
        .as_ref()
        .ok_or(MetricError::MissingDependency { metric, dependency })
}

// ============================================================================
// Run State
// ============================================================================

struct RunState {
    phase: RunPhase,
    metrics: BTreeMap<MetricName, MetricResult>,
    statuses: BTreeMap<MetricName, MetricStatus>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: RunPhase::Pending,
            metrics: BTreeMap::new(),
            statuses: BTreeMap::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn advance(&mut self, phase: RunPhase) {
        debug!(from = %self.phase, to = %phase, "Run phase transition");
        self.phase = phase;
    }

    /// Fails with the first declared dependency of `metric` that did not
    /// compute.
    fn gate(&self, metric: MetricName) -> Result<(), MetricError> {
        let missing = metric
            .dependencies()
            .iter()
            .find(|dep| self.statuses.get(dep) != Some(&MetricStatus::Computed));
        match missing {
            Some(&dependency) => Err(MetricError::MissingDependency { metric, dependency }),
            None => Ok(()),
        }
    }

    /// Store a calculator's outcome and hand the value back for dependents.
    fn record<T: Clone>(
        &mut self,
        name: MetricName,
        computed: Computed<T>,
        wrap: fn(T) -> MetricResult,
    ) -> Option<T> {
        for w in &computed.warnings {
            warn!(metric = %name, "{w}");
        }
        self.warnings.extend(computed.warnings);

        match computed.result {
            Ok(value) => {
                self.metrics.insert(name, wrap(value.clone()));
                self.statuses.insert(name, MetricStatus::Computed);
                Some(value)
            }
            Err(err) => {
                let status = match err {
                    MetricError::MissingDependency { .. } => MetricStatus::NotComputable,
                    _ => MetricStatus::Failed,
                };
                warn!(metric = %name, error = %err, ?status, "Metric not computed");
                self.statuses.insert(name, status);
                self.errors.push(format!("{name}: {err}"));
                None
            }
        }
    }

    fn finish(mut self, data_quality: Option<DataQualityReport>) -> OrchestrationResult {
        let success = self.errors.is_empty();
        if self.phase != RunPhase::Failed {
            self.advance(if success {
                RunPhase::Succeeded
            } else {
                RunPhase::PartiallyFailed
            });
        }
        OrchestrationResult {
            metrics: self.metrics,
            statuses: self.statuses,
            warnings: self.warnings,
            errors: self.errors,
            success,
            phase: self.phase,
            data_quality,
        }
    }
}

// ============================================================================
// Metric Engine
// ============================================================================

/// Deterministic metric engine bound to one configuration.
pub struct MetricEngine<'a> {
    config: &'a EngineConfig,
}

impl<'a> MetricEngine<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn run(&self, series: &Series) -> OrchestrationResult {
        let cfg = self.config;
        let mut state = RunState::new();

        // Phase 0: contract check
        let mut preprocess_warnings = Vec::new();
        let inspected = Preprocessor::inspect(series, &cfg.data_quality, &mut preprocess_warnings);
        let quality = match inspected {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "Series rejected, no metrics computed");
                state.warnings.extend(preprocess_warnings);
                state.errors.push(err.to_string());
                for name in MetricName::ALL {
                    state.statuses.insert(name, MetricStatus::NotComputable);
                }
                state.advance(RunPhase::Failed);
                return state.finish(None);
            }
        };
        state.warnings.extend(preprocess_warnings);
        state.advance(RunPhase::Preprocessed);

        // Phase 1: independent tier
        let after = series.after();
        let ((start, target), (temperatures, (drops, rises))) = rayon::join(
            || {
                rayon::join(
                    || compute(|_| start_power(series, &cfg.start_power)),
                    || compute(|w| target_power(series, &cfg.target_power, w)),
                )
            },
            || {
                rayon::join(
                    || compute(|w| Ok(temperature_ranges(series, w))),
                    || {
                        rayon::join(
                            || compute(|_| Ok(detect_sharp_drops(after, &cfg.anomaly))),
                            || compute(|_| Ok(detect_sharp_rises(after, &cfg.anomaly))),
                        )
                    },
                )
            },
        );

        let start = state.record(MetricName::StartPower, start, MetricResult::StartPower);
        let target = state.record(MetricName::TargetPower, target, MetricResult::TargetPower);
        state.advance(RunPhase::BaselineComputed);

        // Phase 2: classification
        let step = compute(|w| {
            state.gate(MetricName::StepDirection)?;
            let s = require(MetricName::StepDirection, MetricName::StartPower, &start)?;
            let t = require(MetricName::StepDirection, MetricName::TargetPower, &target)?;
            Ok(classify_step(s, t, &cfg.step, w))
        });
        let step = state.record(MetricName::StepDirection, step, MetricResult::StepDirection);
        state.record(
            MetricName::TemperatureRanges,
            temperatures,
            MetricResult::TemperatureRanges,
        );
        state.advance(RunPhase::Classified);

        // Phase 3: detectors
        let band = compute(|_| {
            state.gate(MetricName::BandEntry)?;
            let s = require(MetricName::BandEntry, MetricName::StartPower, &start)?;
            let t = require(MetricName::BandEntry, MetricName::TargetPower, &target)?;
            let d = require(MetricName::BandEntry, MetricName::StepDirection, &step)?;
            Ok(detect_band_entry(after, t.after, s.median, d.delta, &cfg.band_entry))
        });
        let band = state.record(MetricName::BandEntry, band, MetricResult::BandEntry);

        let setpoint = compute(|_| {
            state.gate(MetricName::SetpointHit)?;
            let t = require(MetricName::SetpointHit, MetricName::TargetPower, &target)?;
            Ok(detect_setpoint_hit(after, t.after, &cfg.setpoint_hit))
        });
        let setpoint = state.record(MetricName::SetpointHit, setpoint, MetricResult::SetpointHit);

        let plateau = compute(|_| {
            state.gate(MetricName::StablePlateau)?;
            let t = require(MetricName::StablePlateau, MetricName::TargetPower, &target)?;
            Ok(detect_stable_plateau(after, t.after, &cfg.stable_plateau))
        });
        state.record(MetricName::StablePlateau, plateau, MetricResult::StablePlateau);

        state.record(MetricName::SharpDrops, drops, MetricResult::SharpDrops);
        state.record(MetricName::SharpRises, rises, MetricResult::SharpRises);

        let transient = compute(|_| {
            state.gate(MetricName::OvershootUndershoot)?;
            let t = require(MetricName::OvershootUndershoot, MetricName::TargetPower, &target)?;
            let d = require(MetricName::OvershootUndershoot, MetricName::StepDirection, &step)?;
            Ok(detect_overshoot_undershoot(after, t.after, d.delta, &cfg.transient))
        });
        state.record(
            MetricName::OvershootUndershoot,
            transient,
            MetricResult::OvershootUndershoot,
        );
        state.advance(RunPhase::DetectorsRun);

        // Phase 4: cross-metric checks
        let inputs = ConsistencyInputs {
            start_power: start.as_ref(),
            target_power: target.as_ref(),
            step_direction: step.as_ref(),
            band_entry: band.as_ref(),
            setpoint_hit: setpoint.as_ref(),
        };
        for w in consistency::check(&inputs, &cfg.consistency) {
            warn!("{w}");
            state.warnings.push(w);
        }
        state.advance(RunPhase::Validated);

        let result = state.finish(Some(quality));
        info!(
            phase = %result.phase,
            computed = result
                .statuses
                .values()
                .filter(|s| **s == MetricStatus::Computed)
                .count(),
            warnings = result.warnings.len(),
            errors = result.errors.len(),
            "Metric run complete"
        );
        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, StepDirection};

    fn step_up_series() -> Series {
        let mut samples: Vec<Sample> = (-30..0)
            .map(|t| Sample::new(f64::from(t), 2500.0, Some(2500.0)))
            .collect();
        samples.extend((0..=120).map(|t| Sample::new(f64::from(t), 3500.0, Some(3500.0))));
        Series::new(samples)
    }

    #[test]
    fn test_all_metrics_computed_on_clean_series() {
        let result = run_with_config(&step_up_series(), &EngineConfig::default());
        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.phase, RunPhase::Succeeded);
        assert_eq!(result.metrics.len(), MetricName::ALL.len());
        assert!(MetricName::ALL
            .iter()
            .all(|m| result.status(*m) == Some(MetricStatus::Computed)));
        assert_eq!(
            result.step_direction().map(|s| s.direction),
            Some(StepDirection::Up)
        );
        assert!(result.data_quality.is_some());
    }

    #[test]
    fn test_missing_pre_action_power_gates_dependents() {
        let mut samples: Vec<Sample> = (-10..0)
            .map(|t| Sample::new(f64::from(t), 2500.0, None))
            .collect();
        samples.extend((0..=60).map(|t| Sample::new(f64::from(t), 3500.0, Some(3500.0))));
        let result = run_with_config(&Series::new(samples), &EngineConfig::default());

        assert!(!result.success);
        assert_eq!(result.phase, RunPhase::PartiallyFailed);
        assert_eq!(result.status(MetricName::StartPower), Some(MetricStatus::Failed));
        for dependent in [
            MetricName::StepDirection,
            MetricName::BandEntry,
            MetricName::OvershootUndershoot,
        ] {
            assert_eq!(result.status(dependent), Some(MetricStatus::NotComputable));
            assert!(result.metrics.get(&dependent).is_none());
        }
        // only need target power
        assert_eq!(result.status(MetricName::SetpointHit), Some(MetricStatus::Computed));
        assert_eq!(result.status(MetricName::StablePlateau), Some(MetricStatus::Computed));
        assert!(result.errors[0].starts_with("start_power: insufficient data"));
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        for name in MetricName::ALL {
            for dep in name.dependencies() {
                assert!(dep < &name, "{dep} must run before {name}");
            }
        }
    }

    #[test]
    fn test_gate_reports_first_missing_dependency() {
        let mut state = RunState::new();
        assert!(state.gate(MetricName::SharpDrops).is_ok());
        assert!(matches!(
            state.gate(MetricName::BandEntry),
            Err(MetricError::MissingDependency {
                dependency: MetricName::StartPower,
                ..
            })
        ));

        state.statuses.insert(MetricName::StartPower, MetricStatus::Computed);
        state.statuses.insert(MetricName::TargetPower, MetricStatus::Computed);
        state.statuses.insert(MetricName::StepDirection, MetricStatus::Failed);
        assert!(state.gate(MetricName::SetpointHit).is_ok());
        assert!(matches!(
            state.gate(MetricName::BandEntry),
            Err(MetricError::MissingDependency {
                dependency: MetricName::StepDirection,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_input_runs_nothing() {
        let samples = vec![
            Sample::new(-2.0, 2500.0, Some(2500.0)),
            Sample::new(-1.0, 2500.0, Some(2500.0)),
        ];
        let result = run_with_config(&Series::new(samples), &EngineConfig::default());
        assert!(!result.success);
        assert_eq!(result.phase, RunPhase::Failed);
        assert!(result.metrics.is_empty());
        assert!(result.data_quality.is_none());
        assert!(result
            .statuses
            .values()
            .all(|s| *s == MetricStatus::NotComputable));
        assert_eq!(
            result.errors,
            vec!["invalid input: No action time found (no rows with seconds >= 0)".to_string()]
        );
    }

    #[test]
    fn test_engine_exposes_config() {
        let config = EngineConfig::default();
        let engine = MetricEngine::new(&config);
        assert_eq!(engine.config(), &config);
    }
}

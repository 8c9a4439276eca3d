//! Baseline Calculators - pre-action reference levels
//!
//! Independent first-tier metrics computed straight from the series:
//!
//! - `start_power`: median measured power before the action
//! - `target_power`: commanded power either side of the action
//! - `temperature_ranges`: per-sensor extremes over the whole test
//! - `classify_step`: transition direction from the two power baselines
//!
//! None of these depend on another metric except the step classifier,
//! which takes the start and target results as inputs.

mod step;
mod temperature;

pub use step::classify_step;
pub use temperature::temperature_ranges;

use statrs::statistics::{Data, Median};
use tracing::debug;

use crate::config::{StartPowerConfig, TargetPowerConfig};
use crate::types::{MetricError, Series, StartPowerResult, TargetPowerResult};

// ============================================================================
// Start Power
// ============================================================================

/// Median of the non-missing pre-action actual power readings.
///
/// Also reports the last pre-action reading and its distance from the
/// median; a note is attached when that reading is missing or differs by
/// more than `last_value_note_threshold`.
pub fn start_power(
    series: &Series,
    config: &StartPowerConfig,
) -> Result<StartPowerResult, MetricError> {
    let before = series.before();
    if before.is_empty() {
        return Err(MetricError::InsufficientData(
            "no samples before the action (time < 0)".to_string(),
        ));
    }

    let values: Vec<f64> = before.iter().filter_map(|s| s.actual_power).collect();
    if values.is_empty() {
        return Err(MetricError::InsufficientData(format!(
            "all {} pre-action actual power values are missing",
            before.len()
        )));
    }

    let median = Data::new(values).median();
    let last_value = before.last().and_then(|s| s.actual_power);
    let difference = last_value.map(|v| (v - median).abs());

    let note = match (last_value, difference) {
        (Some(last), Some(diff)) if diff > config.last_value_note_threshold => Some(format!(
            "Last value ({last:.0}W) differs from median by {diff:.0}W"
        )),
        (None, _) => Some("Last value unavailable (missing)".to_string()),
        _ => None,
    };

    debug!(median, ?last_value, "Start power computed");

    Ok(StartPowerResult {
        median,
        last_value,
        difference,
        note,
    })
}

// ============================================================================
// Target Power
// ============================================================================

/// Commanded power immediately before and at the action index.
///
/// The first post-action commanded value is canonical even if the command
/// changes again later in the test; that case only warns.
pub fn target_power(
    series: &Series,
    config: &TargetPowerConfig,
    warnings: &mut Vec<String>,
) -> Result<TargetPowerResult, MetricError> {
    let idx = series.action_index().ok_or_else(|| {
        MetricError::InvalidInput("No action time found (no rows with seconds >= 0)".to_string())
    })?;
    if idx == 0 {
        return Err(MetricError::InsufficientData(
            "no sample before the action index to read the previous target from".to_string(),
        ));
    }

    let samples = series.samples();
    let before = samples[idx - 1].commanded_power;
    let after = samples[idx].commanded_power;
    let change = after - before;

    if change == 0.0 {
        warnings.push("Target power did not change at action time".to_string());
    }

    let mut later_targets: Vec<f64> = Vec::new();
    for s in &samples[idx..] {
        if s.commanded_power != after && !later_targets.contains(&s.commanded_power) {
            later_targets.push(s.commanded_power);
        }
    }
    if !later_targets.is_empty() {
        let listed: Vec<String> = std::iter::once(after)
            .chain(later_targets)
            .map(|v| format!("{v:.0}W"))
            .collect();
        warnings.push(format!(
            "Target power changed during test: [{}]; using {after:.0}W",
            listed.join(", ")
        ));
    }

    if before < 0.0 || after < 0.0 {
        warnings.push(format!(
            "Negative target power (before {before:.0}W, after {after:.0}W)"
        ));
    }
    if before.max(after) > config.max_plausible {
        warnings.push(format!(
            "Target power {:.0}W exceeds plausible maximum {:.0}W",
            before.max(after),
            config.max_plausible
        ));
    }

    debug!(before, after, change, "Target power computed");

    Ok(TargetPowerResult {
        before,
        after,
        change,
    })
}

// ============================================================================
// Tests
// ============================================================================

//! Cross-metric consistency checks run after every calculator.
//!
//! All findings are non-fatal warnings.

use crate::config::ConsistencyConfig;
use crate::types::{
    BandEntryResult, SetpointHitResult, StartPowerResult, StepDirection, StepDirectionResult,
    TargetPowerResult,
};

/// Metric results the checks read. Any of them may be absent when the
/// corresponding calculator failed; checks needing it are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsistencyInputs<'a> {
    pub start_power: Option<&'a StartPowerResult>,
    pub target_power: Option<&'a TargetPowerResult>,
    pub step_direction: Option<&'a StepDirectionResult>,
    pub band_entry: Option<&'a BandEntryResult>,
    pub setpoint_hit: Option<&'a SetpointHitResult>,
}

pub fn check(inputs: &ConsistencyInputs<'_>, config: &ConsistencyConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let (Some(start), Some(target)) = (inputs.start_power, inputs.target_power) {
        let gap = (start.median - target.before).abs();
        if gap > config.start_target_discrepancy {
            warnings.push(format!(
                "Large discrepancy between start power ({:.0}W) and target before ({:.0}W): {gap:.0}W difference",
                start.median, target.before
            ));
        }
    }

    if let Some(target) = inputs.target_power {
        // zero change already warned by the target calculator
        if target.change != 0.0 && target.change.abs() < config.small_change {
            warnings.push(format!(
                "Small commanded power change: {:+.0}W",
                target.change
            ));
        }
    }

    if let (Some(target), Some(step)) = (inputs.target_power, inputs.step_direction) {
        if (target.change - step.delta).abs() > config.delta_mismatch_tolerance {
            warnings.push(format!(
                "Step direction delta mismatch: expected {:.0}W, got {:.0}W",
                target.change, step.delta
            ));
        }
    }

    if let Some(step) = inputs.step_direction {
        if step.direction == StepDirection::Minimal
            && step.delta.abs() > config.minimal_large_delta
        {
            warnings.push(format!(
                "Step classified MINIMAL but delta is {:.0}W",
                step.delta
            ));
        }
    }

    if let (Some(band), Some(hit)) = (inputs.band_entry, inputs.setpoint_hit) {
        if let (Some(entry), Some(first_hit)) =
            (band.entry_time(), hit.summary.first_sustained_hit_time)
        {
            if entry > first_hit {
                warnings.push(format!(
                    "Band entry at {entry:.2}s is later than first sustained setpoint hit at {first_hit:.2}s"
                ));
            }
        }
    }

    warnings
}

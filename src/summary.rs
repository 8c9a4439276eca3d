//! Condensed view of a run for quick review (`--summary` on the CLI).

use serde::{Deserialize, Serialize};

use crate::types::{OrchestrationResult, StepDirection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerTransition {
    pub start: Option<f64>,
    pub target_before: Option<f64>,
    pub target_after: Option<f64>,
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub band_entry: Option<f64>,
    pub first_sustained_hit: Option<f64>,
    pub stable_plateaus: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    pub sharp_drops: usize,
    pub sharp_rises: usize,
    pub overshoot: bool,
    pub undershoot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePeaks {
    pub hash_board_max: Option<f64>,
    pub psu_max: Option<f64>,
}

/// High-level digest of an [`OrchestrationResult`].
///
/// Metrics that were not computed show up as `None`, zero or `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub test_type: Option<StepDirection>,
    pub power_transition: PowerTransition,
    pub timing: TimingSummary,
    pub anomalies: AnomalyCounts,
    pub temperature: TemperaturePeaks,
    pub success: bool,
    pub warning_count: usize,
    pub error_count: usize,
}

impl RunSummary {
    pub fn from_result(result: &OrchestrationResult) -> Self {
        let step = result.step_direction();
        let target = result.target_power();
        let transient = result.overshoot_undershoot();
        let temps = result.temperature_ranges();

        Self {
            test_type: step.map(|s| s.direction),
            power_transition: PowerTransition {
                start: result.start_power().map(|s| s.median),
                target_before: target.map(|t| t.before),
                target_after: target.map(|t| t.after),
                delta: step.map(|s| s.delta),
            },
            timing: TimingSummary {
                band_entry: result.band_entry().and_then(|b| b.entry_time()),
                first_sustained_hit: result
                    .setpoint_hit()
                    .and_then(|h| h.summary.first_sustained_hit_time),
                stable_plateaus: result
                    .stable_plateau()
                    .map_or(0, |p| p.summary.total_count),
            },
            anomalies: AnomalyCounts {
                sharp_drops: result.sharp_drops().map_or(0, |d| d.summary.count),
                sharp_rises: result.sharp_rises().map_or(0, |r| r.summary.count),
                overshoot: transient
                    .and_then(|t| t.overshoot.as_ref())
                    .is_some_and(|o| o.occurred),
                undershoot: transient
                    .and_then(|t| t.undershoot.as_ref())
                    .is_some_and(|u| u.occurred),
            },
            temperature: TemperaturePeaks {
                hash_board_max: temps.and_then(|t| t.hash_board_max).map(|s| s.max),
                psu_max: temps.and_then(|t| t.psu_temp_max).map(|s| s.max),
            },
            success: result.success,
            warning_count: result.warnings.len(),
            error_count: result.errors.len(),
        }
    }
}

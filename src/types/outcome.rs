//! Run outcome: metric errors, statuses, phases and the aggregated result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::metrics::{
    BandEntryResult, MetricName, MetricResult, OvershootUndershootResult, SetpointHitResult,
    SharpDropsResult, SharpRisesResult, StablePlateauResult, StartPowerResult,
    StepDirectionResult, TargetPowerResult, TemperatureRangesResult,
};
use super::quality::DataQualityReport;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// A required partition was empty or entirely missing.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// An upstream metric failed, so this one cannot be computed.
    #[error("not computable: {metric} requires {dependency}")]
    MissingDependency {
        metric: MetricName,
        dependency: MetricName,
    },

    /// The series itself is malformed. Fatal for the whole run.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// Status & Phase
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Computed,
    Failed,
    NotComputable,
}

/// Orchestration state machine.
///
/// `Pending → Preprocessed → BaselineComputed → Classified → DetectorsRun →
/// Validated → {Succeeded, PartiallyFailed}`. A series rejected by the
/// preprocessor ends in `Failed` without running any calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Pending,
    Preprocessed,
    BaselineComputed,
    Classified,
    DetectorsRun,
    Validated,
    Succeeded,
    PartiallyFailed,
    Failed,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunPhase::Pending => "pending",
            RunPhase::Preprocessed => "preprocessed",
            RunPhase::BaselineComputed => "baseline_computed",
            RunPhase::Classified => "classified",
            RunPhase::DetectorsRun => "detectors_run",
            RunPhase::Validated => "validated",
            RunPhase::Succeeded => "succeeded",
            RunPhase::PartiallyFailed => "partially_failed",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Orchestration Result
// ============================================================================

/// Everything one engine run produced. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub metrics: BTreeMap<MetricName, MetricResult>,
    pub statuses: BTreeMap<MetricName, MetricStatus>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub success: bool,
    pub phase: RunPhase,
    pub data_quality: Option<DataQualityReport>,
}

macro_rules! metric_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self) -> Option<&$ty> {
            match self.metrics.get(&MetricName::$variant) {
                Some(MetricResult::$variant(r)) => Some(r),
                _ => None,
            }
        }
    };
}

impl OrchestrationResult {
    metric_accessor!(start_power, StartPower, StartPowerResult);
    metric_accessor!(target_power, TargetPower, TargetPowerResult);
    metric_accessor!(step_direction, StepDirection, StepDirectionResult);
    metric_accessor!(temperature_ranges, TemperatureRanges, TemperatureRangesResult);
    metric_accessor!(band_entry, BandEntry, BandEntryResult);
    metric_accessor!(setpoint_hit, SetpointHit, SetpointHitResult);
    metric_accessor!(stable_plateau, StablePlateau, StablePlateauResult);
    metric_accessor!(sharp_drops, SharpDrops, SharpDropsResult);
    metric_accessor!(sharp_rises, SharpRises, SharpRisesResult);
    metric_accessor!(overshoot_undershoot, OvershootUndershoot, OvershootUndershootResult);

    pub fn status(&self, name: MetricName) -> Option<MetricStatus> {
        self.statuses.get(&name).copied()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

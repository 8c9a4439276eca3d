//! Per-metric result records.
//!
//! Field names are serialized as-is and form the contract consumed by
//! report renderers. All values are full precision; formatting is the
//! renderer's job.

use serde::{Deserialize, Serialize};

use super::events::{AnomalyEvent, BandWindow, ExitReason};

// ============================================================================
// Metric Names
// ============================================================================

/// The ten metrics, declared in execution order.
///
/// `Ord` follows declaration order so ordered maps keyed by `MetricName`
/// iterate in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    StartPower,
    TargetPower,
    StepDirection,
    TemperatureRanges,
    BandEntry,
    SetpointHit,
    StablePlateau,
    SharpDrops,
    SharpRises,
    OvershootUndershoot,
}

impl MetricName {
    pub const ALL: [MetricName; 10] = [
        MetricName::StartPower,
        MetricName::TargetPower,
        MetricName::StepDirection,
        MetricName::TemperatureRanges,
        MetricName::BandEntry,
        MetricName::SetpointHit,
        MetricName::StablePlateau,
        MetricName::SharpDrops,
        MetricName::SharpRises,
        MetricName::OvershootUndershoot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::StartPower => "start_power",
            MetricName::TargetPower => "target_power",
            MetricName::StepDirection => "step_direction",
            MetricName::TemperatureRanges => "temperature_ranges",
            MetricName::BandEntry => "band_entry",
            MetricName::SetpointHit => "setpoint_hit",
            MetricName::StablePlateau => "stable_plateau",
            MetricName::SharpDrops => "sharp_drops",
            MetricName::SharpRises => "sharp_rises",
            MetricName::OvershootUndershoot => "overshoot_undershoot",
        }
    }

    /// Upstream metrics whose results this metric consumes.
    pub fn dependencies(self) -> &'static [MetricName] {
        match self {
            MetricName::StartPower
            | MetricName::TargetPower
            | MetricName::TemperatureRanges
            | MetricName::SharpDrops
            | MetricName::SharpRises => &[],
            MetricName::StepDirection => &[MetricName::StartPower, MetricName::TargetPower],
            MetricName::BandEntry => &[
                MetricName::StartPower,
                MetricName::TargetPower,
                MetricName::StepDirection,
            ],
            MetricName::SetpointHit | MetricName::StablePlateau => &[MetricName::TargetPower],
            MetricName::OvershootUndershoot => {
                &[MetricName::TargetPower, MetricName::StepDirection]
            }
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Baseline Metrics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPowerResult {
    /// Median actual power over the pre-action partition.
    pub median: f64,
    /// Actual power of the last pre-action sample.
    pub last_value: Option<f64>,
    /// `|last_value - median|`
    pub difference: Option<f64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPowerResult {
    pub before: f64,
    pub after: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepDirection {
    Up,
    Down,
    Minimal,
}

impl std::fmt::Display for StepDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepDirection::Up => write!(f, "UP"),
            StepDirection::Down => write!(f, "DOWN"),
            StepDirection::Minimal => write!(f, "MINIMAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDirectionResult {
    pub direction: StepDirection,
    /// `target.after - start.median`
    pub delta: f64,
    pub start_median: f64,
    pub target_after: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRangesResult {
    pub hash_board_max: Option<TemperatureStats>,
    pub psu_temp_max: Option<TemperatureStats>,
}

// ============================================================================
// Band Entry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandEntryStatus {
    Entered,
    InitiallyInBand,
    BrieflyInBandAtStart,
    BriefEntryNotSustained,
    NotEntered,
    NoValidData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMethod {
    Normal,
    ViaOvershoot,
    ViaUndershoot,
    InitiallyInBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproach {
    pub time: f64,
    pub wattage: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEntryResult {
    pub status: BandEntryStatus,
    pub time: Option<f64>,
    pub wattage: Option<f64>,
    pub percentage: Option<f64>,
    pub duration: Option<f64>,
    pub left_at: Option<f64>,
    pub entry_method: Option<EntryMethod>,
    pub closest_approach: Option<ClosestApproach>,
    pub band_limits: BandWindow,
}

impl BandEntryResult {
    /// Empty result for a status; callers fill in the fields it carries.
    pub fn with_status(status: BandEntryStatus, band_limits: BandWindow) -> Self {
        Self {
            status,
            time: None,
            wattage: None,
            percentage: None,
            duration: None,
            left_at: None,
            entry_method: None,
            closest_approach: None,
            band_limits,
        }
    }

    /// Time at which the device was (sustainably) in band, if it ever was.
    pub fn entry_time(&self) -> Option<f64> {
        match self.status {
            BandEntryStatus::Entered | BandEntryStatus::InitiallyInBand => self.time,
            _ => None,
        }
    }
}

// ============================================================================
// Setpoint Hit
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefTouch {
    pub time: f64,
    pub wattage: f64,
    pub duration: f64,
    pub exit_time: f64,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainedHit {
    pub time: f64,
    pub wattage: f64,
    pub duration: f64,
    pub avg_wattage: f64,
    pub exit_time: f64,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointHitSummary {
    pub total_brief_touches: usize,
    pub total_sustained_hits: usize,
    pub first_sustained_hit_time: Option<f64>,
    pub never_sustained: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointHitResult {
    pub brief_touches: Vec<BriefTouch>,
    pub sustained_hits: Vec<SustainedHit>,
    pub summary: SetpointHitSummary,
    pub band_limits: BandWindow,
}

// ============================================================================
// Stable Plateau
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plateau {
    pub start_time: f64,
    pub duration: f64,
    pub avg_wattage: f64,
    pub exit_time: f64,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauSummary {
    pub total_count: usize,
    pub longest_duration: f64,
    pub total_stable_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StablePlateauResult {
    pub plateaus: Vec<Plateau>,
    pub summary: PlateauSummary,
    pub band_limits: BandWindow,
}

// ============================================================================
// Sharp Drops / Rises
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub count: usize,
    /// Largest magnitude across events.
    pub worst_magnitude: Option<f64>,
    /// Steepest rate: most negative for drops, most positive for rises.
    pub worst_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpDropsResult {
    pub sharp_drops: Vec<AnomalyEvent>,
    pub summary: AnomalySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpRisesResult {
    pub sharp_rises: Vec<AnomalyEvent>,
    pub summary: AnomalySummary,
}

// ============================================================================
// Overshoot / Undershoot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvershootResult {
    pub occurred: bool,
    pub time: Option<f64>,
    pub peak_time: Option<f64>,
    pub peak_wattage: Option<f64>,
    pub magnitude: Option<f64>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndershootResult {
    pub occurred: bool,
    pub time: Option<f64>,
    pub lowest_time: Option<f64>,
    pub lowest_wattage: Option<f64>,
    pub magnitude: Option<f64>,
    pub duration: Option<f64>,
}

/// Exactly one of `overshoot` / `undershoot` is populated, chosen by the
/// sign of the step delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvershootUndershootResult {
    pub target: f64,
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overshoot: Option<OvershootResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undershoot: Option<UndershootResult>,
}

impl OvershootUndershootResult {
    pub fn occurred(&self) -> bool {
        self.overshoot.as_ref().is_some_and(|o| o.occurred)
            || self.undershoot.as_ref().is_some_and(|u| u.occurred)
    }
}

// ============================================================================
// Tagged Union
// ============================================================================

/// One computed metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricResult {
    StartPower(StartPowerResult),
    TargetPower(TargetPowerResult),
    StepDirection(StepDirectionResult),
    TemperatureRanges(TemperatureRangesResult),
    BandEntry(BandEntryResult),
    SetpointHit(SetpointHitResult),
    StablePlateau(StablePlateauResult),
    SharpDrops(SharpDropsResult),
    SharpRises(SharpRisesResult),
    OvershootUndershoot(OvershootUndershootResult),
}

impl MetricResult {
    pub fn name(&self) -> MetricName {
        match self {
            MetricResult::StartPower(_) => MetricName::StartPower,
            MetricResult::TargetPower(_) => MetricName::TargetPower,
            MetricResult::StepDirection(_) => MetricName::StepDirection,
            MetricResult::TemperatureRanges(_) => MetricName::TemperatureRanges,
            MetricResult::BandEntry(_) => MetricName::BandEntry,
            MetricResult::SetpointHit(_) => MetricName::SetpointHit,
            MetricResult::StablePlateau(_) => MetricName::StablePlateau,
            MetricResult::SharpDrops(_) => MetricName::SharpDrops,
            MetricResult::SharpRises(_) => MetricName::SharpRises,
            MetricResult::OvershootUndershoot(_) => MetricName::OvershootUndershoot,
        }
    }
}

//! Scanner primitives: band windows, in-band segments and anomaly events.

use serde::{Deserialize, Serialize};

// ============================================================================
// Band Window
// ============================================================================

/// Symmetric interval `[target - tolerance, target + tolerance]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandWindow {
    pub lower: f64,
    pub upper: f64,
    pub tolerance: f64,
}

impl BandWindow {
    pub fn around(target: f64, tolerance: f64) -> Self {
        Self {
            lower: target - tolerance,
            upper: target + tolerance,
            tolerance,
        }
    }

    /// Inclusive membership test. A missing reading is never in band.
    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| self.lower <= v && v <= self.upper)
    }

    /// Why a reading falls outside the band.
    pub fn exit_reason(&self, value: Option<f64>) -> ExitReason {
        match value {
            Some(v) if v < self.lower => ExitReason::DroppedBelow,
            Some(v) if v > self.upper => ExitReason::ExceededAbove,
            _ => ExitReason::Unknown,
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    DroppedBelow,
    ExceededAbove,
    TestEnded,
    Unknown,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::DroppedBelow => write!(f, "dropped_below"),
            ExitReason::ExceededAbove => write!(f, "exceeded_above"),
            ExitReason::TestEnded => write!(f, "test_ended"),
            ExitReason::Unknown => write!(f, "unknown"),
        }
    }
}

/// A maximal contiguous run of in-band samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_time: f64,
    pub start_value: f64,
    pub duration: f64,
    /// Mean of the in-band readings that make up the segment.
    pub average_value: f64,
    pub exit_time: f64,
    pub exit_reason: ExitReason,
}

// ============================================================================
// Anomaly Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyDirection {
    Drop,
    Rise,
}

impl AnomalyDirection {
    /// Whether `candidate` is further in this direction than `current`.
    /// Strict, so the earliest extremum wins ties.
    pub fn more_extreme(self, candidate: f64, current: f64) -> bool {
        match self {
            AnomalyDirection::Drop => candidate < current,
            AnomalyDirection::Rise => candidate > current,
        }
    }

    /// Movement from `start` to `end` measured in this direction.
    /// Positive when the move goes the anomalous way.
    pub fn movement(self, start: f64, end: f64) -> f64 {
        match self {
            AnomalyDirection::Drop => start - end,
            AnomalyDirection::Rise => end - start,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            AnomalyDirection::Drop => -1.0,
            AnomalyDirection::Rise => 1.0,
        }
    }
}

/// One sharp drop or rise.
///
/// `magnitude = |start - end|`; `rate = magnitude / duration`, negative for
/// drops and positive for rises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub time: f64,
    #[serde(rename = "start_wattage")]
    pub start_value: f64,
    #[serde(rename = "end_wattage")]
    pub end_value: f64,
    pub magnitude: f64,
    pub duration: f64,
    pub rate: f64,
}

impl AnomalyEvent {
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_contains_is_inclusive() {
        let band = BandWindow::around(100.0, 10.0);
        assert!(band.contains(Some(90.0)));
        assert!(band.contains(Some(110.0)));
        assert!(!band.contains(Some(110.01)));
        assert!(!band.contains(None));
    }

    #[test]
    fn test_exit_reason_from_value() {
        let band = BandWindow::around(100.0, 10.0);
        assert_eq!(band.exit_reason(Some(50.0)), ExitReason::DroppedBelow);
        assert_eq!(band.exit_reason(Some(150.0)), ExitReason::ExceededAbove);
        assert_eq!(band.exit_reason(None), ExitReason::Unknown);
    }

    #[test]
    fn test_direction_movement_sign() {
        assert!(AnomalyDirection::Drop.movement(100.0, 80.0) > 0.0);
        assert!(AnomalyDirection::Rise.movement(100.0, 80.0) < 0.0);
        assert!(!AnomalyDirection::Drop.more_extreme(80.0, 80.0));
    }
}

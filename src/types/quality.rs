//! Data-quality metadata gathered before any metric runs.

use serde::{Deserialize, Serialize};

/// Inclusive index range of consecutive samples missing actual power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn row_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// A gap between two consecutive sample timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGap {
    pub from: f64,
    pub to: f64,
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_rows: usize,
    pub action_index: usize,
    pub action_time: f64,

    pub pre_action_rows: usize,
    /// Seconds from the first sample to the action sample.
    pub pre_action_duration: f64,
    pub post_action_rows: usize,
    /// Seconds from the action sample to the last sample.
    pub post_action_duration: f64,

    pub missing_actual_power: usize,
    pub missing_hash_board_temp: usize,
    pub missing_psu_temp: usize,
    pub outage_count: usize,
    pub missing_power_segments: Vec<IndexRange>,

    pub max_time_gap: f64,
    pub large_time_gaps: Vec<TimeGap>,
}

impl DataQualityReport {
    pub fn missing_power_pct(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.missing_actual_power as f64 / self.total_rows as f64 * 100.0
        }
    }

    pub fn outage_pct(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.outage_count as f64 / self.total_rows as f64 * 100.0
        }
    }
}

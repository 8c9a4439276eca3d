//! Sharp Drops and Sharp Rises: the two directional window scans.
//!
//! Rises include the expected ramp toward a higher target; nothing near the
//! action boundary is suppressed.

use crate::config::AnomalyConfig;
use crate::scanner::WindowScanner;
use crate::types::{AnomalyDirection, Sample, SharpDropsResult, SharpRisesResult};

fn scanner(direction: AnomalyDirection, config: &AnomalyConfig) -> WindowScanner {
    WindowScanner::new(direction, config.relative_threshold, config.window_secs)
}

pub fn detect_sharp_drops(after: &[Sample], config: &AnomalyConfig) -> SharpDropsResult {
    let scanner = scanner(AnomalyDirection::Drop, config);
    let sharp_drops = scanner.scan(after);
    let summary = scanner.summarize(&sharp_drops);
    SharpDropsResult {
        sharp_drops,
        summary,
    }
}

pub fn detect_sharp_rises(after: &[Sample], config: &AnomalyConfig) -> SharpRisesResult {
    let scanner = scanner(AnomalyDirection::Rise, config);
    let sharp_rises = scanner.scan(after);
    let summary = scanner.summarize(&sharp_rises);
    SharpRisesResult {
        sharp_rises,
        summary,
    }
}

//! Stable Plateau: long dwells inside a narrow band around the target.

use crate::config::StablePlateauConfig;
use crate::scanner::SegmentScanner;
use crate::types::{BandWindow, Plateau, PlateauSummary, Sample, StablePlateauResult};

pub fn detect_stable_plateau(
    after: &[Sample],
    target: f64,
    config: &StablePlateauConfig,
) -> StablePlateauResult {
    let band = BandWindow::around(target, config.tolerance);
    let scanner = SegmentScanner::new(band, config.min_duration_secs);

    let plateaus: Vec<Plateau> = scanner
        .scan(after)
        .into_iter()
        .filter(|s| scanner.qualifies(s))
        .map(|s| Plateau {
            start_time: s.start_time,
            duration: s.duration,
            avg_wattage: s.average_value,
            exit_time: s.exit_time,
            exit_reason: s.exit_reason,
        })
        .collect();

    let summary = PlateauSummary {
        total_count: plateaus.len(),
        longest_duration: plateaus.iter().map(|p| p.duration).fold(0.0, f64::max),
        total_stable_time: plateaus.iter().map(|p| p.duration).sum(),
    };

    StablePlateauResult {
        plateaus,
        summary,
        band_limits: band,
    }
}

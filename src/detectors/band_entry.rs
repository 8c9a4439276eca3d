//! Band Entry: when the device first settles near the new target.
//!
//! The band is adaptive: 5% of the target, but never wider than half the
//! step, so small steps get a proportionally tight band.

use crate::config::BandEntryConfig;
use crate::scanner::SegmentScanner;
use crate::types::{
    BandEntryResult, BandEntryStatus, BandWindow, ClosestApproach, EntryMethod, Sample, Segment,
};

/// `max(min(target_fraction * target, step_fraction * |target - start|), min_tolerance)`
///
/// Never negative; a negative target collapses the band rather than
/// inverting it.
pub fn adaptive_tolerance(target: f64, start_median: f64, config: &BandEntryConfig) -> f64 {
    let by_target = config.target_fraction * target;
    let by_step = config.step_fraction * (target - start_median).abs();
    by_target.min(by_step).max(config.min_tolerance).max(0.0)
}

/// Classify how (and whether) post-action power entered the adaptive band.
///
/// Precedence, first match wins:
/// 1. first segment starts inside the initial window and qualifies: `INITIALLY_IN_BAND`
/// 2. any qualifying segment (the first one): `ENTERED`
/// 3. first segment starts inside the initial window but is brief: `BRIEFLY_IN_BAND_AT_START`
/// 4. only brief segments: the longest as `BRIEF_ENTRY_NOT_SUSTAINED`
/// 5. no segment: `NOT_ENTERED` with the closest approach, or `NO_VALID_DATA`
pub fn detect_band_entry(
    after: &[Sample],
    target: f64,
    start_median: f64,
    delta: f64,
    config: &BandEntryConfig,
) -> BandEntryResult {
    let band = BandWindow::around(target, adaptive_tolerance(target, start_median, config));
    let scanner = SegmentScanner::new(band, config.min_duration_secs);
    let segments = scanner.scan(after);

    let at_start = segments
        .first()
        .filter(|s| s.start_time < config.initial_window_secs);

    if let Some(seg) = at_start.filter(|s| scanner.qualifies(s)) {
        let mut result = from_segment(BandEntryStatus::InitiallyInBand, seg, target, band);
        result.entry_method = Some(EntryMethod::InitiallyInBand);
        return result;
    }

    if let Some(seg) = segments.iter().find(|s| scanner.qualifies(s)) {
        let mut result = from_segment(BandEntryStatus::Entered, seg, target, band);
        result.entry_method = Some(entry_method(seg.start_value, target, delta));
        return result;
    }

    if let Some(seg) = at_start {
        let mut result = from_segment(BandEntryStatus::BrieflyInBandAtStart, seg, target, band);
        result.left_at = Some(seg.exit_time);
        return result;
    }

    if let Some(seg) = longest(&segments) {
        let mut result = from_segment(BandEntryStatus::BriefEntryNotSustained, seg, target, band);
        result.left_at = Some(seg.exit_time);
        return result;
    }

    match closest_approach(after, target) {
        Some(approach) => {
            let mut result = BandEntryResult::with_status(BandEntryStatus::NotEntered, band);
            result.closest_approach = Some(approach);
            result
        }
        None => BandEntryResult::with_status(BandEntryStatus::NoValidData, band),
    }
}

fn from_segment(
    status: BandEntryStatus,
    seg: &Segment,
    target: f64,
    band: BandWindow,
) -> BandEntryResult {
    let mut result = BandEntryResult::with_status(status, band);
    result.time = Some(seg.start_time);
    result.wattage = Some(seg.start_value);
    result.percentage = (target != 0.0).then(|| seg.start_value / target * 100.0);
    result.duration = Some(seg.duration);
    result
}

fn entry_method(value: f64, target: f64, delta: f64) -> EntryMethod {
    if delta > 0.0 && value > target {
        EntryMethod::ViaOvershoot
    } else if delta < 0.0 && value < target {
        EntryMethod::ViaUndershoot
    } else {
        EntryMethod::Normal
    }
}

/// Longest segment; earliest on ties.
fn longest(segments: &[Segment]) -> Option<&Segment> {
    segments.iter().fold(None, |best: Option<&Segment>, s| match best {
        Some(b) if b.duration >= s.duration => Some(b),
        _ => Some(s),
    })
}

/// Non-missing reading nearest the target; earliest on ties.
fn closest_approach(after: &[Sample], target: f64) -> Option<ClosestApproach> {
    after
        .iter()
        .filter_map(|s| s.actual_power.map(|v| (s.time, v, (v - target).abs())))
        .fold(None, |best: Option<(f64, f64, f64)>, cur| match best {
            Some(b) if b.2 <= cur.2 => Some(b),
            _ => Some(cur),
        })
        .map(|(time, wattage, distance)| ClosestApproach {
            time,
            wattage,
            distance,
        })
}

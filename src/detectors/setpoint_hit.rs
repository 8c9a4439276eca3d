//! Setpoint Hit: every visit to a tight band around the target,
//! split into brief touches and sustained hits.

use crate::config::SetpointHitConfig;
use crate::scanner::SegmentScanner;
use crate::types::{
    BandWindow, BriefTouch, Sample, SetpointHitResult, SetpointHitSummary, SustainedHit,
};

pub fn detect_setpoint_hit(
    after: &[Sample],
    target: f64,
    config: &SetpointHitConfig,
) -> SetpointHitResult {
    let band = BandWindow::around(target, config.tolerance);
    let scanner = SegmentScanner::new(band, config.min_duration_secs);
    let (sustained, brief) = scanner.partition(scanner.scan(after));

    let brief_touches: Vec<BriefTouch> = brief
        .iter()
        .map(|s| BriefTouch {
            time: s.start_time,
            wattage: s.start_value,
            duration: s.duration,
            exit_time: s.exit_time,
            exit_reason: s.exit_reason,
        })
        .collect();

    let sustained_hits: Vec<SustainedHit> = sustained
        .iter()
        .map(|s| SustainedHit {
            time: s.start_time,
            wattage: s.start_value,
            duration: s.duration,
            avg_wattage: s.average_value,
            exit_time: s.exit_time,
            exit_reason: s.exit_reason,
        })
        .collect();

    let summary = SetpointHitSummary {
        total_brief_touches: brief_touches.len(),
        total_sustained_hits: sustained_hits.len(),
        first_sustained_hit_time: sustained_hits.first().map(|h| h.time),
        never_sustained: sustained_hits.is_empty(),
    };

    SetpointHitResult {
        brief_touches,
        sustained_hits,
        summary,
        band_limits: band,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExitReason;

    fn series(points: &[(i32, i32, f64)]) -> Vec<Sample> {
        points
            .iter()
            .flat_map(|&(from, to, v)| {
                (from..=to).map(move |t| Sample::new(f64::from(t), 3500.0, Some(v)))
            })
            .collect()
    }

    #[test]
    fn test_partitions_brief_and_sustained() {
        let data = series(&[
            (0, 9, 3000.0),
            (10, 19, 3510.0),
            (20, 29, 3000.0),
            (30, 70, 3490.0),
            (71, 80, 3600.0),
        ]);
        let result = detect_setpoint_hit(&data, 3500.0, &SetpointHitConfig::default());

        assert_eq!(result.brief_touches.len(), 1);
        assert_eq!(result.sustained_hits.len(), 1);
        assert!(result.brief_touches.iter().all(|b| b.duration < 25.0));
        assert!(result.sustained_hits.iter().all(|h| h.duration >= 25.0));

        let hit = &result.sustained_hits[0];
        assert_eq!(hit.time, 30.0);
        assert!((hit.duration - 41.0).abs() < 1e-9);
        assert!((hit.avg_wattage - 3490.0).abs() < 1e-9);
        assert_eq!(hit.exit_reason, ExitReason::ExceededAbove);

        assert_eq!(result.summary.first_sustained_hit_time, Some(30.0));
        assert!(!result.summary.never_sustained);
    }

    #[test]
    fn test_never_sustained() {
        let data = series(&[(0, 9, 3500.0), (10, 20, 3000.0)]);
        let result = detect_setpoint_hit(&data, 3500.0, &SetpointHitConfig::default());
        assert_eq!(result.summary.total_brief_touches, 1);
        assert_eq!(result.summary.total_sustained_hits, 0);
        assert!(result.summary.never_sustained);
        assert!(result.summary.first_sustained_hit_time.is_none());
    }

    #[test]
    fn test_exactly_min_duration_is_sustained() {
        let data = series(&[(0, 25, 3500.0)]);
        let result = detect_setpoint_hit(&data, 3500.0, &SetpointHitConfig::default());
        assert_eq!(result.sustained_hits.len(), 1);
        assert_eq!(result.sustained_hits[0].exit_reason, ExitReason::TestEnded);
    }
}

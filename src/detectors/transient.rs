//! Overshoot / Undershoot: direction-gated excursions past the target.
//!
//! Rising steps are checked for overshoot only, falling steps for
//! undershoot only. A zero delta is treated as rising.

use crate::config::TransientConfig;
use crate::types::{
    AnomalyDirection, OvershootResult, OvershootUndershootResult, Sample, UndershootResult,
};

/// `max(threshold_floor, threshold_fraction * target)`
pub fn transient_threshold(target: f64, config: &TransientConfig) -> f64 {
    config.threshold_floor.max(config.threshold_fraction * target)
}

/// An excursion beyond `target ± threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Excursion {
    /// First reading beyond the limit.
    crossing_time: f64,
    /// Most extreme reading at or after the crossing.
    extreme_time: f64,
    extreme_value: f64,
    magnitude: f64,
    /// Crossing until the first later reading back within the limit, or
    /// until the last sample if it never returns.
    duration: f64,
}

fn find_excursion(
    after: &[Sample],
    target: f64,
    threshold: f64,
    side: AnomalyDirection,
) -> Option<Excursion> {
    let limit = target + side.sign() * threshold;
    let beyond = |v: f64| side.more_extreme(v, limit);

    let valid: Vec<(f64, f64)> = after
        .iter()
        .filter_map(|s| s.actual_power.map(|v| (s.time, v)))
        .collect();

    let cross = valid.iter().position(|&(_, v)| beyond(v))?;
    let (crossing_time, _) = valid[cross];

    let mut extreme = cross;
    for (j, &(_, v)) in valid.iter().enumerate().skip(cross + 1) {
        if side.more_extreme(v, valid[extreme].1) {
            extreme = j;
        }
    }
    let (extreme_time, extreme_value) = valid[extreme];

    let end_time = valid[cross + 1..]
        .iter()
        .find(|&&(_, v)| !beyond(v))
        .map(|&(t, _)| t)
        .or_else(|| after.last().map(|s| s.time))
        .unwrap_or(crossing_time);

    Some(Excursion {
        crossing_time,
        extreme_time,
        extreme_value,
        magnitude: (extreme_value - target).abs(),
        duration: end_time - crossing_time,
    })
}

pub fn detect_overshoot_undershoot(
    after: &[Sample],
    target: f64,
    delta: f64,
    config: &TransientConfig,
) -> OvershootUndershootResult {
    let threshold = transient_threshold(target, config);

    if delta >= 0.0 {
        let found = find_excursion(after, target, threshold, AnomalyDirection::Rise);
        OvershootUndershootResult {
            target,
            threshold,
            overshoot: Some(OvershootResult {
                occurred: found.is_some(),
                time: found.map(|e| e.crossing_time),
                peak_time: found.map(|e| e.extreme_time),
                peak_wattage: found.map(|e| e.extreme_value),
                magnitude: found.map(|e| e.magnitude),
                duration: found.map(|e| e.duration),
            }),
            undershoot: None,
        }
    } else {
        let found = find_excursion(after, target, threshold, AnomalyDirection::Drop);
        OvershootUndershootResult {
            target,
            threshold,
            overshoot: None,
            undershoot: Some(UndershootResult {
                occurred: found.is_some(),
                time: found.map(|e| e.crossing_time),
                lowest_time: found.map(|e| e.extreme_time),
                lowest_wattage: found.map(|e| e.extreme_value),
                magnitude: found.map(|e| e.magnitude),
                duration: found.map(|e| e.duration),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(f64, Option<f64>)]) -> Vec<Sample> {
        points
            .iter()
            .map(|&(t, v)| Sample::new(t, 3500.0, v))
            .collect()
    }

    #[test]
    fn test_threshold_floor_and_fraction() {
        let config = TransientConfig::default();
        assert_eq!(transient_threshold(3500.0, &config), 200.0);
        assert!((transient_threshold(10_000.0, &config) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_overshoot_peak_and_return() {
        let data = samples(&[
            (0.0, Some(3000.0)),
            (1.0, Some(3750.0)),
            (2.0, None),
            (3.0, Some(3900.0)),
            (4.0, Some(3800.0)),
            (5.0, Some(3600.0)),
            (6.0, Some(3900.0)),
        ]);
        let result =
            detect_overshoot_undershoot(&data, 3500.0, 1000.0, &TransientConfig::default());
        assert!(result.undershoot.is_none());
        let o = result.overshoot.unwrap();
        assert!(o.occurred);
        assert_eq!(o.time, Some(1.0));
        assert_eq!(o.peak_time, Some(3.0), "earliest of equal peaks");
        assert_eq!(o.peak_wattage, Some(3900.0));
        assert_eq!(o.magnitude, Some(400.0));
        assert_eq!(o.duration, Some(4.0));
        assert!(o.peak_wattage.unwrap() > 3500.0 + result.threshold);
    }

    #[test]
    fn test_overshoot_never_returns_runs_to_end() {
        let data = samples(&[
            (0.0, Some(3000.0)),
            (2.0, Some(3800.0)),
            (8.0, Some(3750.0)),
            (9.0, None),
        ]);
        let result =
            detect_overshoot_undershoot(&data, 3500.0, 1000.0, &TransientConfig::default());
        assert_eq!(result.overshoot.unwrap().duration, Some(7.0));
    }

    #[test]
    fn test_exactly_at_limit_is_not_overshoot() {
        let data = samples(&[(0.0, Some(3700.0)), (1.0, Some(3500.0))]);
        let result =
            detect_overshoot_undershoot(&data, 3500.0, 1000.0, &TransientConfig::default());
        let o = result.overshoot.unwrap();
        assert!(!o.occurred);
        assert!(o.time.is_none());
        assert!(o.peak_wattage.is_none());
    }

    #[test]
    fn test_down_step_checks_undershoot_only() {
        let data = samples(&[
            (0.0, Some(3400.0)),
            (1.0, Some(2250.0)),
            (2.0, Some(2200.0)),
            (3.0, Some(2450.0)),
            (4.0, Some(2500.0)),
            (5.0, Some(4000.0)),
        ]);
        let result =
            detect_overshoot_undershoot(&data, 2500.0, -934.0, &TransientConfig::default());
        assert!(result.overshoot.is_none(), "down steps never report overshoot");
        let u = result.undershoot.unwrap();
        assert!(u.occurred);
        assert_eq!(u.time, Some(1.0));
        assert_eq!(u.lowest_time, Some(2.0));
        assert_eq!(u.lowest_wattage, Some(2200.0));
        assert_eq!(u.magnitude, Some(300.0));
        assert_eq!(u.duration, Some(2.0));
    }
}

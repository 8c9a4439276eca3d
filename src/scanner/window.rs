//! Window Anomaly Scanner: rolling look-ahead extrema with consumption.

use crate::types::{AnomalyDirection, AnomalyEvent, AnomalySummary, Sample};

#[derive(Debug, Clone, Copy)]
pub struct WindowScanner {
    direction: AnomalyDirection,
    relative_threshold: f64,
    window_secs: f64,
}

impl WindowScanner {
    pub fn new(direction: AnomalyDirection, relative_threshold: f64, window_secs: f64) -> Self {
        Self {
            direction,
            relative_threshold,
            window_secs,
        }
    }

    /// Detect sharp moves over the finite readings in `samples`.
    ///
    /// For each unconsumed candidate `i`, the extremum of the readings in
    /// `(t_i, t_i + window]` is compared with `v_i`. A relative move of at
    /// least the threshold emits an event and consumes every reading from
    /// `i` through the extremum, so events never share readings. Candidates
    /// with a non-positive reading are skipped since the relative move is
    /// undefined there.
    pub fn scan(&self, samples: &[Sample]) -> Vec<AnomalyEvent> {
        let valid: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|s| s.actual_power.map(|v| (s.time, v)))
            .filter(|(_, v)| v.is_finite())
            .collect();
        if valid.len() < 2 {
            return Vec::new();
        }

        let mut consumed = vec![false; valid.len()];
        let mut events = Vec::new();

        for i in 0..valid.len() {
            if consumed[i] {
                continue;
            }
            let (t0, v0) = valid[i];
            if v0 <= 0.0 {
                continue;
            }

            let Some(k) = self.extremum_in_window(&valid, i) else {
                continue;
            };
            let (t1, v1) = valid[k];
            let movement = self.direction.movement(v0, v1);
            if !(movement > 0.0 && movement / v0 >= self.relative_threshold) {
                continue;
            }

            let duration = t1 - t0;
            events.push(AnomalyEvent {
                time: t0,
                start_value: v0,
                end_value: v1,
                magnitude: movement,
                duration,
                rate: self.direction.sign() * movement / duration,
            });
            consumed[i..=k].iter_mut().for_each(|c| *c = true);
        }

        events
    }

    /// Index of the most extreme reading strictly after `t_i` and within
    /// the window; earliest wins ties.
    fn extremum_in_window(&self, valid: &[(f64, f64)], i: usize) -> Option<usize> {
        let (t0, _) = valid[i];
        let end = t0 + self.window_secs;
        let mut best: Option<usize> = None;

        for (j, &(t, v)) in valid.iter().enumerate().skip(i + 1) {
            if t > end {
                break;
            }
            if t <= t0 {
                continue;
            }
            match best {
                Some(b) if !self.direction.more_extreme(v, valid[b].1) => {}
                _ => best = Some(j),
            }
        }
        best
    }

    /// Count, largest magnitude and steepest rate across `events`.
    pub fn summarize(&self, events: &[AnomalyEvent]) -> AnomalySummary {
        let worst_magnitude = events.iter().map(|e| e.magnitude).reduce(f64::max);
        let worst_rate = match self.direction {
            AnomalyDirection::Drop => events.iter().map(|e| e.rate).reduce(f64::min),
            AnomalyDirection::Rise => events.iter().map(|e| e.rate).reduce(f64::max),
        };
        AnomalySummary {
            count: events.len(),
            worst_magnitude,
            worst_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[(f64, f64)]) -> Vec<Sample> {
        values
            .iter()
            .map(|&(t, v)| Sample::new(t, 1000.0, Some(v)))
            .collect()
    }

    fn drops() -> WindowScanner {
        WindowScanner::new(AnomalyDirection::Drop, 0.15, 5.0)
    }

    fn rises() -> WindowScanner {
        WindowScanner::new(AnomalyDirection::Rise, 0.15, 5.0)
    }

    #[test]
    fn test_nan_reading_is_not_an_event() {
        let mut data = samples(&[(0.0, 3500.0), (1.0, 3500.0), (2.0, 3500.0), (3.0, 3500.0)]);
        data[2].actual_power = Some(f64::NAN);
        assert!(drops().scan(&data).is_empty());
        assert!(rises().scan(&data).is_empty());
    }

    #[test]
    fn test_nan_reading_does_not_mask_real_drop() {
        let mut data = samples(&[(0.0, 1000.0), (1.0, 1000.0), (2.0, 700.0), (3.0, 1000.0)]);
        data[1].actual_power = Some(f64::NAN);
        let events = drops().scan(&data);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end_value, 700.0);
        assert!(events[0].magnitude.is_finite());
    }

    #[test]
    fn test_detects_drop_within_window() {
        let data = samples(&[(0.0, 1000.0), (1.0, 1000.0), (2.0, 800.0), (3.0, 1000.0)]);
        let events = drops().scan(&data);
        assert_eq!(events.len(), 1);
        let e = events[0];
        assert_eq!(e.time, 0.0);
        assert_eq!(e.start_value, 1000.0);
        assert_eq!(e.end_value, 800.0);
        assert!((e.magnitude - 200.0).abs() < 1e-9);
        assert!((e.duration - 2.0).abs() < 1e-9);
        assert!((e.rate + 100.0).abs() < 1e-9, "drop rate must be negative");
    }

    #[test]
    fn test_consumption_prevents_overlapping_events() {
        let data = samples(&[
            (0.0, 1000.0),
            (1.0, 1000.0),
            (2.0, 700.0),
            (3.0, 700.0),
            (4.0, 700.0),
        ]);
        let events = drops().scan(&data);
        assert_eq!(events.len(), 1, "one dip must be reported once: {events:?}");
    }

    #[test]
    fn test_extremum_tie_resolves_to_earliest() {
        let data = samples(&[(0.0, 1000.0), (1.0, 700.0), (2.0, 700.0)]);
        let events = drops().scan(&data);
        assert_eq!(events.len(), 1);
        assert!((events[0].duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let data = samples(&[(0.0, 1000.0), (5.0, 800.0)]);
        assert_eq!(drops().scan(&data).len(), 1);
        let data = samples(&[(0.0, 1000.0), (5.01, 800.0)]);
        assert!(drops().scan(&data).is_empty());
    }

    #[test]
    fn test_below_threshold_ignored() {
        let data = samples(&[(0.0, 1000.0), (1.0, 860.0), (2.0, 1000.0)]);
        assert!(drops().scan(&data).is_empty());
    }

    #[test]
    fn test_rise_detection_and_positive_rate() {
        let data = samples(&[(0.0, 1000.0), (1.0, 1100.0), (2.0, 1300.0), (3.0, 1300.0)]);
        let events = rises().scan(&data);
        assert_eq!(events.len(), 1);
        assert!(events[0].rate > 0.0);
        assert_eq!(events[0].end_value, 1300.0);
    }

    #[test]
    fn test_missing_values_skipped() {
        let data = vec![
            Sample::new(0.0, 1000.0, Some(1000.0)),
            Sample::new(1.0, 1000.0, None),
            Sample::new(2.0, 1000.0, Some(500.0)),
        ];
        assert_eq!(drops().scan(&data).len(), 1);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(drops().scan(&[]).is_empty());
        assert!(drops().scan(&samples(&[(0.0, 1000.0)])).is_empty());
        let data = vec![Sample::new(0.0, 1.0, None), Sample::new(1.0, 1.0, None)];
        assert!(rises().scan(&data).is_empty());
    }

    #[test]
    fn test_summary_worst_values() {
        let data = samples(&[
            (0.0, 1000.0),
            (1.0, 700.0),
            (10.0, 1000.0),
            (14.0, 500.0),
        ]);
        let scanner = drops();
        let events = scanner.scan(&data);
        let summary = scanner.summarize(&events);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.worst_magnitude, Some(500.0));
        // -300/1s vs -500/4s
        assert_eq!(summary.worst_rate, Some(-300.0));
    }

    #[test]
    fn test_empty_summary() {
        let summary = rises().summarize(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.worst_magnitude.is_none());
        assert!(summary.worst_rate.is_none());
    }
}

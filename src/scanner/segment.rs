//! Segment Scanner: band-membership runs over the post-action partition.

use crate::types::{BandWindow, ExitReason, Sample, Segment};

/// Finds maximal runs of in-band readings.
///
/// A missing reading is out of band. A run closes at the first reading that
/// leaves the band, with the exit reason taken from that reading; a run
/// still open at the last sample closes there with `TestEnded`.
#[derive(Debug, Clone, Copy)]
pub struct SegmentScanner {
    band: BandWindow,
    min_duration: f64,
}

/// Running totals for the segment currently being tracked.
struct OpenSegment {
    start_time: f64,
    start_value: f64,
    sum: f64,
    count: usize,
}

impl OpenSegment {
    fn close(self, exit_time: f64, exit_reason: ExitReason) -> Segment {
        Segment {
            start_time: self.start_time,
            start_value: self.start_value,
            duration: exit_time - self.start_time,
            average_value: self.sum / self.count as f64,
            exit_time,
            exit_reason,
        }
    }
}

impl SegmentScanner {
    pub fn new(band: BandWindow, min_duration: f64) -> Self {
        Self { band, min_duration }
    }

    /// Whether a segment meets the minimum dwell time.
    pub fn qualifies(&self, segment: &Segment) -> bool {
        segment.duration >= self.min_duration
    }

    /// Scan samples in time order and return every segment.
    ///
    /// Zero-length runs (a single in-band reading on the final sample, or
    /// duplicate timestamps) carry no dwell time and are dropped, so every
    /// returned segment has `exit_time > start_time`.
    pub fn scan(&self, samples: &[Sample]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut open: Option<OpenSegment> = None;

        for sample in samples {
            let value = sample.actual_power;
            match (self.band.contains(value), value) {
                (true, Some(v)) => match open.as_mut() {
                    Some(seg) => {
                        seg.sum += v;
                        seg.count += 1;
                    }
                    None => {
                        open = Some(OpenSegment {
                            start_time: sample.time,
                            start_value: v,
                            sum: v,
                            count: 1,
                        });
                    }
                },
                _ => {
                    if let Some(seg) = open.take() {
                        segments.push(seg.close(sample.time, self.band.exit_reason(value)));
                    }
                }
            }
        }

        if let (Some(seg), Some(last)) = (open, samples.last()) {
            segments.push(seg.close(last.time, ExitReason::TestEnded));
        }

        segments.retain(|s| s.duration > 0.0);
        segments
    }

    /// Split segments into (qualifying, brief), preserving time order.
    pub fn partition(&self, segments: Vec<Segment>) -> (Vec<Segment>, Vec<Segment>) {
        segments.into_iter().partition(|s| self.qualifies(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(f64, Option<f64>)]) -> Vec<Sample> {
        points
            .iter()
            .map(|&(t, v)| Sample::new(t, 100.0, v))
            .collect()
    }

    fn scanner() -> SegmentScanner {
        SegmentScanner::new(BandWindow::around(100.0, 10.0), 3.0)
    }

    #[test]
    fn test_single_segment_closed_by_drop() {
        let data = samples(&[
            (0.0, Some(50.0)),
            (1.0, Some(95.0)),
            (2.0, Some(105.0)),
            (3.0, Some(100.0)),
            (4.0, Some(80.0)),
        ]);
        let segs = scanner().scan(&data);
        assert_eq!(segs.len(), 1);
        let s = segs[0];
        assert_eq!(s.start_time, 1.0);
        assert_eq!(s.start_value, 95.0);
        assert_eq!(s.exit_time, 4.0);
        assert!((s.duration - 3.0).abs() < 1e-9);
        assert!((s.average_value - 100.0).abs() < 1e-9);
        assert_eq!(s.exit_reason, ExitReason::DroppedBelow);
    }

    #[test]
    fn test_exit_reasons() {
        let data = samples(&[
            (0.0, Some(100.0)),
            (1.0, Some(150.0)),
            (2.0, Some(100.0)),
            (3.0, None),
            (4.0, Some(100.0)),
            (5.0, Some(100.0)),
        ]);
        let segs = scanner().scan(&data);
        let reasons: Vec<ExitReason> = segs.iter().map(|s| s.exit_reason).collect();
        assert_eq!(
            reasons,
            vec![
                ExitReason::ExceededAbove,
                ExitReason::Unknown,
                ExitReason::TestEnded
            ]
        );
        assert_eq!(segs[2].exit_time, 5.0);
    }

    #[test]
    fn test_missing_value_breaks_segment() {
        let data = samples(&[
            (0.0, Some(100.0)),
            (1.0, None),
            (2.0, Some(100.0)),
            (3.0, Some(100.0)),
        ]);
        let segs = scanner().scan(&data);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].exit_time, 1.0);
        assert_eq!(segs[1].start_time, 2.0);
    }

    #[test]
    fn test_single_in_band_last_sample_is_dropped() {
        let data = samples(&[(0.0, Some(0.0)), (1.0, Some(100.0))]);
        assert!(scanner().scan(&data).is_empty());
    }

    #[test]
    fn test_partition_by_min_duration() {
        let data = samples(&[
            (0.0, Some(100.0)),
            (1.0, Some(0.0)),
            (2.0, Some(100.0)),
            (6.0, Some(100.0)),
            (7.0, Some(0.0)),
        ]);
        let sc = scanner();
        let (qualifying, brief) = sc.partition(sc.scan(&data));
        assert_eq!(qualifying.len(), 1);
        assert_eq!(brief.len(), 1);
        assert!(qualifying.iter().all(|s| s.duration >= 3.0));
        assert!(brief.iter().all(|s| s.duration < 3.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(scanner().scan(&[]).is_empty());
    }
}

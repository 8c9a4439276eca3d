//! Preprocessor: input contract check and data-quality profiling
//!
//! Locates the action index and rejects series that have no sample at or
//! after the commanded transition. Everything else is reported, not
//! rejected: missing readings, outages and timing gaps end up in a
//! `DataQualityReport` plus human-readable warnings.

use tracing::debug;

use crate::config::DataQualityConfig;
use crate::types::{DataQualityReport, IndexRange, MetricError, Series, TimeGap};

/// Stateless preprocessing pass over a `Series`.
pub struct Preprocessor;

impl Preprocessor {
    /// Validate the action boundary and profile data quality.
    ///
    /// Returns `InvalidInput` for an empty series or one with no
    /// `time >= 0` sample; the caller must not run any calculator then.
    pub fn inspect(
        series: &Series,
        config: &DataQualityConfig,
        warnings: &mut Vec<String>,
    ) -> Result<DataQualityReport, MetricError> {
        if series.is_empty() {
            return Err(MetricError::InvalidInput("series contains no samples".to_string()));
        }
        let action_index = series.action_index().ok_or_else(|| {
            MetricError::InvalidInput(
                "No action time found (no rows with seconds >= 0)".to_string(),
            )
        })?;

        let samples = series.samples();
        let total_rows = samples.len();
        let action_time = samples[action_index].time;
        let first_time = samples[0].time;
        let last_time = samples[total_rows - 1].time;

        let missing_actual_power = samples.iter().filter(|s| s.actual_power.is_none()).count();
        let missing_hash_board_temp = samples
            .iter()
            .filter(|s| s.hash_board_temp.is_none())
            .count();
        let missing_psu_temp = samples.iter().filter(|s| s.psu_temp.is_none()).count();
        let outage_count = samples.iter().filter(|s| s.outage).count();

        let (max_time_gap, large_time_gaps) = Self::time_gaps(series, config.large_gap_secs);

        let report = DataQualityReport {
            total_rows,
            action_index,
            action_time,
            pre_action_rows: action_index,
            pre_action_duration: if action_index > 0 { action_time - first_time } else { 0.0 },
            post_action_rows: total_rows - action_index,
            post_action_duration: last_time - action_time,
            missing_actual_power,
            missing_hash_board_temp,
            missing_psu_temp,
            outage_count,
            missing_power_segments: Self::missing_power_segments(series),
            max_time_gap,
            large_time_gaps,
        };

        if missing_actual_power > 0 {
            warnings.push(format!(
                "{missing_actual_power}/{total_rows} rows have missing actual power"
            ));
        }
        if outage_count > 0 {
            warnings.push(format!(
                "{outage_count}/{total_rows} rows flagged as outage ({:.1}%)",
                report.outage_pct()
            ));
        }
        if !report.large_time_gaps.is_empty() {
            warnings.push(format!(
                "Found {} time gaps longer than {}s (max {:.1}s)",
                report.large_time_gaps.len(),
                config.large_gap_secs,
                report.max_time_gap
            ));
        }

        debug!(
            rows = total_rows,
            action_index,
            missing_power = missing_actual_power,
            outages = outage_count,
            "Series preprocessed"
        );

        Ok(report)
    }

    /// Inclusive index ranges of consecutive rows with no actual power.
    fn missing_power_segments(series: &Series) -> Vec<IndexRange> {
        let mut segments = Vec::new();
        let mut open: Option<usize> = None;

        for (idx, sample) in series.samples().iter().enumerate() {
            match (sample.actual_power.is_none(), open) {
                (true, None) => open = Some(idx),
                (false, Some(start)) => {
                    segments.push(IndexRange { start, end: idx - 1 });
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open {
            segments.push(IndexRange {
                start,
                end: series.len() - 1,
            });
        }
        segments
    }

    /// Largest sample-to-sample gap and every gap above `threshold`.
    fn time_gaps(series: &Series, threshold: f64) -> (f64, Vec<TimeGap>) {
        let mut max_gap = 0.0_f64;
        let mut large = Vec::new();

        for pair in series.samples().windows(2) {
            let gap = pair[1].time - pair[0].time;
            max_gap = max_gap.max(gap);
            if gap > threshold {
                large.push(TimeGap {
                    from: pair[0].time,
                    to: pair[1].time,
                    gap,
                });
            }
        }
        (max_gap, large)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    fn inspect(samples: Vec<Sample>) -> (Result<DataQualityReport, MetricError>, Vec<String>) {
        let mut warnings = Vec::new();
        let series = Series::new(samples);
        let result = Preprocessor::inspect(&series, &DataQualityConfig::default(), &mut warnings);
        (result, warnings)
    }

    #[test]
    fn test_no_action_sample_is_invalid_input() {
        let (result, _) = inspect(vec![
            Sample::new(-2.0, 1000.0, Some(1000.0)),
            Sample::new(-1.0, 1000.0, Some(1000.0)),
        ]);
        assert!(matches!(result, Err(MetricError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_series_is_invalid_input() {
        let (result, _) = inspect(Vec::new());
        assert!(matches!(result, Err(MetricError::InvalidInput(_))));
    }

    #[test]
    fn test_partition_counts_and_durations() {
        let samples = (-10..=20)
            .map(|t| Sample::new(f64::from(t), 1000.0, Some(1000.0)))
            .collect();
        let (result, warnings) = inspect(samples);
        let report = result.unwrap();
        assert_eq!(report.total_rows, 31);
        assert_eq!(report.action_index, 10);
        assert_eq!(report.pre_action_rows, 10);
        assert_eq!(report.post_action_rows, 21);
        assert!((report.pre_action_duration - 10.0).abs() < 1e-9);
        assert!((report.post_action_duration - 20.0).abs() < 1e-9);
        assert!(warnings.is_empty(), "clean series should not warn: {warnings:?}");
    }

    #[test]
    fn test_missing_power_segments_and_warning() {
        let samples = vec![
            Sample::new(-2.0, 1000.0, None),
            Sample::new(-1.0, 1000.0, Some(1000.0)),
            Sample::new(0.0, 1500.0, None),
            Sample::new(1.0, 1500.0, None),
            Sample::new(2.0, 1500.0, Some(1500.0)),
            Sample::new(3.0, 1500.0, None),
        ];
        let (result, warnings) = inspect(samples);
        let report = result.unwrap();
        assert_eq!(report.missing_actual_power, 4);
        assert_eq!(
            report.missing_power_segments,
            vec![
                IndexRange { start: 0, end: 0 },
                IndexRange { start: 2, end: 3 },
                IndexRange { start: 5, end: 5 },
            ]
        );
        assert!(warnings.contains(&"4/6 rows have missing actual power".to_string()));
    }

    #[test]
    fn test_large_time_gap_reported() {
        let samples = vec![
            Sample::new(-1.0, 1000.0, Some(1000.0)),
            Sample::new(0.0, 1500.0, Some(1500.0)),
            Sample::new(30.0, 1500.0, Some(1500.0)),
        ];
        let (result, warnings) = inspect(samples);
        let report = result.unwrap();
        assert!((report.max_time_gap - 30.0).abs() < 1e-9);
        assert_eq!(report.large_time_gaps.len(), 1);
        assert!(warnings.iter().any(|w| w.contains("time gaps")));
    }

    #[test]
    fn test_outage_counted() {
        let samples = vec![
            Sample::new(-1.0, 1000.0, Some(1000.0)),
            Sample::new(0.0, 1500.0, Some(0.0)).with_outage(true),
        ];
        let (result, warnings) = inspect(samples);
        assert_eq!(result.unwrap().outage_count, 1);
        assert!(warnings.iter().any(|w| w.contains("outage")));
    }
}

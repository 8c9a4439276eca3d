//! Input series: samples straddling the commanded transition.

use serde::{Deserialize, Serialize};

/// One row of a step-test recording.
///
/// `time` is seconds relative to the commanded transition (negative before
/// the action, zero or positive after). Sensor readings that were absent
/// or unparseable are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub commanded_power: f64,
    pub actual_power: Option<f64>,
    pub hash_board_temp: Option<f64>,
    pub psu_temp: Option<f64>,
    #[serde(default)]
    pub outage: bool,
}

impl Sample {
    /// Power-only sample with no temperature readings and no outage.
    pub fn new(time: f64, commanded_power: f64, actual_power: Option<f64>) -> Self {
        Self {
            time,
            commanded_power,
            actual_power,
            hash_board_temp: None,
            psu_temp: None,
            outage: false,
        }
    }

    pub fn with_temps(mut self, hash_board_temp: Option<f64>, psu_temp: Option<f64>) -> Self {
        self.hash_board_temp = hash_board_temp;
        self.psu_temp = psu_temp;
        self
    }

    pub fn with_outage(mut self, outage: bool) -> Self {
        self.outage = outage;
        self
    }
}

/// Time-ordered samples for a single test.
///
/// Construction sorts by `time` (stable, so rows sharing a timestamp keep
/// their input order) and maps non-finite readings to `None`. Deserializing
/// goes through the same constructor. The series is read-only afterwards and is shared by
/// reference across every calculator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new(mut samples: Vec<Sample>) -> Self {
        for s in &mut samples {
            s.actual_power = s.actual_power.filter(|v| v.is_finite());
            s.hash_board_temp = s.hash_board_temp.filter(|v| v.is_finite());
            s.psu_temp = s.psu_temp.filter(|v| v.is_finite());
        }
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first sample with `time >= 0`, if any.
    pub fn action_index(&self) -> Option<usize> {
        self.samples.iter().position(|s| s.time >= 0.0)
    }

    /// Samples strictly before the action (`time < 0`).
    ///
    /// When no action sample exists the whole series is "before".
    pub fn before(&self) -> &[Sample] {
        let end = self.action_index().unwrap_or(self.samples.len());
        &self.samples[..end]
    }

    /// Samples at or after the action (`time >= 0`).
    pub fn after(&self) -> &[Sample] {
        match self.action_index() {
            Some(idx) => &self.samples[idx..],
            None => &[],
        }
    }

    /// Last sample before the action, if the series has one.
    pub fn last_before(&self) -> Option<&Sample> {
        self.before().last()
    }
}

impl From<Vec<Sample>> for Series {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl From<Series> for Vec<Sample> {
    fn from(series: Series) -> Self {
        series.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(time: f64, power: f64) -> Sample {
        Sample::new(time, 1000.0, Some(power))
    }

    #[test]
    fn test_new_sorts_by_time() {
        let series = Series::new(vec![s(2.0, 3.0), s(-1.0, 1.0), s(0.0, 2.0)]);
        let times: Vec<f64> = series.samples().iter().map(|x| x.time).collect();
        assert_eq!(times, vec![-1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_action_index_is_first_non_negative_time() {
        let series = Series::new(vec![s(-2.0, 1.0), s(-0.5, 1.0), s(0.0, 1.0), s(1.0, 1.0)]);
        assert_eq!(series.action_index(), Some(2));
        assert_eq!(series.before().len(), 2);
        assert_eq!(series.after().len(), 2);
        assert_eq!(series.last_before().map(|x| x.time), Some(-0.5));
    }

    #[test]
    fn test_no_action_sample() {
        let series = Series::new(vec![s(-2.0, 1.0), s(-1.0, 1.0)]);
        assert_eq!(series.action_index(), None);
        assert_eq!(series.before().len(), 2);
        assert!(series.after().is_empty());
    }

    #[test]
    fn test_all_post_action() {
        let series = Series::new(vec![s(0.5, 1.0), s(1.5, 1.0)]);
        assert_eq!(series.action_index(), Some(0));
        assert!(series.before().is_empty());
        assert!(series.last_before().is_none());
    }

    #[test]
    fn test_non_finite_readings_become_missing() {
        let series = Series::new(vec![
            Sample::new(0.0, 3500.0, Some(f64::NAN)).with_temps(Some(f64::INFINITY), Some(41.0)),
            Sample::new(1.0, 3500.0, Some(3490.0)).with_temps(Some(65.0), Some(f64::NAN)),
        ]);
        let samples = series.samples();
        assert_eq!(samples[0].actual_power, None);
        assert_eq!(samples[0].hash_board_temp, None);
        assert_eq!(samples[0].psu_temp, Some(41.0));
        assert_eq!(samples[1].actual_power, Some(3490.0));
        assert_eq!(samples[1].psu_temp, None);
    }

    #[test]
    fn test_deserialize_sorts_samples() {
        let json = r#"[
            {"time": 5.0, "commanded_power": 3500.0, "actual_power": 3500.0,
             "hash_board_temp": null, "psu_temp": null},
            {"time": -1.0, "commanded_power": 2500.0, "actual_power": 2500.0,
             "hash_board_temp": null, "psu_temp": null},
            {"time": 0.0, "commanded_power": 3500.0, "actual_power": 3000.0,
             "hash_board_temp": null, "psu_temp": null}
        ]"#;
        let series: Series = serde_json::from_str(json).unwrap();
        assert_eq!(series.action_index(), Some(1));
        assert_eq!(series.before().len(), 1);
        let after: Vec<f64> = series.after().iter().map(|x| x.time).collect();
        assert_eq!(after, vec![0.0, 5.0]);

        let roundtrip: Series =
            serde_json::from_str(&serde_json::to_string(&series).unwrap()).unwrap();
        assert_eq!(roundtrip, series);
    }

    #[test]
    fn test_stable_sort_keeps_duplicate_time_order() {
        let series = Series::new(vec![s(1.0, 10.0), s(0.0, 5.0), s(1.0, 20.0)]);
        let powers: Vec<f64> = series
            .samples()
            .iter()
            .filter_map(|x| x.actual_power)
            .collect();
        assert_eq!(powers, vec![5.0, 10.0, 20.0]);
    }
}

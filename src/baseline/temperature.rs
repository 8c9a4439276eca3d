//! Temperature extremes over the whole test, per sensor.

use crate::types::{Series, TemperatureRangesResult, TemperatureStats};

/// Min / max / range of each temperature sensor across both partitions.
///
/// Missing readings are skipped per sensor. A sensor with no readings at
/// all yields `None` and a warning.
pub fn temperature_ranges(series: &Series, warnings: &mut Vec<String>) -> TemperatureRangesResult {
    let samples = series.samples();

    let hash_board_max = stats(samples.iter().filter_map(|s| s.hash_board_temp));
    if hash_board_max.is_none() {
        warnings.push("All hash board temperature values missing".to_string());
    }

    let psu_temp_max = stats(samples.iter().filter_map(|s| s.psu_temp));
    if psu_temp_max.is_none() {
        warnings.push("All PSU temperature values missing".to_string());
    }

    TemperatureRangesResult {
        hash_board_max,
        psu_temp_max,
    }
}

fn stats(values: impl Iterator<Item = f64>) -> Option<TemperatureStats> {
    values
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .map(|(min, max)| TemperatureStats {
            min,
            max,
            range: max - min,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    #[test]
    fn test_ranges_span_both_partitions() {
        let series = Series::new(vec![
            Sample::new(-1.0, 1.0, Some(1.0)).with_temps(Some(60.0), Some(40.0)),
            Sample::new(0.0, 1.0, Some(1.0)).with_temps(None, Some(45.5)),
            Sample::new(1.0, 1.0, Some(1.0)).with_temps(Some(72.5), None),
        ]);
        let mut warnings = Vec::new();
        let result = temperature_ranges(&series, &mut warnings);
        let hb = result.hash_board_max.unwrap();
        assert_eq!((hb.min, hb.max), (60.0, 72.5));
        assert!((hb.range - 12.5).abs() < 1e-9);
        let psu = result.psu_temp_max.unwrap();
        assert_eq!((psu.min, psu.max), (40.0, 45.5));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_all_missing_sensor_is_absent_with_warning() {
        let series = Series::new(vec![
            Sample::new(-1.0, 1.0, Some(1.0)).with_temps(Some(60.0), None),
            Sample::new(0.0, 1.0, Some(1.0)).with_temps(Some(61.0), None),
        ]);
        let mut warnings = Vec::new();
        let result = temperature_ranges(&series, &mut warnings);
        assert!(result.hash_board_max.is_some());
        assert!(result.psu_temp_max.is_none());
        assert_eq!(warnings, vec!["All PSU temperature values missing".to_string()]);
    }
}

//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on calculator constants.
//!
//! Unknown keys are found by walking the raw `toml::Value` tree before serde
//! deserialization, so a typo warns instead of being silently defaulted.
//! Warnings never break an existing config.

use std::collections::HashSet;

use super::EngineConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path in `EngineConfig`.
///
/// Must be kept in step with engine_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "start_power",
        "start_power.last_value_note_threshold",
        "target_power",
        "target_power.max_plausible",
        "step",
        "step.minimal_threshold",
        "band_entry",
        "band_entry.target_fraction",
        "band_entry.step_fraction",
        "band_entry.min_tolerance",
        "band_entry.min_duration_secs",
        "band_entry.initial_window_secs",
        "setpoint_hit",
        "setpoint_hit.tolerance",
        "setpoint_hit.min_duration_secs",
        "stable_plateau",
        "stable_plateau.tolerance",
        "stable_plateau.min_duration_secs",
        "anomaly",
        "anomaly.relative_threshold",
        "anomaly.window_secs",
        "transient",
        "transient.threshold_floor",
        "transient.threshold_fraction",
        "consistency",
        "consistency.delta_mismatch_tolerance",
        "consistency.start_target_discrepancy",
        "consistency.small_change",
        "consistency.minimal_large_delta",
        "data_quality",
        "data_quality.large_gap_secs",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect the dotted key paths of a `toml::Value` tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3. Ties go to the
/// lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every key in `raw_toml` that `EngineConfig` does not know.
///
/// Parse errors yield no warnings here; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Values that validate but look like mistakes.
pub fn validate_ranges(config: &EngineConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut suspicious = |field: &str, message: String| {
        warnings.push(ValidationWarning {
            field: field.to_string(),
            message,
            suggestion: None,
        });
    };

    // A plateau band wider than the setpoint band inverts their meaning
    if config.stable_plateau.tolerance > config.setpoint_hit.tolerance {
        suspicious(
            "stable_plateau.tolerance",
            format!(
                "stable_plateau.tolerance ({:.1}) is wider than setpoint_hit.tolerance ({:.1})",
                config.stable_plateau.tolerance, config.setpoint_hit.tolerance
            ),
        );
    }

    if config.anomaly.window_secs > 60.0 {
        suspicious(
            "anomaly.window_secs",
            format!(
                "anomaly.window_secs = {:.1} is outside typical range (0-60 s)",
                config.anomaly.window_secs
            ),
        );
    }

    if config.anomaly.relative_threshold < 0.02 {
        suspicious(
            "anomaly.relative_threshold",
            format!(
                "anomaly.relative_threshold = {:.3} will flag ordinary sensor noise",
                config.anomaly.relative_threshold
            ),
        );
    }

    if config.band_entry.min_duration_secs > config.setpoint_hit.min_duration_secs {
        suspicious(
            "band_entry.min_duration_secs",
            format!(
                "band_entry.min_duration_secs ({:.1}) exceeds setpoint_hit.min_duration_secs ({:.1})",
                config.band_entry.min_duration_secs, config.setpoint_hit.min_duration_secs
            ),
        );
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("window", "window"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("tolerence", "tolerance"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [anomaly]
            window_secs = 5.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"anomaly".to_string()));
        assert!(keys.contains(&"anomaly.window_secs".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[setpoint_hit]
tolerence = 35.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("tolerence"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("setpoint_hit.tolerance")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[band_entry]
target_fraction = 0.05
min_tolerance = 50.0

[anomaly]
relative_threshold = 0.2
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_known_keys_cover_serialized_defaults() {
        let config = EngineConfig::default();
        let value: toml::Value = config.to_toml().unwrap().parse().unwrap();
        let known = known_config_keys();
        for key in walk_toml_keys(&value, "") {
            assert!(known.contains(key.as_str()), "key '{key}' missing from known_config_keys");
        }
    }

    #[test]
    fn test_defaults_are_not_suspicious() {
        let warnings = validate_ranges(&EngineConfig::default());
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {:?}", warnings);
    }

    #[test]
    fn test_inverted_bands_are_suspicious() {
        let mut config = EngineConfig::default();
        config.stable_plateau.tolerance = 50.0;
        let warnings = validate_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "stable_plateau.tolerance"));
    }
}

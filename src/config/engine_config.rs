//! Engine Configuration - every calculator constant as an operator-tunable TOML value
//!
//! Each struct implements `Default` with the documented algorithm constants
//! from `defaults.rs`, so a run without a config file is unchanged.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::*;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the metric engine.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$POWERSTEP_CONFIG` env var
/// 2. `./powerstep.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub start_power: StartPowerConfig,

    #[serde(default)]
    pub target_power: TargetPowerConfig,

    #[serde(default)]
    pub step: StepConfig,

    #[serde(default)]
    pub band_entry: BandEntryConfig,

    #[serde(default)]
    pub setpoint_hit: SetpointHitConfig,

    #[serde(default)]
    pub stable_plateau: StablePlateauConfig,

    #[serde(default)]
    pub anomaly: AnomalyConfig,

    #[serde(default)]
    pub transient: TransientConfig,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    #[serde(default)]
    pub data_quality: DataQualityConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$POWERSTEP_CONFIG` environment variable
    /// 2. `./powerstep.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {CONFIG_ENV_VAR}, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every tunable.
    ///
    /// Rules:
    /// - All values must be finite
    /// - Tolerances, durations and windows must be positive
    /// - Fractions must lie in (0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_positive(
            self.start_power.last_value_note_threshold,
            "start_power.last_value_note_threshold",
            &mut errors,
        );
        Self::check_positive(
            self.target_power.max_plausible,
            "target_power.max_plausible",
            &mut errors,
        );
        Self::check_positive(self.step.minimal_threshold, "step.minimal_threshold", &mut errors);

        let b = &self.band_entry;
        Self::check_fraction(b.target_fraction, "band_entry.target_fraction", &mut errors);
        Self::check_fraction(b.step_fraction, "band_entry.step_fraction", &mut errors);
        Self::check_positive(b.min_duration_secs, "band_entry.min_duration_secs", &mut errors);
        if !b.min_tolerance.is_finite() || b.min_tolerance < 0.0 {
            errors.push(format!(
                "band_entry.min_tolerance must be >= 0 (got {})",
                b.min_tolerance
            ));
        }
        if !b.initial_window_secs.is_finite() || b.initial_window_secs < 0.0 {
            errors.push(format!(
                "band_entry.initial_window_secs must be >= 0 (got {})",
                b.initial_window_secs
            ));
        }

        Self::check_positive(self.setpoint_hit.tolerance, "setpoint_hit.tolerance", &mut errors);
        Self::check_positive(
            self.setpoint_hit.min_duration_secs,
            "setpoint_hit.min_duration_secs",
            &mut errors,
        );
        Self::check_positive(
            self.stable_plateau.tolerance,
            "stable_plateau.tolerance",
            &mut errors,
        );
        Self::check_positive(
            self.stable_plateau.min_duration_secs,
            "stable_plateau.min_duration_secs",
            &mut errors,
        );

        Self::check_fraction(
            self.anomaly.relative_threshold,
            "anomaly.relative_threshold",
            &mut errors,
        );
        Self::check_positive(self.anomaly.window_secs, "anomaly.window_secs", &mut errors);

        Self::check_positive(
            self.transient.threshold_floor,
            "transient.threshold_floor",
            &mut errors,
        );
        Self::check_fraction(
            self.transient.threshold_fraction,
            "transient.threshold_fraction",
            &mut errors,
        );

        let c = &self.consistency;
        Self::check_positive(
            c.delta_mismatch_tolerance,
            "consistency.delta_mismatch_tolerance",
            &mut errors,
        );
        Self::check_positive(
            c.start_target_discrepancy,
            "consistency.start_target_discrepancy",
            &mut errors,
        );
        Self::check_positive(c.small_change, "consistency.small_change", &mut errors);
        Self::check_positive(c.minimal_large_delta, "consistency.minimal_large_delta", &mut errors);

        Self::check_positive(
            self.data_quality.large_gap_secs,
            "data_quality.large_gap_secs",
            &mut errors,
        );

        let range_warnings = super::validation::validate_ranges(self);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so test finiteness first
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        } else if value <= 0.0 {
            errors.push(format!("{name} must be > 0 (got {value})"));
        }
    }

    fn check_fraction(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            errors.push(format!("{name} must be in (0, 1] (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Baseline Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPowerConfig {
    /// Note the last pre-action reading when it differs from the median by more than this (W)
    #[serde(default = "default_last_value_note_threshold")]
    pub last_value_note_threshold: f64,
}

fn default_last_value_note_threshold() -> f64 {
    LAST_VALUE_NOTE_THRESHOLD_W
}

impl Default for StartPowerConfig {
    fn default() -> Self {
        Self {
            last_value_note_threshold: default_last_value_note_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPowerConfig {
    /// Commanded values above this are implausible (W)
    #[serde(default = "default_max_plausible")]
    pub max_plausible: f64,
}

fn default_max_plausible() -> f64 {
    MAX_PLAUSIBLE_TARGET_W
}

impl Default for TargetPowerConfig {
    fn default() -> Self {
        Self {
            max_plausible: default_max_plausible(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// |delta| at or below this classifies as MINIMAL (W)
    #[serde(default = "default_minimal_threshold")]
    pub minimal_threshold: f64,
}

fn default_minimal_threshold() -> f64 {
    STEP_MINIMAL_THRESHOLD_W
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            minimal_threshold: default_minimal_threshold(),
        }
    }
}

// ============================================================================
// Segment Scanner Sections
// ============================================================================

/// Adaptive band used for band entry.
///
/// `tolerance = max(min(target_fraction * target, step_fraction * |target - start|),
/// min_tolerance)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEntryConfig {
    #[serde(default = "default_target_fraction")]
    pub target_fraction: f64,

    #[serde(default = "default_step_fraction")]
    pub step_fraction: f64,

    #[serde(default = "default_min_tolerance")]
    pub min_tolerance: f64,

    #[serde(default = "default_band_min_duration")]
    pub min_duration_secs: f64,

    #[serde(default = "default_initial_window")]
    pub initial_window_secs: f64,
}

fn default_target_fraction() -> f64 {
    BAND_ENTRY_TARGET_FRACTION
}
fn default_step_fraction() -> f64 {
    BAND_ENTRY_STEP_FRACTION
}
fn default_min_tolerance() -> f64 {
    BAND_ENTRY_MIN_TOLERANCE_W
}
fn default_band_min_duration() -> f64 {
    BAND_ENTRY_MIN_DURATION_SECS
}
fn default_initial_window() -> f64 {
    BAND_ENTRY_INITIAL_WINDOW_SECS
}

impl Default for BandEntryConfig {
    fn default() -> Self {
        Self {
            target_fraction: default_target_fraction(),
            step_fraction: default_step_fraction(),
            min_tolerance: default_min_tolerance(),
            min_duration_secs: default_band_min_duration(),
            initial_window_secs: default_initial_window(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointHitConfig {
    /// Band half-width around the target (W)
    #[serde(default = "default_setpoint_tolerance")]
    pub tolerance: f64,

    /// Dwell for a hit to count as sustained (s)
    #[serde(default = "default_setpoint_min_duration")]
    pub min_duration_secs: f64,
}

fn default_setpoint_tolerance() -> f64 {
    SETPOINT_TOLERANCE_W
}
fn default_setpoint_min_duration() -> f64 {
    SETPOINT_MIN_DURATION_SECS
}

impl Default for SetpointHitConfig {
    fn default() -> Self {
        Self {
            tolerance: default_setpoint_tolerance(),
            min_duration_secs: default_setpoint_min_duration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StablePlateauConfig {
    /// Band half-width around the target (W)
    #[serde(default = "default_plateau_tolerance")]
    pub tolerance: f64,

    /// Dwell for a plateau (s)
    #[serde(default = "default_plateau_min_duration")]
    pub min_duration_secs: f64,
}

fn default_plateau_tolerance() -> f64 {
    PLATEAU_TOLERANCE_W
}
fn default_plateau_min_duration() -> f64 {
    PLATEAU_MIN_DURATION_SECS
}

impl Default for StablePlateauConfig {
    fn default() -> Self {
        Self {
            tolerance: default_plateau_tolerance(),
            min_duration_secs: default_plateau_min_duration(),
        }
    }
}

// ============================================================================
// Window Anomaly / Transient Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Relative change that counts as sharp (0.15 = 15%)
    #[serde(default = "default_relative_threshold")]
    pub relative_threshold: f64,

    /// Look-ahead window (s)
    #[serde(default = "default_window_secs")]
    pub window_secs: f64,
}

fn default_relative_threshold() -> f64 {
    ANOMALY_RELATIVE_THRESHOLD
}
fn default_window_secs() -> f64 {
    ANOMALY_WINDOW_SECS
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            relative_threshold: default_relative_threshold(),
            window_secs: default_window_secs(),
        }
    }
}

/// `threshold = max(threshold_floor, threshold_fraction * target)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransientConfig {
    #[serde(default = "default_threshold_floor")]
    pub threshold_floor: f64,

    #[serde(default = "default_threshold_fraction")]
    pub threshold_fraction: f64,
}

fn default_threshold_floor() -> f64 {
    TRANSIENT_THRESHOLD_FLOOR_W
}
fn default_threshold_fraction() -> f64 {
    TRANSIENT_THRESHOLD_FRACTION
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            threshold_floor: default_threshold_floor(),
            threshold_fraction: default_threshold_fraction(),
        }
    }
}

// ============================================================================
// Consistency / Data Quality Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    #[serde(default = "default_delta_mismatch_tolerance")]
    pub delta_mismatch_tolerance: f64,

    #[serde(default = "default_start_target_discrepancy")]
    pub start_target_discrepancy: f64,

    #[serde(default = "default_small_change")]
    pub small_change: f64,

    #[serde(default = "default_minimal_large_delta")]
    pub minimal_large_delta: f64,
}

fn default_delta_mismatch_tolerance() -> f64 {
    DELTA_MISMATCH_TOLERANCE_W
}
fn default_start_target_discrepancy() -> f64 {
    START_TARGET_DISCREPANCY_W
}
fn default_small_change() -> f64 {
    SMALL_CHANGE_W
}
fn default_minimal_large_delta() -> f64 {
    MINIMAL_LARGE_DELTA_W
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            delta_mismatch_tolerance: default_delta_mismatch_tolerance(),
            start_target_discrepancy: default_start_target_discrepancy(),
            small_change: default_small_change(),
            minimal_large_delta: default_minimal_large_delta(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityConfig {
    /// Report sample gaps longer than this (s)
    #[serde(default = "default_large_gap_secs")]
    pub large_gap_secs: f64,
}

fn default_large_gap_secs() -> f64 {
    LARGE_GAP_SECS
}

impl Default for DataQualityConfig {
    fn default() -> Self {
        Self {
            large_gap_secs: default_large_gap_secs(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: EngineConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.band_entry.min_duration_secs, 15.0);
        assert_eq!(config.setpoint_hit.tolerance, 30.0);
        assert_eq!(config.setpoint_hit.min_duration_secs, 25.0);
        assert_eq!(config.stable_plateau.tolerance, 20.0);
        assert_eq!(config.stable_plateau.min_duration_secs, 30.0);
        assert_eq!(config.anomaly.relative_threshold, 0.15);
        assert_eq!(config.transient.threshold_floor, 200.0);
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_empty_section_keeps_section_defaults() {
        let parsed: EngineConfig = toml::from_str("[stable_plateau]\n").expect("should parse");
        assert_eq!(parsed.stable_plateau.tolerance, 20.0);
        assert_eq!(parsed.stable_plateau.min_duration_secs, 30.0);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[setpoint_hit]
tolerance = 40.0

[anomaly]
window_secs = 10.0
"#;
        let config: EngineConfig = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.setpoint_hit.tolerance, 40.0);
        assert_eq!(config.setpoint_hit.min_duration_secs, 25.0);
        assert_eq!(config.anomaly.window_secs, 10.0);
        assert_eq!(config.anomaly.relative_threshold, 0.15);
    }

    #[test]
    fn test_validation_rejects_zero_tolerance() {
        let mut config = EngineConfig::default();
        config.setpoint_hit.tolerance = 0.0;
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("setpoint_hit.tolerance")));
        }
    }

    #[test]
    fn test_validation_rejects_fraction_above_one() {
        let mut config = EngineConfig::default();
        config.anomaly.relative_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_nan() {
        let mut config = EngineConfig::default();
        config.band_entry.min_duration_secs = f64::NAN;
        assert!(config.validate().is_err(), "NaN must not pass validation");
    }

    #[test]
    fn test_roundtrip_toml() {
        let original = EngineConfig::default();
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: EngineConfig =
            toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_all_sections_serialize() {
        let toml_str = EngineConfig::default().to_toml().expect("serialization should work");
        for section in [
            "[start_power]",
            "[target_power]",
            "[step]",
            "[band_entry]",
            "[setpoint_hit]",
            "[stable_plateau]",
            "[anomaly]",
            "[transient]",
            "[consistency]",
            "[data_quality]",
        ] {
            assert!(toml_str.contains(section), "Missing {section} section");
        }
    }
}

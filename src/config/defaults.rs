//! Engine default constants.
//!
//! Every tunable in `EngineConfig` defaults to one of these values, so a run
//! without a config file behaves exactly as the documented algorithms.
//! Grouped by calculator for easy discovery.

// ============================================================================
// Baseline
// ============================================================================

/// Start power: flag the last pre-action reading when it differs from the
/// median by more than this (W).
pub const LAST_VALUE_NOTE_THRESHOLD_W: f64 = 50.0;

/// Target power: commanded values above this are flagged as implausible (W).
pub const MAX_PLAUSIBLE_TARGET_W: f64 = 10_000.0;

/// Step classifier: |delta| at or below this is a MINIMAL step (W).
///
/// Absolute, not a percentage of the target.
pub const STEP_MINIMAL_THRESHOLD_W: f64 = 50.0;

// ============================================================================
// Segment Scanners
// ============================================================================

/// Band entry tolerance as a fraction of the target.
pub const BAND_ENTRY_TARGET_FRACTION: f64 = 0.05;

/// Band entry tolerance as a fraction of |target - start median|.
pub const BAND_ENTRY_STEP_FRACTION: f64 = 0.5;

/// Floor applied to the adaptive band entry tolerance (W). Zero disables it.
pub const BAND_ENTRY_MIN_TOLERANCE_W: f64 = 0.0;

/// Dwell time for a band entry to count as sustained (s).
pub const BAND_ENTRY_MIN_DURATION_SECS: f64 = 15.0;

/// A first segment starting within this many seconds of the action counts
/// as "at the start" (s).
pub const BAND_ENTRY_INITIAL_WINDOW_SECS: f64 = 1.0;

/// Setpoint hit band half-width (W).
pub const SETPOINT_TOLERANCE_W: f64 = 30.0;

/// Dwell time for a setpoint hit to count as sustained (s).
pub const SETPOINT_MIN_DURATION_SECS: f64 = 25.0;

/// Stable plateau band half-width (W).
pub const PLATEAU_TOLERANCE_W: f64 = 20.0;

/// Dwell time for a plateau (s).
pub const PLATEAU_MIN_DURATION_SECS: f64 = 30.0;

// ============================================================================
// Window Anomaly Scanner
// ============================================================================

/// Relative change within the window that counts as a sharp drop / rise.
pub const ANOMALY_RELATIVE_THRESHOLD: f64 = 0.15;

/// Look-ahead window for sharp drops / rises (s).
pub const ANOMALY_WINDOW_SECS: f64 = 5.0;

// ============================================================================
// Transient Detector
// ============================================================================

/// Minimum overshoot / undershoot threshold (W).
pub const TRANSIENT_THRESHOLD_FLOOR_W: f64 = 200.0;

/// Overshoot / undershoot threshold as a fraction of the target.
pub const TRANSIENT_THRESHOLD_FRACTION: f64 = 0.04;

// ============================================================================
// Consistency Checks
// ============================================================================

/// Allowed gap between `target.change` and the step delta before warning (W).
pub const DELTA_MISMATCH_TOLERANCE_W: f64 = 1.0;

/// Start median vs commanded-before discrepancy that triggers a warning (W).
pub const START_TARGET_DISCREPANCY_W: f64 = 100.0;

/// Commanded changes smaller than this are flagged as small (W).
pub const SMALL_CHANGE_W: f64 = 50.0;

/// A MINIMAL classification with |delta| above this is suspicious (W).
pub const MINIMAL_LARGE_DELTA_W: f64 = 100.0;

// ============================================================================
// Data Quality
// ============================================================================

/// Sample-to-sample gaps longer than this are reported (s).
pub const LARGE_GAP_SECS: f64 = 10.0;

// ============================================================================
// Config File Discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "POWERSTEP_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "powerstep.toml";

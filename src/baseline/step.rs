//! Step classifier.

use tracing::debug;

use crate::config::StepConfig;
use crate::types::{StartPowerResult, StepDirection, StepDirectionResult, TargetPowerResult};

/// Classify the transition from the measured start level to the new target.
///
/// `delta = target.after - start.median`, measured against what the device
/// was actually drawing rather than the previous command. The threshold is
/// an absolute wattage.
pub fn classify_step(
    start: &StartPowerResult,
    target: &TargetPowerResult,
    config: &StepConfig,
    warnings: &mut Vec<String>,
) -> StepDirectionResult {
    let delta = target.after - start.median;
    let direction = if delta > config.minimal_threshold {
        StepDirection::Up
    } else if delta < -config.minimal_threshold {
        StepDirection::Down
    } else {
        warnings.push(format!(
            "Minimal power change ({delta:+.0}W): test may not be meaningful"
        ));
        StepDirection::Minimal
    };

    debug!(%direction, delta, "Step classified");

    StepDirectionResult {
        direction,
        delta,
        start_median: start.median,
        target_after: target.after,
    }
}

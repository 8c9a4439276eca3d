//! Post-action detectors
//!
//! Each detector reads only the post-action partition plus the baseline
//! values it depends on, and never fails: degenerate input produces an
//! explicit "nothing found" result rather than an error.
//!
//! - `band_entry`: adaptive band, first sustained entry (segment scanner)
//! - `setpoint_hit`: ±30 W band, brief vs sustained visits (segment scanner)
//! - `stable_plateau`: ±20 W band, long dwells (segment scanner)
//! - `sharp_changes`: sharp drops and rises (window scanner)
//! - `transient`: overshoot / undershoot past `target ± threshold`

pub mod band_entry;
pub mod setpoint_hit;
pub mod sharp_changes;
pub mod stable_plateau;
pub mod transient;

pub use band_entry::detect_band_entry;
pub use setpoint_hit::detect_setpoint_hit;
pub use sharp_changes::{detect_sharp_drops, detect_sharp_rises};
pub use stable_plateau::detect_stable_plateau;
pub use transient::detect_overshoot_undershoot;

//! Shared scanning cores
//!
//! Two parameterized algorithms back seven of the ten metrics:
//!
//! - `SegmentScanner` (band + minimum dwell): band entry, setpoint hit,
//!   stable plateau
//! - `WindowScanner` (direction + relative threshold + look-ahead window):
//!   sharp drops, sharp rises
//!
//! Both operate on the post-action partition only and treat missing
//! readings explicitly rather than through float comparison semantics.

mod segment;
mod window;

pub use segment::SegmentScanner;
pub use window::WindowScanner;

//! Shared data structures for the step-test metric engine
//!
//! - `series`: Sample / Series input contract
//! - `events`: BandWindow, Segment, AnomalyEvent scanner primitives
//! - `metrics`: per-metric result records and the `MetricResult` union
//! - `quality`: data-quality metadata from preprocessing
//! - `outcome`: MetricError, statuses, run phases, OrchestrationResult

mod series;
mod events;
mod metrics;
mod quality;
mod outcome;

pub use series::*;
pub use events::*;
pub use metrics::*;
pub use quality::*;
pub use outcome::*;

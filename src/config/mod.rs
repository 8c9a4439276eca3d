//! Engine Configuration Module
//!
//! Every calculator constant (tolerances, dwell times, anomaly thresholds)
//! loaded from TOML, defaulting to the documented algorithm values.
//!
//! ## Loading Order
//!
//! 1. `POWERSTEP_CONFIG` environment variable (path to TOML file)
//! 2. `powerstep.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(EngineConfig::load());
//!
//! // Anywhere in the codebase:
//! let window = config::get().anomaly.window_secs;
//! ```

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;

use std::sync::OnceLock;

/// Global engine configuration, initialized once at startup.
static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Fallback used when `init()` was never called (library callers, tests).
static DEFAULT_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Initialize the global engine configuration.
///
/// Only the first call takes effect.
pub fn init(config: EngineConfig) {
    if ENGINE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The global engine configuration, or built-in defaults if `init()` has
/// not been called.
pub fn get() -> &'static EngineConfig {
    ENGINE_CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT_CONFIG.get_or_init(EngineConfig::default))
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    ENGINE_CONFIG.get().is_some()
}

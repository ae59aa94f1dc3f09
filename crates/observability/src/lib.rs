//! Tracing/logging setup shared by hosts of the shared kernel.
//!
//! Library crates only emit `tracing` events; the host process decides where
//! they go by calling [`init`] once at startup.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogConfig, LogConfigError, LogFormat};

/// Initialize process-wide tracing from `config`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(config: &LogConfig) {
    self::tracing::init(config);
}

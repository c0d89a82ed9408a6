//! Tracing/logging setup shared by LedgerDesk processes.

/// Initialize process-wide logging with the format chosen by the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Initialize process-wide logging with an explicit format.
pub fn init_with(format: tracing::LogFormat) {
    tracing::init(format);
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use tracing::LogFormat;

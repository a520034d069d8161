//! Process-wide structured logging for the parcel services.

pub mod logging;

pub use logging::{LogConfig, LogFormat};

/// Initialize logging from the environment.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    logging::init(&LogConfig::from_env());
}

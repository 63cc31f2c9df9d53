//! Logging setup for DSync.
//!
//! Components log through the `tracing` macros; this module only installs
//! a subscriber. Callers that embed the crate may install their own instead.
//!
//! # Example
//!
//! ```no_run
//! use dsync_core::config::Settings;
//! use dsync_core::logging::init_tracing_from;
//!
//! let settings = Settings::default();
//! init_tracing_from(&settings.logging);
//! tracing::info!("run started");
//! ```

mod types;

pub use types::LogLevel;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Install a stderr subscriber at `default_level`.
///
/// `RUST_LOG` wins over `default_level` when set. Returns false when a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_tracing(default_level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()
        .is_ok()
}

/// Install a subscriber using the `[logging]` section's level.
pub fn init_tracing_from(settings: &LoggingSettings) -> bool {
    init_tracing(settings.level)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

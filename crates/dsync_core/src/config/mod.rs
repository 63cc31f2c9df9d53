//! Configuration management for DSync.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use dsync_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/dsync.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Target: {}s", config.settings().duration.target_secs);
//!
//! config.settings_mut().feedback.gates_enabled = false;
//! config.update_section(ConfigSection::Feedback).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, ConfigSection, DurationSettings, FeedbackSettings, LoggingSettings,
    PathSettings, Settings, SubtitleSettings,
};

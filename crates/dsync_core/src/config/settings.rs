//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//! A `Settings` value is handed to each component's constructor; nothing reads
//! configuration from global state.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::subtitles::RoundingMode;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Target duration and tolerance policy.
    #[serde(default)]
    pub duration: DurationSettings,

    /// Canonical audio format and external tool settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Caption timing and layout.
    #[serde(default)]
    pub subtitles: SubtitleSettings,

    /// Checkpoint gates and adjustment hints.
    #[serde(default)]
    pub feedback: FeedbackSettings,
}

/// Identifies a section of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Duration,
    Audio,
    Subtitles,
    Feedback,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Duration,
        ConfigSection::Audio,
        ConfigSection::Subtitles,
        ConfigSection::Feedback,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Duration => "duration",
            ConfigSection::Audio => "audio",
            ConfigSection::Subtitles => "subtitles",
            ConfigSection::Feedback => "feedback",
        }
    }

    /// Comment written above the section when the file is generated.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Working directories",
            ConfigSection::Logging => "# Logging configuration",
            ConfigSection::Duration => "# Target duration and tolerance band",
            ConfigSection::Audio => "# Canonical audio format and media tool",
            ConfigSection::Subtitles => "# Caption timing and layout",
            ConfigSection::Feedback => "# Quality gates and adjustment hints",
        }
    }
}

/// Path configuration for temp artifacts and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder for per-run temporary artifacts.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for audit logs.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Log every external tool command line at debug level.
    #[serde(default = "default_true")]
    pub log_commands: bool,

    /// Write checkpoint and report audit logs when a run finishes.
    #[serde(default)]
    pub write_audit_logs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_commands: true,
            write_audit_logs: false,
        }
    }
}

/// Duration authority settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSettings {
    /// Target duration in seconds.
    #[serde(default = "default_target_secs")]
    pub target_secs: f64,

    /// Symmetric tolerance as a fraction of the target (0 < p < 1).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Maximum allowed |audio - subtitles| in seconds.
    #[serde(default = "default_sync_threshold_secs")]
    pub sync_threshold_secs: f64,

    /// Narration speed used for word budgets and script estimates.
    #[serde(default = "default_words_per_second")]
    pub words_per_second: f64,

    /// Fraction of the word budget handed out (leaves room for pauses).
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,

    /// Shortest useful narration segment in seconds.
    #[serde(default = "default_min_segment_secs")]
    pub min_segment_secs: f64,

    /// Longest single visual clip in seconds.
    #[serde(default = "default_max_segment_secs")]
    pub max_segment_secs: f64,
}

fn default_target_secs() -> f64 {
    30.0
}

fn default_tolerance() -> f64 {
    0.05
}

fn default_sync_threshold_secs() -> f64 {
    0.5
}

fn default_words_per_second() -> f64 {
    2.5
}

fn default_safety_factor() -> f64 {
    0.9
}

fn default_min_segment_secs() -> f64 {
    3.0
}

fn default_max_segment_secs() -> f64 {
    10.0
}

impl Default for DurationSettings {
    fn default() -> Self {
        Self {
            target_secs: default_target_secs(),
            tolerance: default_tolerance(),
            sync_threshold_secs: default_sync_threshold_secs(),
            words_per_second: default_words_per_second(),
            safety_factor: default_safety_factor(),
            min_segment_secs: default_min_segment_secs(),
            max_segment_secs: default_max_segment_secs(),
        }
    }
}

/// Audio processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Canonical sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Canonical channel count.
    #[serde(default = "default_channels")]
    pub channels: u8,

    /// Canonical encoder passed to ffmpeg (`-c:a`).
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Canonical bitrate passed to ffmpeg (`-b:a`).
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// File extension of normalized artifacts.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Silence between consecutive narration segments, in seconds.
    #[serde(default = "default_segment_padding_secs")]
    pub segment_padding_secs: f64,

    /// Allowed difference between concatenated output and the input sum.
    #[serde(default = "default_concat_epsilon_secs")]
    pub concat_epsilon_secs: f64,

    /// Wall-clock limit for each external tool invocation.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Path to ffmpeg (empty = find in PATH).
    #[serde(default)]
    pub ffmpeg_path: String,

    /// Path to ffprobe (empty = find in PATH).
    #[serde(default)]
    pub ffprobe_path: String,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u8 {
    2
}

fn default_codec() -> String {
    "libmp3lame".to_string()
}

fn default_bitrate() -> String {
    "192k".to_string()
}

fn default_extension() -> String {
    "mp3".to_string()
}

fn default_segment_padding_secs() -> f64 {
    0.3
}

fn default_concat_epsilon_secs() -> f64 {
    0.05
}

fn default_tool_timeout_secs() -> u64 {
    300
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            codec: default_codec(),
            bitrate: default_bitrate(),
            extension: default_extension(),
            segment_padding_secs: default_segment_padding_secs(),
            concat_epsilon_secs: default_concat_epsilon_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            ffmpeg_path: String::new(),
            ffprobe_path: String::new(),
        }
    }
}

/// Caption settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSettings {
    /// Longest single caption before an audio segment is split.
    #[serde(default = "default_max_subtitle_secs")]
    pub max_subtitle_secs: f64,

    /// Wrap width in characters.
    #[serde(default = "default_max_chars_per_line")]
    pub max_chars_per_line: usize,

    /// Lines per caption; words past this are dropped.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// How float seconds become integer milliseconds on write.
    #[serde(default)]
    pub rounding: RoundingMode,
}

fn default_max_subtitle_secs() -> f64 {
    5.0
}

fn default_max_chars_per_line() -> usize {
    42
}

fn default_max_lines() -> usize {
    2
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            max_subtitle_secs: default_max_subtitle_secs(),
            max_chars_per_line: default_max_chars_per_line(),
            max_lines: default_max_lines(),
            rounding: RoundingMode::default(),
        }
    }
}

/// Feedback system settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    /// Whether critical-stage failures block the pipeline.
    #[serde(default = "default_true")]
    pub gates_enabled: bool,

    /// Stages whose out-of-tolerance results block progression.
    ///
    /// This is the one canonical list; nothing else decides criticality.
    #[serde(default = "default_critical_stages")]
    pub critical_stages: Vec<String>,

    /// Quality score below which a critical failure requires regeneration.
    #[serde(default = "default_regenerate_threshold")]
    pub regenerate_threshold: f64,

    /// Number of recent checkpoints inspected for adjustments.
    #[serde(default = "default_adjustment_window")]
    pub adjustment_window: usize,

    /// Speech-rate change suggested per recommendation.
    #[serde(default = "default_speech_rate_step")]
    pub speech_rate_step: f64,
}

fn default_critical_stages() -> Vec<String> {
    vec![
        "audio_generation".to_string(),
        "video_generation".to_string(),
        "final_assembly".to_string(),
    ]
}

fn default_regenerate_threshold() -> f64 {
    0.6
}

fn default_adjustment_window() -> usize {
    3
}

fn default_speech_rate_step() -> f64 {
    0.1
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            gates_enabled: true,
            critical_stages: default_critical_stages(),
            regenerate_threshold: default_regenerate_threshold(),
            adjustment_window: default_adjustment_window(),
            speech_rate_step: default_speech_rate_step(),
        }
    }
}

impl FeedbackSettings {
    /// Whether `stage` is in the critical set.
    pub fn is_critical(&self, stage: &str) -> bool {
        self.critical_stages.iter().any(|s| s == stage)
    }
}

//! The per-run duration authority.
//!
//! Holds the target and tolerance band, an append-only log of duration
//! reports and the policy that turns those reports into one recommended
//! final duration. The latest-value view is always derived from the log.
//!
//! The authority does not enforce stage ordering. Registering audio without
//! ever registering a script still yields a recommendation; callers that
//! care should check `registered_kinds()`.

use std::fs;
use std::path::Path;

use chrono::Utc;

use super::error::{DurationError, DurationResult};
use super::types::{
    latest_durations, ComponentDurationMap, DurationReport, GenerationConstraints, Metadata,
    ValidationIssue, ValidationReport,
};
use crate::config::DurationSettings;
use crate::models::{ComponentKind, ToleranceBand};

/// Aggregates duration reports for one generation run.
#[derive(Debug, Clone)]
pub struct DurationAuthority {
    band: ToleranceBand,
    settings: DurationSettings,
    log: Vec<DurationReport>,
}

impl DurationAuthority {
    /// Create an authority from duration settings.
    pub fn new(settings: &DurationSettings) -> DurationResult<Self> {
        let band = ToleranceBand::new(settings.target_secs, settings.tolerance)?;

        let positive = [
            ("words_per_second", settings.words_per_second),
            ("min_segment_secs", settings.min_segment_secs),
            ("max_segment_secs", settings.max_segment_secs),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DurationError::invalid_setting(name, value));
            }
        }
        if !(settings.safety_factor > 0.0 && settings.safety_factor <= 1.0) {
            return Err(DurationError::invalid_setting(
                "safety_factor",
                settings.safety_factor,
            ));
        }
        if !settings.sync_threshold_secs.is_finite() || settings.sync_threshold_secs < 0.0 {
            return Err(DurationError::invalid_setting(
                "sync_threshold_secs",
                settings.sync_threshold_secs,
            ));
        }

        tracing::debug!("Duration authority created: {}", band);

        Ok(Self {
            band,
            settings: settings.clone(),
            log: Vec::new(),
        })
    }

    /// Create an authority for `target` seconds with default constraint settings.
    pub fn with_target(target_secs: f64, tolerance: f64) -> DurationResult<Self> {
        Self::new(&DurationSettings {
            target_secs,
            tolerance,
            ..DurationSettings::default()
        })
    }

    pub fn band(&self) -> &ToleranceBand {
        &self.band
    }

    pub fn target(&self) -> f64 {
        self.band.target()
    }

    pub fn settings(&self) -> &DurationSettings {
        &self.settings
    }

    /// Advisory bounds for producers, computed before any content exists.
    ///
    /// Producers may still overshoot; these are not enforced anywhere.
    pub fn generation_constraints(&self) -> GenerationConstraints {
        let target = self.band.target();
        let s = &self.settings;

        GenerationConstraints {
            target_secs: target,
            min_secs: self.band.min(),
            max_secs: self.band.max(),
            max_words: (target * s.words_per_second * s.safety_factor).floor() as usize,
            max_segments: (target / s.min_segment_secs).floor() as usize,
            max_clips: (target / s.max_segment_secs).floor() as usize + 1,
        }
    }

    /// Append a report and return whether `duration` is within the band.
    ///
    /// Out-of-band values are logged and recorded; they never raise.
    pub fn register(
        &mut self,
        kind: ComponentKind,
        duration: f64,
        confidence: f64,
        metadata: Metadata,
    ) -> bool {
        let within = self.band.contains(duration);
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        if within {
            tracing::info!(
                "Registered {} duration {:.2}s (confidence {:.2}) within {}",
                kind,
                duration,
                confidence,
                self.band
            );
        } else {
            tracing::warn!(
                "Registered {} duration {:.2}s is outside {} ({:+.1}%)",
                kind,
                duration,
                self.band,
                self.band.deviation_pct(duration)
            );
        }

        self.log.push(DurationReport {
            kind,
            target: self.band.target(),
            duration,
            confidence,
            metadata,
            timestamp: Utc::now(),
        });

        within
    }

    /// Register a probed duration (confidence 1.0, no metadata).
    pub fn register_measured(&mut self, kind: ComponentKind, duration: f64) -> bool {
        self.register(kind, duration, 1.0, Metadata::new())
    }

    /// The full report log, oldest first.
    pub fn reports(&self) -> &[DurationReport] {
        &self.log
    }

    /// Latest duration per component kind.
    pub fn component_durations(&self) -> ComponentDurationMap {
        latest_durations(&self.log)
    }

    /// Most recent report for `kind`.
    pub fn latest(&self, kind: ComponentKind) -> Option<&DurationReport> {
        self.log.iter().rev().find(|r| r.kind == kind)
    }

    /// Kinds with at least one report, in pipeline order.
    pub fn registered_kinds(&self) -> Vec<ComponentKind> {
        self.component_durations().into_keys().collect()
    }

    /// Whether the latest duration for `kind` is within the band.
    pub fn is_within_tolerance(&self, kind: ComponentKind) -> Option<bool> {
        self.latest(kind).map(|r| self.band.contains(r.duration))
    }

    /// The single duration the final composite should have.
    ///
    /// 1. In-band audio wins outright (measured ground truth).
    /// 2. Otherwise the longest in-band duration of any kind.
    /// 3. Otherwise the band's upper bound.
    pub fn final_duration_recommendation(&self) -> f64 {
        let durations = self.component_durations();

        if let Some(&audio) = durations.get(&ComponentKind::Audio) {
            if self.band.contains(audio) {
                return audio;
            }
        }

        durations
            .values()
            .copied()
            .filter(|d| self.band.contains(*d))
            .fold(None, |best: Option<f64>, d| {
                Some(best.map_or(d, |b| b.max(d)))
            })
            .unwrap_or_else(|| self.band.max())
    }

    /// Check every registered kind against the band and audio against subtitles.
    pub fn validate_final_result(&self) -> ValidationReport {
        let durations = self.component_durations();
        let mut issues = Vec::new();

        for (&kind, &duration) in &durations {
            if !self.band.contains(duration) {
                issues.push(ValidationIssue::OutOfTolerance {
                    kind,
                    duration,
                    min: self.band.min(),
                    max: self.band.max(),
                    deviation: self.band.classify(duration),
                });
            }
        }

        if let (Some(&audio), Some(&subtitles)) = (
            durations.get(&ComponentKind::Audio),
            durations.get(&ComponentKind::Subtitles),
        ) {
            let difference = (audio - subtitles).abs();
            if difference > self.settings.sync_threshold_secs {
                issues.push(ValidationIssue::SyncMismatch {
                    audio,
                    subtitles,
                    difference,
                    threshold: self.settings.sync_threshold_secs,
                });
            }
        }

        for issue in &issues {
            tracing::warn!("Final validation: {}", issue);
        }

        ValidationReport::from_issues(issues)
    }

    /// Serialize the report log as pretty JSON.
    pub fn export_log(&self) -> DurationResult<String> {
        Ok(serde_json::to_string_pretty(&self.log)?)
    }

    /// Write the report log to `path`.
    pub fn write_audit_log(&self, path: &Path) -> DurationResult<()> {
        let content = self.export_log()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DurationError::write(path, e))?;
        }
        fs::write(path, content).map_err(|e| DurationError::write(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn authority(target: f64, tolerance: f64) -> DurationAuthority {
        DurationAuthority::with_target(target, tolerance).unwrap()
    }

    #[test]
    fn rejects_invalid_target_and_tolerance() {
        assert!(matches!(
            DurationAuthority::with_target(0.0, 0.05),
            Err(DurationError::InvalidBand(_))
        ));
        assert!(matches!(
            DurationAuthority::with_target(30.0, 1.5),
            Err(DurationError::InvalidBand(_))
        ));
    }

    #[test]
    fn rejects_invalid_constraint_settings() {
        let settings = DurationSettings {
            min_segment_secs: 0.0,
            ..DurationSettings::default()
        };
        assert!(matches!(
            DurationAuthority::new(&settings),
            Err(DurationError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn register_reports_band_membership_in_any_order() {
        let durations = [28.4, 28.5, 30.0, 31.5, 31.6, 45.0, 10.0];
        let mut forward = authority(30.0, 0.05);
        let mut backward = authority(30.0, 0.05);

        let fwd: Vec<bool> = durations
            .iter()
            .map(|&d| forward.register(ComponentKind::Video, d, 0.8, Metadata::new()))
            .collect();
        let mut bwd: Vec<bool> = durations
            .iter()
            .rev()
            .map(|&d| backward.register(ComponentKind::Video, d, 0.8, Metadata::new()))
            .collect();
        bwd.reverse();

        assert_eq!(fwd, vec![false, true, true, true, false, false, false]);
        assert_eq!(fwd, bwd);
    }

    #[test]
    fn register_appends_and_overwrites_latest() {
        let mut auth = authority(30.0, 0.05);
        auth.register(ComponentKind::Script, 33.0, 0.6, Metadata::new());
        auth.register(ComponentKind::Script, 30.2, 0.6, Metadata::new());

        assert_eq!(auth.reports().len(), 2);
        assert_eq!(auth.component_durations()[&ComponentKind::Script], 30.2);
        assert_eq!(auth.is_within_tolerance(ComponentKind::Script), Some(true));
        assert_eq!(auth.is_within_tolerance(ComponentKind::Audio), None);
    }

    #[test]
    fn confidence_is_clamped() {
        let mut auth = authority(30.0, 0.05);
        auth.register(ComponentKind::Script, 30.0, 1.7, Metadata::new());
        auth.register(ComponentKind::Video, 30.0, -0.2, Metadata::new());
        assert_eq!(auth.reports()[0].confidence, 1.0);
        assert_eq!(auth.reports()[1].confidence, 0.0);
        assert!(auth.reports()[0].is_measured());
    }

    #[test]
    fn audio_in_band_outranks_everything() {
        let mut auth = authority(30.0, 0.05);
        auth.register_measured(ComponentKind::Audio, 29.0);
        auth.register(ComponentKind::Script, 33.0, 0.7, Metadata::new());

        assert_eq!(auth.final_duration_recommendation(), 29.0);

        // A longer in-band estimate still loses to audio
        auth.register(ComponentKind::Video, 31.0, 0.9, Metadata::new());
        assert_eq!(auth.final_duration_recommendation(), 29.0);
    }

    #[test]
    fn recommendation_prefers_longest_valid_without_audio() {
        let mut auth = authority(30.0, 0.05);
        auth.register(ComponentKind::Script, 29.0, 0.7, Metadata::new());
        auth.register(ComponentKind::Video, 31.0, 0.9, Metadata::new());
        auth.register(ComponentKind::Subtitles, 40.0, 1.0, Metadata::new());

        assert_eq!(auth.final_duration_recommendation(), 31.0);
    }

    #[test]
    fn recommendation_ignores_out_of_band_audio() {
        let mut auth = authority(30.0, 0.05);
        auth.register_measured(ComponentKind::Audio, 35.0);
        auth.register(ComponentKind::Script, 29.5, 0.7, Metadata::new());

        assert_eq!(auth.final_duration_recommendation(), 29.5);
    }

    #[test]
    fn recommendation_falls_back_to_ceiling() {
        let mut auth = authority(30.0, 0.05);
        assert!((auth.final_duration_recommendation() - 31.5).abs() < 1e-9);

        auth.register_measured(ComponentKind::Audio, 40.0);
        auth.register(ComponentKind::Script, 20.0, 0.5, Metadata::new());
        assert!((auth.final_duration_recommendation() - 31.5).abs() < 1e-9);
    }

    #[test]
    fn recommendation_uses_latest_report_after_retry() {
        let mut auth = authority(30.0, 0.05);
        auth.register_measured(ComponentKind::Audio, 35.0);
        auth.register_measured(ComponentKind::Audio, 30.4);
        assert_eq!(auth.final_duration_recommendation(), 30.4);
    }

    #[test]
    fn generation_constraints_follow_settings() {
        let auth = authority(30.0, 0.05);
        let c = auth.generation_constraints();

        // 30 * 2.5 * 0.9 = 67.5
        assert_eq!(c.max_words, 67);
        // 30 / 3
        assert_eq!(c.max_segments, 10);
        // 30 / 10 + 1
        assert_eq!(c.max_clips, 4);
        assert!((c.max_secs - 31.5).abs() < 1e-9);
    }

    #[test]
    fn validation_flags_out_of_band_entries() {
        let mut auth = authority(30.0, 0.05);
        auth.register_measured(ComponentKind::Audio, 30.0);
        auth.register(ComponentKind::Video, 36.0, 0.9, Metadata::new());

        let report = auth.validate_final_result();
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
        assert!(matches!(
            report.issues[0],
            ValidationIssue::OutOfTolerance {
                kind: ComponentKind::Video,
                ..
            }
        ));
        assert!(!report.has_sync_mismatch());
    }

    #[test]
    fn validation_reports_sync_mismatch_separately() {
        let mut auth = authority(30.0, 0.05);
        auth.register_measured(ComponentKind::Audio, 29.0);
        auth.register_measured(ComponentKind::Subtitles, 30.0);

        let report = auth.validate_final_result();
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
        assert!(report.has_sync_mismatch());
    }

    #[test]
    fn validation_passes_when_everything_agrees() {
        let mut auth = authority(30.0, 0.05);
        auth.register(ComponentKind::Script, 29.5, 0.7, Metadata::new());
        auth.register_measured(ComponentKind::Audio, 30.1);
        auth.register_measured(ComponentKind::Subtitles, 30.1);

        let report = auth.validate_final_result();
        assert!(report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn unordered_registration_still_recommends() {
        let mut auth = authority(30.0, 0.05);
        auth.register_measured(ComponentKind::Audio, 30.0);

        assert_eq!(auth.final_duration_recommendation(), 30.0);
        assert_eq!(auth.registered_kinds(), vec![ComponentKind::Audio]);
    }

    #[test]
    fn audit_log_round_trips_reports() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit").join("reports.json");

        let mut auth = authority(30.0, 0.05);
        let mut metadata = Metadata::new();
        metadata.insert("voice".to_string(), serde_json::json!("alloy"));
        auth.register(ComponentKind::Audio, 30.0, 1.0, metadata);
        auth.write_audit_log(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<DurationReport> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, auth.reports());
        assert_eq!(parsed[0].metadata["voice"], "alloy");
    }
}

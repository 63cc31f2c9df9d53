//! Checkpoint ledger, quality gates and adjustment suggestions.
//!
//! Every stage result is appended to the ledger. Gates have two severities:
//! an out-of-tolerance result on a critical stage blocks the pipeline while
//! gates are enabled, anywhere else it only warns.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use super::error::{FeedbackError, FeedbackResult};
use super::types::{
    Adjustment, AdjustmentTarget, DurationCheckpoint, DurationFeedback, GateDecision,
};
use crate::config::FeedbackSettings;
use crate::duration::{DurationAuthority, Metadata};
use crate::models::{ComponentKind, Deviation};

/// Adjustment multipliers are kept within this range.
const MULTIPLIER_RANGE: (f64, f64) = (0.5, 2.0);

/// Wraps a duration authority with a per-stage checkpoint ledger.
#[derive(Debug, Clone)]
pub struct FeedbackSystem {
    authority: DurationAuthority,
    settings: FeedbackSettings,
    ledger: Vec<DurationCheckpoint>,
}

impl FeedbackSystem {
    pub fn new(authority: DurationAuthority, settings: &FeedbackSettings) -> FeedbackResult<Self> {
        if !(0.0..=1.0).contains(&settings.regenerate_threshold) {
            return Err(FeedbackError::invalid_setting(
                "regenerate_threshold",
                settings.regenerate_threshold,
            ));
        }
        if !(settings.speech_rate_step > 0.0 && settings.speech_rate_step < 1.0) {
            return Err(FeedbackError::invalid_setting(
                "speech_rate_step",
                settings.speech_rate_step,
            ));
        }
        if settings.adjustment_window == 0 {
            return Err(FeedbackError::invalid_setting("adjustment_window", 0));
        }

        Ok(Self {
            authority,
            settings: settings.clone(),
            ledger: Vec::new(),
        })
    }

    pub fn authority(&self) -> &DurationAuthority {
        &self.authority
    }

    pub fn authority_mut(&mut self) -> &mut DurationAuthority {
        &mut self.authority
    }

    pub fn settings(&self) -> &FeedbackSettings {
        &self.settings
    }

    /// Record a stage result against the authority's band.
    pub fn add_checkpoint(
        &mut self,
        stage: &str,
        actual: f64,
        component: ComponentKind,
        details: Metadata,
    ) -> &DurationCheckpoint {
        let band = *self.authority.band();
        let within_tolerance = band.contains(actual);
        let deviation = band.classify(actual);
        let critical = self.settings.is_critical(stage);

        let mut warnings = Vec::new();
        if !within_tolerance {
            let bound = match deviation {
                Deviation::TooShort => format!("below minimum {:.2}s", band.min()),
                _ => format!("above maximum {:.2}s", band.max()),
            };
            warnings.push(format!(
                "{} duration {:.2}s is {} ({:+.1}%)",
                component,
                actual,
                bound,
                band.deviation_pct(actual)
            ));
            if critical {
                warnings.push(format!("{} is a critical stage", stage));
            }
            tracing::warn!("Checkpoint {}: {}", stage, warnings.join("; "));
        } else {
            tracing::debug!("Checkpoint {}: {} {:.2}s within {}", stage, component, actual, band);
        }

        self.ledger.push(DurationCheckpoint {
            stage: stage.to_string(),
            timestamp: Utc::now(),
            target: band.target(),
            actual,
            component,
            within_tolerance,
            deviation,
            critical,
            warnings,
            details,
        });

        &self.ledger[self.ledger.len() - 1]
    }

    /// Record a checkpoint and decide whether the pipeline may continue.
    ///
    /// Only a critical stage that is out of tolerance blocks, and only while
    /// gates are enabled.
    pub fn apply_quality_gate(
        &mut self,
        stage: &str,
        actual: f64,
        component: ComponentKind,
    ) -> GateDecision {
        let gates_enabled = self.settings.gates_enabled;
        let band = *self.authority.band();
        let checkpoint = self.add_checkpoint(stage, actual, component, Metadata::new());

        let decision = if checkpoint.within_tolerance {
            GateDecision {
                can_proceed: true,
                message: format!("{}: {} {:.2}s within {}", stage, component, actual, band),
            }
        } else if !gates_enabled {
            GateDecision {
                can_proceed: true,
                message: format!(
                    "{}: {} {:.2}s outside {} (quality gates disabled)",
                    stage, component, actual, band
                ),
            }
        } else if checkpoint.critical {
            GateDecision {
                can_proceed: false,
                message: format!(
                    "BLOCKED: critical stage {} produced {} {:.2}s outside {}",
                    stage, component, actual, band
                ),
            }
        } else {
            GateDecision {
                can_proceed: true,
                message: format!(
                    "WARNING: {} produced {} {:.2}s outside {}, continuing",
                    stage, component, actual, band
                ),
            }
        };

        if decision.can_proceed {
            tracing::info!("Quality gate: {}", decision.message);
        } else {
            tracing::error!("Quality gate: {}", decision.message);
        }

        decision
    }

    /// Summarize the whole ledger as of `stage`.
    pub fn feedback(&self, stage: &str) -> DurationFeedback {
        let total = self.ledger.len();
        let passed = self.ledger.iter().filter(|c| c.within_tolerance).count();
        let quality_score = if total == 0 {
            1.0
        } else {
            passed as f64 / total as f64
        };

        let critical_failure = self.ledger.iter().any(|c| c.is_critical_failure());
        let must_regenerate = critical_failure && quality_score < self.settings.regenerate_threshold;
        let can_proceed = !(self.settings.gates_enabled && critical_failure);

        let mut recommendations: Vec<String> = ComponentKind::ALL
            .iter()
            .filter_map(|&kind| self.recommendation_for(kind))
            .collect();
        if must_regenerate {
            recommendations.push(format!(
                "Regenerate failed critical stages: quality score {:.2} is below {:.2}",
                quality_score, self.settings.regenerate_threshold
            ));
        }

        DurationFeedback {
            stage: stage.to_string(),
            quality_score,
            can_proceed,
            must_regenerate,
            recommendations,
        }
    }

    /// Numeric directive for `component` from its most recent checkpoints.
    ///
    /// Looks at the last `adjustment_window` checkpoints. Returns `None`
    /// when they lean neither short nor long, and always for subtitles,
    /// which follow the audio.
    pub fn suggest_adjustments(&self, component: ComponentKind) -> Option<Adjustment> {
        let recent: Vec<&DurationCheckpoint> = self
            .checkpoints_for(component)
            .into_iter()
            .rev()
            .take(self.settings.adjustment_window)
            .collect();
        if recent.is_empty() {
            return None;
        }

        let (short, long) = count_deviations(&recent);
        if short == long {
            return None;
        }

        let mean = recent.iter().map(|c| c.actual).sum::<f64>() / recent.len() as f64;
        let ratio = clamp_multiplier(self.authority.target() / mean);
        let step = self.settings.speech_rate_step;

        let (target, multiplier) = match component {
            ComponentKind::Audio if short > long => (AdjustmentTarget::SpeechRate, 1.0 - step),
            ComponentKind::Audio => (AdjustmentTarget::SpeechRate, 1.0 + step),
            ComponentKind::Script => (AdjustmentTarget::WordCount, ratio),
            ComponentKind::Video => (AdjustmentTarget::ClipDuration, ratio),
            ComponentKind::Subtitles => return None,
        };

        let adjustment = Adjustment {
            component,
            target,
            multiplier,
            reason: format!(
                "{} of the last {} {} checkpoints too short, {} too long (mean {:.2}s, target {:.2}s)",
                short,
                recent.len(),
                component,
                long,
                mean,
                self.authority.target()
            ),
        };
        tracing::info!("Suggesting {} x{:.3} for {}", target, multiplier, component);

        Some(adjustment)
    }

    /// The full ledger, oldest first.
    pub fn checkpoints(&self) -> &[DurationCheckpoint] {
        &self.ledger
    }

    pub fn checkpoints_for(&self, component: ComponentKind) -> Vec<&DurationCheckpoint> {
        self.ledger
            .iter()
            .filter(|c| c.component == component)
            .collect()
    }

    /// Write the ledger as JSON Lines, one checkpoint per line.
    pub fn write_audit_log(&self, path: &Path) -> FeedbackResult<()> {
        let mut content = Vec::new();
        for checkpoint in &self.ledger {
            serde_json::to_writer(&mut content, checkpoint)?;
            content.push(b'\n');
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FeedbackError::write(path, e))?;
        }
        let mut file = fs::File::create(path).map_err(|e| FeedbackError::write(path, e))?;
        file.write_all(&content)
            .map_err(|e| FeedbackError::write(path, e))?;

        tracing::debug!("Wrote {} checkpoints to {}", self.ledger.len(), path.display());
        Ok(())
    }

    fn recommendation_for(&self, kind: ComponentKind) -> Option<String> {
        let checkpoints = self.checkpoints_for(kind);
        let (short, long) = count_deviations(&checkpoints);
        if short == long {
            return None;
        }
        let too_short = short > long;
        let count = short.max(long);
        let total = checkpoints.len();
        let pct = self.settings.speech_rate_step * 100.0;

        let advice = match (kind, too_short) {
            (ComponentKind::Audio, true) => format!("reduce narration speech rate by {:.0}%", pct),
            (ComponentKind::Audio, false) => {
                format!("increase narration speech rate by {:.0}%", pct)
            }
            (ComponentKind::Script, true) => "add content to the script".to_string(),
            (ComponentKind::Script, false) => "tighten the script".to_string(),
            (ComponentKind::Video, true) => "extend visual clip durations".to_string(),
            (ComponentKind::Video, false) => "shorten visual clips".to_string(),
            (ComponentKind::Subtitles, _) => "re-derive subtitles from the measured audio".to_string(),
        };

        Some(format!(
            "{} runs too {} ({} of {} checkpoints): {}",
            kind,
            if too_short { "short" } else { "long" },
            count,
            total,
            advice
        ))
    }
}

fn count_deviations(checkpoints: &[&DurationCheckpoint]) -> (usize, usize) {
    checkpoints
        .iter()
        .fold((0, 0), |(short, long), c| match c.deviation {
            Deviation::TooShort => (short + 1, long),
            Deviation::TooLong => (short, long + 1),
            Deviation::WithinTolerance => (short, long),
        })
}

fn clamp_multiplier(value: f64) -> f64 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(MULTIPLIER_RANGE.0, MULTIPLIER_RANGE.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn system(gates_enabled: bool) -> FeedbackSystem {
        let settings = FeedbackSettings {
            gates_enabled,
            ..FeedbackSettings::default()
        };
        FeedbackSystem::new(DurationAuthority::with_target(30.0, 0.05).unwrap(), &settings).unwrap()
    }

    #[test]
    fn rejects_invalid_settings() {
        let authority = DurationAuthority::with_target(30.0, 0.05).unwrap();
        let settings = FeedbackSettings {
            adjustment_window: 0,
            ..FeedbackSettings::default()
        };
        assert!(matches!(
            FeedbackSystem::new(authority, &settings),
            Err(FeedbackError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn checkpoints_are_never_overwritten() {
        let mut fb = system(true);
        fb.add_checkpoint("audio_generation", 27.0, ComponentKind::Audio, Metadata::new());
        fb.add_checkpoint("audio_generation", 29.5, ComponentKind::Audio, Metadata::new());

        let audio = fb.checkpoints_for(ComponentKind::Audio);
        assert_eq!(audio.len(), 2);
        assert!(!audio[0].within_tolerance);
        assert_eq!(audio[0].deviation, Deviation::TooShort);
        assert_eq!(audio[0].warnings.len(), 2);
        assert!(audio[1].within_tolerance);
        assert!(audio[1].warnings.is_empty());
    }

    #[test]
    fn critical_stage_blocks_when_gates_enabled() {
        let mut fb = system(true);
        let decision = fb.apply_quality_gate("audio_generation", 33.0, ComponentKind::Audio);
        assert!(!decision.can_proceed);
        assert!(decision.message.contains("BLOCKED"));
    }

    #[test]
    fn same_input_proceeds_with_gates_disabled() {
        let mut fb = system(false);
        let decision = fb.apply_quality_gate("audio_generation", 33.0, ComponentKind::Audio);
        assert!(decision.can_proceed);
        assert!(decision.message.contains("disabled"));
    }

    #[test]
    fn advisory_stage_only_warns() {
        let mut fb = system(true);
        let decision = fb.apply_quality_gate("script_generation", 33.0, ComponentKind::Script);
        assert!(decision.can_proceed);
        assert!(decision.message.starts_with("WARNING"));
    }

    #[test]
    fn in_band_critical_stage_proceeds() {
        let mut fb = system(true);
        let decision = fb.apply_quality_gate("final_assembly", 30.0, ComponentKind::Video);
        assert!(decision.can_proceed);
        assert_eq!(fb.checkpoints().len(), 1);
    }

    #[test]
    fn empty_ledger_scores_one() {
        let fb = system(true);
        let feedback = fb.feedback("script_generation");
        assert_eq!(feedback.quality_score, 1.0);
        assert!(feedback.can_proceed);
        assert!(!feedback.must_regenerate);
        assert!(feedback.recommendations.is_empty());
    }

    #[test]
    fn critical_failure_with_low_score_requires_regeneration() {
        let mut fb = system(true);
        fb.add_checkpoint("script_generation", 30.5, ComponentKind::Script, Metadata::new());
        fb.add_checkpoint("audio_generation", 26.0, ComponentKind::Audio, Metadata::new());

        let feedback = fb.feedback("audio_generation");
        assert_eq!(feedback.quality_score, 0.5);
        assert!(feedback.must_regenerate);
        assert!(!feedback.can_proceed);
        assert!(feedback
            .recommendations
            .iter()
            .any(|r| r.contains("reduce narration speech rate by 10%")));
    }

    #[test]
    fn critical_failure_with_good_score_does_not_require_regeneration() {
        let mut fb = system(true);
        for stage in ["script_generation", "subtitle_generation", "video_generation"] {
            fb.add_checkpoint(stage, 30.0, ComponentKind::Script, Metadata::new());
        }
        fb.add_checkpoint("audio_generation", 35.0, ComponentKind::Audio, Metadata::new());

        let feedback = fb.feedback("audio_generation");
        assert_eq!(feedback.quality_score, 0.75);
        assert!(!feedback.must_regenerate);
        assert!(!feedback.can_proceed);
    }

    #[test]
    fn gates_disabled_never_block_feedback() {
        let mut fb = system(false);
        fb.add_checkpoint("audio_generation", 20.0, ComponentKind::Audio, Metadata::new());

        let feedback = fb.feedback("audio_generation");
        assert!(feedback.can_proceed);
        assert!(feedback.must_regenerate);
    }

    #[test]
    fn short_audio_suggests_slower_speech() {
        let mut fb = system(true);
        for actual in [31.0, 26.0, 27.0, 25.5] {
            fb.add_checkpoint("audio_generation", actual, ComponentKind::Audio, Metadata::new());
        }

        let adjustment = fb.suggest_adjustments(ComponentKind::Audio).unwrap();
        assert_eq!(adjustment.target, AdjustmentTarget::SpeechRate);
        assert!((adjustment.multiplier - 0.9).abs() < 1e-9);
    }

    #[test]
    fn long_script_scales_word_count() {
        let mut fb = system(true);
        fb.add_checkpoint("script_generation", 40.0, ComponentKind::Script, Metadata::new());

        let adjustment = fb.suggest_adjustments(ComponentKind::Script).unwrap();
        assert_eq!(adjustment.target, AdjustmentTarget::WordCount);
        assert!((adjustment.multiplier - 0.75).abs() < 1e-9);
    }

    #[test]
    fn adjustment_multiplier_is_clamped() {
        let mut fb = system(true);
        fb.add_checkpoint("video_generation", 5.0, ComponentKind::Video, Metadata::new());

        let adjustment = fb.suggest_adjustments(ComponentKind::Video).unwrap();
        assert_eq!(adjustment.target, AdjustmentTarget::ClipDuration);
        assert_eq!(adjustment.multiplier, 2.0);
    }

    #[test]
    fn no_adjustment_when_balanced_or_in_band() {
        let mut fb = system(true);
        assert!(fb.suggest_adjustments(ComponentKind::Audio).is_none());

        fb.add_checkpoint("audio_generation", 30.0, ComponentKind::Audio, Metadata::new());
        assert!(fb.suggest_adjustments(ComponentKind::Audio).is_none());

        fb.add_checkpoint("subtitle_generation", 40.0, ComponentKind::Subtitles, Metadata::new());
        assert!(fb.suggest_adjustments(ComponentKind::Subtitles).is_none());
    }

    #[test]
    fn audit_log_has_one_line_per_checkpoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit/checkpoints.jsonl");
        let mut fb = system(true);
        fb.add_checkpoint("script_generation", 30.0, ComponentKind::Script, Metadata::new());
        fb.apply_quality_gate("audio_generation", 33.0, ComponentKind::Audio);

        fb.write_audit_log(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: DurationCheckpoint = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.stage, "audio_generation");
        assert!(parsed.critical);
    }
}

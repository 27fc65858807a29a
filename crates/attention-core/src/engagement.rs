//! Engagement scoring
//!
//! Fuses three sub-scores into a weighted engagement index:
//! - gaze (binary): looking at the screen or not
//! - pose (graded): how far the head is turned or tilted within tolerance
//! - blink (graded): distance of the blink rate from the ideal band
//!
//! `index = clip(wg * gaze + wp * pose + wb * blink, 0, 1)`
//!
//! Gaze is deliberately binary while pose is graded.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

pub const ASLEEP_WARNING: &str = "Asleep detected";
pub const NO_FACE_WARNING: &str = "No face detected";
pub const EYES_CLOSED_WARNING: &str = "Eyes closed or semi-closed";

/// Excess blinks per minute above the band that drives the blink score to 0.
const BLINK_EXCESS_SPAN: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionStatus {
    Engaged,
    Distracted,
    Asleep,
}

impl AttentionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engaged => "engaged",
            Self::Distracted => "distracted",
            Self::Asleep => "asleep",
        }
    }
}

/// Already-smoothed signals for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementInputs {
    pub gaze_yaw: f64,
    pub head_yaw: f64,
    pub head_pitch: f64,
    pub average_ear: f64,
    pub blinks_per_minute: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSample {
    pub gaze_score: f64,
    pub pose_score: f64,
    pub blink_score: f64,
    pub engagement_index: f64,
    pub status: AttentionStatus,
    pub warnings: Vec<String>,
}

impl EngagementSample {
    /// Degenerate sample for a frame without a face.
    pub fn no_face() -> Self {
        Self {
            gaze_score: 0.0,
            pose_score: 0.0,
            blink_score: 0.0,
            engagement_index: 0.0,
            status: AttentionStatus::Distracted,
            warnings: vec![NO_FACE_WARNING.to_string()],
        }
    }

    /// Sustained-closure override: forces `Asleep` and puts the asleep warning first.
    pub fn mark_asleep(&mut self) {
        self.status = AttentionStatus::Asleep;
        self.warnings.insert(0, ASLEEP_WARNING.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct EngagementScorer {
    config: ScoringConfig,
}

impl EngagementScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn gaze_score(&self, gaze_yaw: f64) -> f64 {
        if gaze_yaw.abs() < self.config.gaze_yaw_threshold {
            1.0
        } else {
            0.0
        }
    }

    pub fn pose_score(&self, head_yaw: f64, head_pitch: f64) -> f64 {
        let yaw_t = self.config.pose_yaw_threshold;
        let pitch_t = self.config.pose_pitch_threshold;
        if head_yaw.abs() > yaw_t || head_pitch.abs() > pitch_t {
            return 0.0;
        }
        let yaw_ratio = 1.0 - head_yaw.abs() / yaw_t;
        let pitch_ratio = 1.0 - head_pitch.abs() / pitch_t;
        (yaw_ratio + pitch_ratio) / 2.0
    }

    pub fn blink_score(&self, blinks_per_minute: f64) -> f64 {
        let min = self.config.blink_rate_min;
        let max = self.config.blink_rate_max;
        if (min..=max).contains(&blinks_per_minute) {
            1.0
        } else if blinks_per_minute < min {
            (blinks_per_minute / min).max(0.0)
        } else {
            (1.0 - (blinks_per_minute - max) / BLINK_EXCESS_SPAN).max(0.0)
        }
    }

    pub fn engagement_index(&self, gaze_score: f64, pose_score: f64, blink_score: f64) -> f64 {
        let w = &self.config.weights;
        (w.gaze * gaze_score + w.pose * pose_score + w.blink * blink_score).clamp(0.0, 1.0)
    }

    pub fn status(&self, engagement_index: f64) -> AttentionStatus {
        if engagement_index >= self.config.engaged_threshold {
            AttentionStatus::Engaged
        } else {
            AttentionStatus::Distracted
        }
    }

    /// One warning per signal outside its own threshold, in a fixed order.
    pub fn warnings(&self, inputs: &EngagementInputs) -> Vec<String> {
        let cfg = &self.config;
        let mut warnings = Vec::new();

        if inputs.gaze_yaw.abs() > cfg.gaze_yaw_threshold {
            warnings.push(format!("Lateral gaze deviation ({:.1}°)", inputs.gaze_yaw));
        }
        if inputs.head_yaw.abs() > cfg.pose_yaw_threshold {
            warnings.push(format!("Head turned ({:.1}°)", inputs.head_yaw));
        }
        if inputs.head_pitch.abs() > cfg.pose_pitch_threshold {
            // positive pitch is head down
            let direction = if inputs.head_pitch > 0.0 { "down" } else { "up" };
            warnings.push(format!(
                "Head tilted {direction} ({:.1}°)",
                inputs.head_pitch.abs()
            ));
        }
        if inputs.average_ear < cfg.ear_semi_closed_threshold {
            warnings.push(EYES_CLOSED_WARNING.to_string());
        }
        warnings
    }

    pub fn score(&self, inputs: &EngagementInputs) -> EngagementSample {
        let gaze_score = self.gaze_score(inputs.gaze_yaw);
        let pose_score = self.pose_score(inputs.head_yaw, inputs.head_pitch);
        let blink_score = self.blink_score(inputs.blinks_per_minute);
        let engagement_index = self.engagement_index(gaze_score, pose_score, blink_score);

        EngagementSample {
            gaze_score,
            pose_score,
            blink_score,
            engagement_index,
            status: self.status(engagement_index),
            warnings: self.warnings(inputs),
        }
    }
}

impl Default for EngagementScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(gaze_yaw: f64, head_yaw: f64, head_pitch: f64, bpm: f64) -> EngagementInputs {
        EngagementInputs {
            gaze_yaw,
            head_yaw,
            head_pitch,
            average_ear: 0.3,
            blinks_per_minute: bpm,
        }
    }

    #[test]
    fn nominal_signals_score_fully() {
        let sample = EngagementScorer::default().score(&inputs(0.0, 0.0, 0.0, 13.0));
        assert_eq!(sample.gaze_score, 1.0);
        assert_eq!(sample.pose_score, 1.0);
        assert_eq!(sample.blink_score, 1.0);
        assert!((sample.engagement_index - 1.0).abs() < 1e-12);
        assert_eq!(sample.status, AttentionStatus::Engaged);
        assert!(sample.warnings.is_empty());
    }

    #[test]
    fn extreme_signals_score_zero() {
        let sample = EngagementScorer::default().score(&inputs(90.0, 90.0, 90.0, 0.0));
        assert_eq!(sample.gaze_score, 0.0);
        assert_eq!(sample.pose_score, 0.0);
        assert_eq!(sample.blink_score, 0.0);
        assert_eq!(sample.engagement_index, 0.0);
        assert_eq!(sample.status, AttentionStatus::Distracted);
    }

    #[test]
    fn gaze_score_is_binary_at_threshold() {
        let scorer = EngagementScorer::default();
        assert_eq!(scorer.gaze_score(19.99), 1.0);
        assert_eq!(scorer.gaze_score(-20.0), 0.0);
    }

    #[test]
    fn pose_score_is_linear_inside_tolerance() {
        let scorer = EngagementScorer::default();
        // yaw half-way (0.5), pitch at 0 (1.0)
        assert!((scorer.pose_score(12.5, 0.0) - 0.75).abs() < 1e-12);
        assert_eq!(scorer.pose_score(25.0, 15.0), 0.0);
        assert_eq!(scorer.pose_score(0.0, -15.5), 0.0);
    }

    #[test]
    fn blink_score_ramps_outside_band() {
        let scorer = EngagementScorer::default();
        assert_eq!(scorer.blink_score(12.0), 1.0);
        assert_eq!(scorer.blink_score(15.0), 1.0);
        assert!((scorer.blink_score(6.0) - 0.5).abs() < 1e-12);
        assert!((scorer.blink_score(25.0) - 0.5).abs() < 1e-12);
        assert_eq!(scorer.blink_score(60.0), 0.0);
    }

    #[test]
    fn engaged_threshold_is_inclusive() {
        let scorer = EngagementScorer::default();
        assert_eq!(scorer.status(0.4), AttentionStatus::Engaged);
        assert_eq!(scorer.status(0.3999), AttentionStatus::Distracted);
    }

    #[test]
    fn warnings_are_directional_and_cumulative() {
        let scorer = EngagementScorer::default();
        let mut i = inputs(-32.0, 40.0, 20.0, 13.0);
        i.average_ear = 0.1;
        let warnings = scorer.warnings(&i);
        assert_eq!(
            warnings,
            vec![
                "Lateral gaze deviation (-32.0°)".to_string(),
                "Head turned (40.0°)".to_string(),
                "Head tilted down (20.0°)".to_string(),
                EYES_CLOSED_WARNING.to_string(),
            ]
        );

        let up = scorer.warnings(&inputs(0.0, 0.0, -18.3, 13.0));
        assert_eq!(up, vec!["Head tilted up (18.3°)".to_string()]);
    }

    #[test]
    fn asleep_override_prepends_warning() {
        let mut sample = EngagementScorer::default().score(&inputs(0.0, 40.0, 0.0, 13.0));
        sample.mark_asleep();
        assert_eq!(sample.status, AttentionStatus::Asleep);
        assert_eq!(sample.warnings[0], ASLEEP_WARNING);
        assert_eq!(sample.warnings.len(), 2);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&AttentionStatus::Asleep).unwrap();
        assert_eq!(json, "\"asleep\"");
    }
}

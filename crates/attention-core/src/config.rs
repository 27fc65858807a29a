use serde::{Deserialize, Serialize};

use crate::blink::DEFAULT_WINDOW_SECS;
use crate::drowsiness::DEFAULT_THRESHOLD_SECS;
use crate::smoothing::FilterParams;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementWeights {
    pub gaze: f64,
    pub pose: f64,
    pub blink: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            gaze: 0.5,
            pose: 0.3,
            blink: 0.2,
        }
    }
}

/// Thresholds and weights used by the engagement scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Degrees. Gaze counts as on-screen strictly below this.
    pub gaze_yaw_threshold: f64,
    pub pose_yaw_threshold: f64,
    pub pose_pitch_threshold: f64,
    /// Ideal blink band, blinks per minute.
    pub blink_rate_min: f64,
    pub blink_rate_max: f64,
    pub weights: EngagementWeights,
    /// Engagement index at or above which the subject is engaged.
    pub engaged_threshold: f64,
    /// Average EAR below which an "eyes closed or semi-closed" warning is raised.
    #[serde(default = "default_ear_semi_closed_threshold")]
    pub ear_semi_closed_threshold: f64,
}

fn default_ear_semi_closed_threshold() -> f64 {
    0.25
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            gaze_yaw_threshold: 20.0,
            pose_yaw_threshold: 25.0,
            pose_pitch_threshold: 15.0,
            blink_rate_min: 12.0,
            blink_rate_max: 15.0,
            weights: EngagementWeights::default(),
            engaged_threshold: 0.4,
            ear_semi_closed_threshold: default_ear_semi_closed_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionConfig {
    /// Average EAR below which the eyes are classified as closed.
    pub ear_closed_threshold: f64,
    pub scoring: ScoringConfig,
    pub drowsiness_threshold_secs: f64,
    pub blink_window_secs: f64,
    /// Clears blink history when a frame has no face. Off by default: blink
    /// history survives a no-face gap while drowsiness state does not.
    #[serde(default)]
    pub reset_blink_window_on_face_loss: bool,
    #[serde(default = "default_gaze_filter")]
    pub gaze_filter: FilterParams,
    #[serde(default = "default_pose_filter")]
    pub pose_filter: FilterParams,
}

fn default_gaze_filter() -> FilterParams {
    FilterParams::GAZE
}

fn default_pose_filter() -> FilterParams {
    FilterParams::POSE
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            ear_closed_threshold: 0.2,
            scoring: ScoringConfig::default(),
            drowsiness_threshold_secs: DEFAULT_THRESHOLD_SECS,
            blink_window_secs: DEFAULT_WINDOW_SECS,
            reset_blink_window_on_face_loss: false,
            gaze_filter: FilterParams::GAZE,
            pose_filter: FilterParams::POSE,
        }
    }
}

impl AttentionConfig {
    pub fn validate(&self) -> Result<(), String> {
        let s = &self.scoring;
        for (name, value) in [
            ("earClosedThreshold", self.ear_closed_threshold),
            ("earSemiClosedThreshold", s.ear_semi_closed_threshold),
            ("gazeYawThreshold", s.gaze_yaw_threshold),
            ("poseYawThreshold", s.pose_yaw_threshold),
            ("posePitchThreshold", s.pose_pitch_threshold),
            ("blinkRateMin", s.blink_rate_min),
            ("drowsinessThresholdSecs", self.drowsiness_threshold_secs),
            ("blinkWindowSecs", self.blink_window_secs),
        ] {
            if !(value > 0.0) {
                return Err(format!("{name} must be > 0, got {value}"));
            }
        }
        if s.blink_rate_max < s.blink_rate_min {
            return Err(format!(
                "blink band is inverted: min={} max={}",
                s.blink_rate_min, s.blink_rate_max
            ));
        }
        let w = &s.weights;
        if w.gaze < 0.0 || w.pose < 0.0 || w.blink < 0.0 {
            return Err("engagement weights must be non-negative".to_string());
        }
        if !(0.0..=1.0).contains(&s.engaged_threshold) {
            return Err(format!(
                "engagedThreshold must be within [0, 1], got {}",
                s.engaged_threshold
            ));
        }
        self.gaze_filter.validate()?;
        self.pose_filter.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AttentionConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_blink_band_is_rejected() {
        let mut cfg = AttentionConfig::default();
        cfg.scoring.blink_rate_min = 20.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("inverted"));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut cfg = AttentionConfig::default();
        cfg.scoring.pose_pitch_threshold = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let json = serde_json::json!({
            "earClosedThreshold": 0.21,
            "scoring": {
                "gazeYawThreshold": 20.0,
                "poseYawThreshold": 25.0,
                "posePitchThreshold": 15.0,
                "blinkRateMin": 12.0,
                "blinkRateMax": 15.0,
                "weights": { "gaze": 0.5, "pose": 0.3, "blink": 0.2 },
                "engagedThreshold": 0.4
            },
            "drowsinessThresholdSecs": 2.0,
            "blinkWindowSecs": 60.0
        });
        let cfg: AttentionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.scoring.ear_semi_closed_threshold, 0.25);
        assert!(!cfg.reset_blink_window_on_face_loss);
        assert_eq!(cfg.pose_filter, FilterParams::POSE);
    }
}

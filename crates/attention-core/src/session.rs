//! Per-connection attention pipeline
//!
//! One `AttentionSession` per monitored subject. Frames must be fed in order;
//! the session is not shared between connections.

use serde::Serialize;

use crate::blink::BlinkRateTracker;
use crate::config::AttentionConfig;
use crate::drowsiness::DrowsinessTracker;
use crate::ear::EyeClosureClassifier;
use crate::engagement::{EngagementInputs, EngagementSample, EngagementScorer};
use crate::smoothing::MultiAxisFilter;
use crate::types::{GazeAngles, HeadPose, RawFrameSignals};

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub sample: EngagementSample,
    /// Smoothed gaze.
    pub gaze: GazeAngles,
    /// Smoothed head pose.
    pub pose: HeadPose,
    pub eyes_closed: bool,
    pub left_ear: f64,
    pub right_ear: f64,
    pub blinks_per_minute: f64,
    pub face_detected: bool,
}

impl FrameReport {
    fn no_face(blinks_per_minute: f64) -> Self {
        Self {
            sample: EngagementSample::no_face(),
            gaze: GazeAngles::default(),
            pose: HeadPose::default(),
            eyes_closed: false,
            left_ear: 0.0,
            right_ear: 0.0,
            blinks_per_minute,
            face_detected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttentionSession {
    config: AttentionConfig,
    /// [pitch, yaw]
    gaze_filter: MultiAxisFilter<2>,
    /// [yaw, pitch, roll]
    pose_filter: MultiAxisFilter<3>,
    classifier: EyeClosureClassifier,
    blink_rate: BlinkRateTracker,
    drowsiness: DrowsinessTracker,
    scorer: EngagementScorer,
    frames: u64,
}

impl AttentionSession {
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            gaze_filter: MultiAxisFilter::new(config.gaze_filter),
            pose_filter: MultiAxisFilter::new(config.pose_filter),
            classifier: EyeClosureClassifier::new(config.ear_closed_threshold),
            blink_rate: BlinkRateTracker::new(config.blink_window_secs),
            drowsiness: DrowsinessTracker::new(config.drowsiness_threshold_secs),
            scorer: EngagementScorer::new(config.scoring.clone()),
            frames: 0,
            config,
        }
    }

    pub fn process(&mut self, signals: &RawFrameSignals) -> FrameReport {
        self.frames += 1;

        if !signals.face_present {
            self.on_face_lost();
            return FrameReport::no_face(self.blink_rate.last_rate());
        }

        let ts = Some(signals.timestamp);
        let [gaze_pitch, gaze_yaw] = self
            .gaze_filter
            .filter([signals.gaze_pitch, signals.gaze_yaw], ts);
        let [head_yaw, head_pitch, head_roll] = self
            .pose_filter
            .filter([signals.head_yaw, signals.head_pitch, signals.head_roll], ts);

        let closure = self.classifier.classify(signals.left_ear, signals.right_ear);
        let blinks_per_minute = self.blink_rate.update(closure.closed, signals.timestamp);
        let asleep = self.drowsiness.update(closure.closed, signals.timestamp);

        let mut sample = self.scorer.score(&EngagementInputs {
            gaze_yaw,
            head_yaw,
            head_pitch,
            average_ear: closure.average_ear,
            blinks_per_minute,
        });
        if asleep {
            sample.mark_asleep();
        }

        FrameReport {
            sample,
            gaze: GazeAngles::new(gaze_pitch, gaze_yaw),
            pose: HeadPose::new(head_yaw, head_pitch, head_roll),
            eyes_closed: closure.closed,
            left_ear: closure.left_ear,
            right_ear: closure.right_ear,
            blinks_per_minute,
            face_detected: true,
        }
    }

    fn on_face_lost(&mut self) {
        self.drowsiness.reset();
        self.gaze_filter.reset();
        self.pose_filter.reset();
        if self.config.reset_blink_window_on_face_loss {
            self.blink_rate.reset();
        }
    }

    /// Clears every filter and tracker. Called when the connection closes.
    pub fn reset(&mut self) {
        self.gaze_filter.reset();
        self.pose_filter.reset();
        self.blink_rate.reset();
        self.drowsiness.reset();
        self.frames = 0;
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn blink_rate(&self) -> &BlinkRateTracker {
        &self.blink_rate
    }

    pub fn drowsiness(&self) -> &DrowsinessTracker {
        &self.drowsiness
    }
}

impl Default for AttentionSession {
    fn default() -> Self {
        Self::new(AttentionConfig::default())
    }
}

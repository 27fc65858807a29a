//! Wire format of the monitor socket. Field names are snake_case on the wire.

use attention_core::{AttentionStatus, FrameReport, GazeAngles, HeadPose};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarPair {
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorMessage {
    pub attention_score: f64,
    pub gaze: GazeAngles,
    pub pose: HeadPose,
    pub blink: bool,
    pub ear: EarPair,
    pub status: AttentionStatus,
    pub warnings: Vec<String>,
    pub blinks_per_minute: f64,
    pub face_detected: bool,
}

impl From<&FrameReport> for MonitorMessage {
    fn from(report: &FrameReport) -> Self {
        Self {
            attention_score: round_to(report.sample.engagement_index, 3),
            gaze: GazeAngles::new(round_to(report.gaze.pitch, 2), round_to(report.gaze.yaw, 2)),
            pose: HeadPose::new(
                round_to(report.pose.yaw, 2),
                round_to(report.pose.pitch, 2),
                round_to(report.pose.roll, 2),
            ),
            blink: report.eyes_closed,
            ear: EarPair {
                left: round_to(report.left_ear, 3),
                right: round_to(report.right_ear, 3),
            },
            status: report.sample.status,
            warnings: report.sample.warnings.clone(),
            blinks_per_minute: round_to(report.blinks_per_minute, 1),
            face_detected: report.face_detected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response of the blink detection socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlinkMessage {
    pub blinking: bool,
    pub left_ear: f64,
    pub right_ear: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkCountMessage {
    pub blink_count: u64,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

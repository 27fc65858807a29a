use serde::{Deserialize, Serialize};

/// 2D point in pixel (or normalized) image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Scales normalized `[0, 1]` coordinates to pixels.
    pub fn denormalize(&self, width: f64, height: f64) -> Self {
        Self::new(self.x * width, self.y * height)
    }
}

/// Head orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl HeadPose {
    pub const fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Gaze stand-in used when no gaze estimate is available: half the head
    /// angles on each axis.
    pub fn gaze_proxy(&self) -> GazeAngles {
        GazeAngles::new(self.pitch * 0.5, self.yaw * 0.5)
    }
}

/// Gaze direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeAngles {
    pub pitch: f64,
    pub yaw: f64,
}

impl GazeAngles {
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}

/// Numeric outputs of the perception stage for one frame.
///
/// Built once per inbound frame and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFrameSignals {
    pub gaze_yaw: f64,
    pub gaze_pitch: f64,
    pub head_yaw: f64,
    pub head_pitch: f64,
    pub head_roll: f64,
    pub left_ear: f64,
    pub right_ear: f64,
    /// Seconds, monotonic within one session.
    pub timestamp: f64,
    pub face_present: bool,
}

impl RawFrameSignals {
    pub fn new(gaze: GazeAngles, pose: HeadPose, left_ear: f64, right_ear: f64, timestamp: f64) -> Self {
        Self {
            gaze_yaw: gaze.yaw,
            gaze_pitch: gaze.pitch,
            head_yaw: pose.yaw,
            head_pitch: pose.pitch,
            head_roll: pose.roll,
            left_ear,
            right_ear,
            timestamp,
            face_present: true,
        }
    }

    /// Frame in which the perception stage found no face.
    pub fn no_face(timestamp: f64) -> Self {
        Self {
            gaze_yaw: 0.0,
            gaze_pitch: 0.0,
            head_yaw: 0.0,
            head_pitch: 0.0,
            head_roll: 0.0,
            left_ear: 0.0,
            right_ear: 0.0,
            timestamp,
            face_present: false,
        }
    }

    pub fn gaze(&self) -> GazeAngles {
        GazeAngles::new(self.gaze_pitch, self.gaze_yaw)
    }

    pub fn pose(&self) -> HeadPose {
        HeadPose::new(self.head_yaw, self.head_pitch, self.head_roll)
    }
}

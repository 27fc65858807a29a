//! Eye aspect ratio (EAR) and eye-closure classification
//!
//! Each eye is described by six landmarks ordered around the eye contour:
//! `[p0, p1, p2, p3, p4, p5]` where p0/p3 are the reference pair spanning the
//! eye, p1/p2 lie on the upper lid and p4/p5 on the lower lid, with p5 facing
//! p1 and p4 facing p2.
//!
//! `EAR = (|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)`

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Six ordered landmarks of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeLandmarks {
    pub points: [Point; 6],
}

impl EyeLandmarks {
    pub const fn new(points: [Point; 6]) -> Self {
        Self { points }
    }

    /// Converts normalized coordinates to pixels for an image of the given size.
    pub fn denormalize(&self, width: f64, height: f64) -> Self {
        Self {
            points: self.points.map(|p| p.denormalize(width, height)),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        eye_aspect_ratio(&self.points)
    }
}

/// EAR of one eye. A zero reference distance yields `0.0`.
pub fn eye_aspect_ratio(points: &[Point; 6]) -> f64 {
    let reference = points[0].distance(&points[3]);
    if reference <= f64::EPSILON {
        return 0.0;
    }
    let span_a = points[1].distance(&points[5]);
    let span_b = points[2].distance(&points[4]);
    (span_a + span_b) / (2.0 * reference)
}

/// Per-frame eye measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EyeClosure {
    pub left_ear: f64,
    pub right_ear: f64,
    pub average_ear: f64,
    pub closed: bool,
}

/// Thresholds the binocular average EAR into an open/closed signal.
#[derive(Debug, Clone, Copy)]
pub struct EyeClosureClassifier {
    closed_threshold: f64,
}

impl EyeClosureClassifier {
    pub fn new(closed_threshold: f64) -> Self {
        Self { closed_threshold }
    }

    pub fn classify(&self, left_ear: f64, right_ear: f64) -> EyeClosure {
        let average_ear = (left_ear + right_ear) / 2.0;
        EyeClosure {
            left_ear,
            right_ear,
            average_ear,
            closed: average_ear < self.closed_threshold,
        }
    }

    pub fn classify_landmarks(&self, left: &EyeLandmarks, right: &EyeLandmarks) -> EyeClosure {
        self.classify(left.aspect_ratio(), right.aspect_ratio())
    }

    pub fn threshold(&self) -> f64 {
        self.closed_threshold
    }
}

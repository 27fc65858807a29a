//! Perception collaborators
//!
//! Landmark detection, head-pose estimation and gaze estimation run outside
//! this process (or are mocked). This module defines the contracts the monitor
//! loop depends on and the shared [`Perception`] handle injected through
//! `AppState`.

pub mod gate;
pub mod http;
pub mod image;
pub mod mock;

use std::sync::Arc;

use attention_core::{EyeLandmarks, GazeAngles, HeadPose, Point};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::PerceptionConfig;

pub use gate::InferenceGate;
pub use http::HttpPerception;
pub use image::{FrameImage, ImageDecodeError};
pub use mock::MockPerception;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PerceptionError {
    #[error("perception service unavailable: {0}")]
    Unavailable(String),
    #[error("perception failed: {0}")]
    Failed(String),
    #[error("perception network error: {0}")]
    Network(String),
    #[error("perception request timed out")]
    Timeout,
    #[error("invalid perception response: {0}")]
    InvalidResponse(String),
}

/// Face box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Grows each side by `margin` times the box extent, clamped to the image.
    pub fn expand(&self, margin: f64, image_width: f64, image_height: f64) -> Self {
        let dx = self.width() * margin;
        let dy = self.height() * margin;
        Self {
            x_min: (self.x_min - dx).max(0.0),
            y_min: (self.y_min - dy).max(0.0),
            x_max: (self.x_max + dx).min(image_width),
            y_max: (self.y_max + dy).min(image_height),
        }
    }
}

/// Pinhole camera approximation used for head-pose solving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraIntrinsics {
    pub focal_length: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl CameraIntrinsics {
    /// Focal length equal to the image width, principal point at the centre.
    pub fn from_image(width: f64, height: f64) -> Self {
        Self {
            focal_length: width,
            center_x: width / 2.0,
            center_y: height / 2.0,
        }
    }
}

/// Landmarks of the single tracked face.
///
/// Eye and pose points are normalized to `[0, 1]`; `face_box` is in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarks {
    pub image_width: u32,
    pub image_height: u32,
    pub left_eye: EyeLandmarks,
    pub right_eye: EyeLandmarks,
    /// Nose tip, chin, left eye corner, right eye corner, left and right mouth corners.
    pub pose_points: [Point; 6],
    pub face_box: BoundingBox,
}

impl FaceLandmarks {
    pub fn left_eye_px(&self) -> EyeLandmarks {
        self.left_eye
            .denormalize(self.image_width as f64, self.image_height as f64)
    }

    pub fn right_eye_px(&self) -> EyeLandmarks {
        self.right_eye
            .denormalize(self.image_width as f64, self.image_height as f64)
    }

    pub fn pose_points_px(&self) -> [Point; 6] {
        let (w, h) = (self.image_width as f64, self.image_height as f64);
        self.pose_points.map(|p| p.denormalize(w, h))
    }

    pub fn camera(&self) -> CameraIntrinsics {
        CameraIntrinsics::from_image(self.image_width as f64, self.image_height as f64)
    }
}

pub trait LandmarkProvider: Send + Sync {
    /// `Ok(None)` when no face is in the frame.
    fn detect<'a>(
        &'a self,
        image: &'a FrameImage,
    ) -> BoxFuture<'a, Result<Option<FaceLandmarks>, PerceptionError>>;
}

pub trait HeadPoseProvider: Send + Sync {
    fn estimate<'a>(
        &'a self,
        points: &'a [Point; 6],
        camera: CameraIntrinsics,
    ) -> BoxFuture<'a, Result<HeadPose, PerceptionError>>;
}

pub trait GazeProvider: Send + Sync {
    fn is_ready(&self) -> bool;

    /// The returned future owns its inputs so it can outlive the caller.
    fn predict(
        &self,
        image: FrameImage,
        face_box: BoundingBox,
    ) -> BoxFuture<'static, Result<GazeAngles, PerceptionError>>;
}

/// Shared handle to all perception collaborators.
#[derive(Clone)]
pub struct Perception {
    landmarks: Arc<dyn LandmarkProvider>,
    head_pose: Arc<dyn HeadPoseProvider>,
    gaze: Arc<dyn GazeProvider>,
    gate: InferenceGate,
    mode: &'static str,
}

impl Perception {
    pub fn new(
        landmarks: Arc<dyn LandmarkProvider>,
        head_pose: Arc<dyn HeadPoseProvider>,
        gaze: Arc<dyn GazeProvider>,
        max_concurrent_inference: usize,
    ) -> Self {
        Self {
            landmarks,
            head_pose,
            gaze,
            gate: InferenceGate::new(max_concurrent_inference),
            mode: "custom",
        }
    }

    pub fn mock(max_concurrent_inference: usize) -> Self {
        let mock = Arc::new(MockPerception::default());
        Self {
            mode: "mock",
            ..Self::new(mock.clone(), mock.clone(), mock, max_concurrent_inference)
        }
    }

    /// Builds the configured backend. The HTTP backend probes gaze readiness
    /// once here; the answer holds for the life of the process.
    pub async fn from_config(config: &PerceptionConfig) -> Result<Self, PerceptionError> {
        if config.mock {
            return Ok(Self::mock(config.max_concurrent_inference));
        }
        let http = Arc::new(HttpPerception::connect(config).await?);
        Ok(Self {
            mode: "http",
            ..Self::new(
                http.clone(),
                http.clone(),
                http,
                config.max_concurrent_inference,
            )
        })
    }

    /// Panics when the HTTP backend is selected without a sidecar URL.
    pub fn validate_config(config: &PerceptionConfig) {
        if !config.mock && config.base_url.trim().is_empty() {
            panic!(
                "Invalid perception configuration: PERCEPTION_MOCK=false \
                 but PERCEPTION_URL is empty. Set PERCEPTION_URL or PERCEPTION_MOCK=true."
            );
        }
    }

    pub fn landmarks(&self) -> &dyn LandmarkProvider {
        self.landmarks.as_ref()
    }

    pub fn head_pose(&self) -> &dyn HeadPoseProvider {
        self.head_pose.as_ref()
    }

    pub fn gaze_ready(&self) -> bool {
        self.gaze.is_ready()
    }

    /// Runs gaze inference behind the shared concurrency gate.
    pub async fn predict_gaze(
        &self,
        image: FrameImage,
        face_box: BoundingBox,
    ) -> Result<GazeAngles, PerceptionError> {
        self.gate.run(self.gaze.predict(image, face_box)).await
    }

    pub fn gate(&self) -> &InferenceGate {
        &self.gate
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_uses_width_as_focal_length() {
        let cam = CameraIntrinsics::from_image(640.0, 480.0);
        assert_eq!(cam.focal_length, 640.0);
        assert_eq!(cam.center_x, 320.0);
        assert_eq!(cam.center_y, 240.0);
    }

    #[test]
    fn expand_adds_margin_and_clamps() {
        let bbox = BoundingBox {
            x_min: 100.0,
            y_min: 50.0,
            x_max: 200.0,
            y_max: 150.0,
        };
        let grown = bbox.expand(0.2, 640.0, 480.0);
        assert_eq!(grown.x_min, 80.0);
        assert_eq!(grown.y_min, 30.0);
        assert_eq!(grown.x_max, 220.0);
        assert_eq!(grown.y_max, 170.0);

        let edge = BoundingBox {
            x_min: 5.0,
            y_min: 5.0,
            x_max: 635.0,
            y_max: 475.0,
        }
        .expand(0.2, 640.0, 480.0);
        assert_eq!(edge.x_min, 0.0);
        assert_eq!(edge.y_min, 0.0);
        assert_eq!(edge.x_max, 640.0);
        assert_eq!(edge.y_max, 480.0);
    }

    #[tokio::test]
    async fn mock_backend_reports_mode_and_no_gaze() {
        let perception = Perception::mock(2);
        assert_eq!(perception.mode(), "mock");
        assert!(!perception.gaze_ready());
    }

    #[test]
    #[should_panic(expected = "PERCEPTION_URL")]
    fn validate_rejects_http_without_url() {
        Perception::validate_config(&PerceptionConfig {
            mock: false,
            ..PerceptionConfig::default()
        });
    }
}

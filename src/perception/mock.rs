use attention_core::{EyeLandmarks, GazeAngles, HeadPose, Point};
use futures::future::{self, BoxFuture};
use futures::FutureExt;

use super::{
    BoundingBox, CameraIntrinsics, FaceLandmarks, FrameImage, GazeProvider, HeadPoseProvider,
    LandmarkProvider, PerceptionError,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Offline stand-in: every frame shows one frontal face with open eyes
/// (EAR 0.3) and a neutral head pose. Gaze inference is never ready.
#[derive(Debug, Clone)]
pub struct MockPerception {
    face: FaceLandmarks,
}

impl Default for MockPerception {
    fn default() -> Self {
        Self {
            face: frontal_face(),
        }
    }
}

impl MockPerception {
    pub fn face(&self) -> &FaceLandmarks {
        &self.face
    }
}

fn normalized(x: f64, y: f64) -> Point {
    Point::new(x / WIDTH as f64, y / HEIGHT as f64)
}

/// Open eye 60px wide with 18px lid spans, left corner at `(x, y)`.
fn open_eye(x: f64, y: f64) -> EyeLandmarks {
    EyeLandmarks::new([
        normalized(x, y),
        normalized(x + 15.0, y - 9.0),
        normalized(x + 45.0, y - 9.0),
        normalized(x + 60.0, y),
        normalized(x + 45.0, y + 9.0),
        normalized(x + 15.0, y + 9.0),
    ])
}

fn frontal_face() -> FaceLandmarks {
    FaceLandmarks {
        image_width: WIDTH,
        image_height: HEIGHT,
        left_eye: open_eye(230.0, 200.0),
        right_eye: open_eye(350.0, 200.0),
        pose_points: [
            normalized(320.0, 260.0),
            normalized(320.0, 360.0),
            normalized(230.0, 200.0),
            normalized(410.0, 200.0),
            normalized(280.0, 310.0),
            normalized(360.0, 310.0),
        ],
        face_box: BoundingBox {
            x_min: 200.0,
            y_min: 140.0,
            x_max: 440.0,
            y_max: 380.0,
        },
    }
}

impl LandmarkProvider for MockPerception {
    fn detect<'a>(
        &'a self,
        _image: &'a FrameImage,
    ) -> BoxFuture<'a, Result<Option<FaceLandmarks>, PerceptionError>> {
        future::ready(Ok(Some(self.face.clone()))).boxed()
    }
}

impl HeadPoseProvider for MockPerception {
    fn estimate<'a>(
        &'a self,
        _points: &'a [Point; 6],
        _camera: CameraIntrinsics,
    ) -> BoxFuture<'a, Result<HeadPose, PerceptionError>> {
        future::ready(Ok(HeadPose::default())).boxed()
    }
}

impl GazeProvider for MockPerception {
    fn is_ready(&self) -> bool {
        false
    }

    fn predict(
        &self,
        _image: FrameImage,
        _face_box: BoundingBox,
    ) -> BoxFuture<'static, Result<GazeAngles, PerceptionError>> {
        future::ready(Err(PerceptionError::Unavailable(
            "gaze model not loaded in mock mode".to_string(),
        )))
        .boxed()
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use attention_core::{EyeLandmarks, GazeAngles, HeadPose, Point};
use attention_monitor::perception::{
    BoundingBox, CameraIntrinsics, FaceLandmarks, FrameImage, GazeProvider, HeadPoseProvider,
    LandmarkProvider, Perception, PerceptionError,
};
use futures::future::{self, BoxFuture};
use futures::FutureExt;

pub const OPEN_EAR: f64 = 0.3;
pub const CLOSED_EAR: f64 = 0.1;

/// A frame that any test perception accepts: base64 of "frame".
pub const FRAME: &str = r#"{"image": "ZnJhbWU="}"#;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;

struct Script {
    face: Option<FaceLandmarks>,
    pose: Result<HeadPose, PerceptionError>,
    gaze: Result<GazeAngles, PerceptionError>,
    gaze_delay: Option<Duration>,
}

/// Perception stub driven by the test: each call answers with whatever the
/// script currently holds.
pub struct ScriptedPerception {
    script: Mutex<Script>,
    gaze_ready: AtomicBool,
    landmark_calls: AtomicUsize,
    gaze_calls: AtomicUsize,
    gaze_finished: Arc<AtomicUsize>,
}

impl ScriptedPerception {
    pub fn new(gaze_ready: bool) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                face: Some(face_with_ear(OPEN_EAR)),
                pose: Ok(HeadPose::default()),
                gaze: Ok(GazeAngles::default()),
                gaze_delay: None,
            }),
            gaze_ready: AtomicBool::new(gaze_ready),
            landmark_calls: AtomicUsize::new(0),
            gaze_calls: AtomicUsize::new(0),
            gaze_finished: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn perception(self: &Arc<Self>) -> Perception {
        Perception::new(self.clone(), self.clone(), self.clone(), 2)
    }

    pub fn set_ear(&self, ear: f64) {
        self.script.lock().expect("script lock").face = Some(face_with_ear(ear));
    }

    pub fn hide_face(&self) {
        self.script.lock().expect("script lock").face = None;
    }

    pub fn set_pose(&self, pose: HeadPose) {
        self.script.lock().expect("script lock").pose = Ok(pose);
    }

    pub fn fail_pose(&self, err: PerceptionError) {
        self.script.lock().expect("script lock").pose = Err(err);
    }

    pub fn set_gaze(&self, gaze: GazeAngles) {
        self.script.lock().expect("script lock").gaze = Ok(gaze);
    }

    pub fn fail_gaze(&self, err: PerceptionError) {
        self.script.lock().expect("script lock").gaze = Err(err);
    }

    /// Every later gaze call sleeps this long before answering.
    pub fn set_gaze_delay(&self, delay: Duration) {
        self.script.lock().expect("script lock").gaze_delay = Some(delay);
    }

    pub fn set_gaze_ready(&self, ready: bool) {
        self.gaze_ready.store(ready, Ordering::SeqCst);
    }

    pub fn landmark_calls(&self) -> usize {
        self.landmark_calls.load(Ordering::SeqCst)
    }

    pub fn gaze_calls(&self) -> usize {
        self.gaze_calls.load(Ordering::SeqCst)
    }

    /// Gaze calls that ran to completion, whether or not anyone awaited them.
    pub fn gaze_finished(&self) -> usize {
        self.gaze_finished.load(Ordering::SeqCst)
    }
}

fn normalized(x: f64, y: f64) -> Point {
    Point::new(x / WIDTH, y / HEIGHT)
}

/// 60px wide eye whose lid spans give exactly `ear`.
fn eye(x: f64, y: f64, ear: f64) -> EyeLandmarks {
    let half = ear * 60.0 / 2.0;
    EyeLandmarks::new([
        normalized(x, y),
        normalized(x + 15.0, y - half),
        normalized(x + 45.0, y - half),
        normalized(x + 60.0, y),
        normalized(x + 45.0, y + half),
        normalized(x + 15.0, y + half),
    ])
}

pub fn face_with_ear(ear: f64) -> FaceLandmarks {
    FaceLandmarks {
        image_width: WIDTH as u32,
        image_height: HEIGHT as u32,
        left_eye: eye(230.0, 200.0, ear),
        right_eye: eye(350.0, 200.0, ear),
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

impl LandmarkProvider for ScriptedPerception {
    fn detect<'a>(
        &'a self,
        _image: &'a FrameImage,
    ) -> BoxFuture<'a, Result<Option<FaceLandmarks>, PerceptionError>> {
        self.landmark_calls.fetch_add(1, Ordering::SeqCst);
        let face = self.script.lock().expect("script lock").face.clone();
        future::ready(Ok(face)).boxed()
    }
}

impl HeadPoseProvider for ScriptedPerception {
    fn estimate<'a>(
        &'a self,
        _points: &'a [Point; 6],
        _camera: CameraIntrinsics,
    ) -> BoxFuture<'a, Result<HeadPose, PerceptionError>> {
        let pose = self.script.lock().expect("script lock").pose.clone();
        future::ready(pose).boxed()
    }
}

impl GazeProvider for ScriptedPerception {
    fn is_ready(&self) -> bool {
        self.gaze_ready.load(Ordering::SeqCst)
    }

    fn predict(
        &self,
        _image: FrameImage,
        _face_box: BoundingBox,
    ) -> BoxFuture<'static, Result<GazeAngles, PerceptionError>> {
        self.gaze_calls.fetch_add(1, Ordering::SeqCst);
        let (gaze, delay) = {
            let script = self.script.lock().expect("script lock");
            (script.gaze.clone(), script.gaze_delay)
        };
        let finished = self.gaze_finished.clone();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            finished.fetch_add(1, Ordering::SeqCst);
            gaze
        }
        .boxed()
    }
}

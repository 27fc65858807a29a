//! Attention signal processing
//!
//! Turns per-frame facial signal estimates (gaze angles, head-pose angles and
//! eye aspect ratio) into a temporally smoothed attention verdict for a single
//! monitored subject. Everything here is synchronous and allocation-light so a
//! session can run one frame at a time inside a connection loop.
//!
//! ## Modules
//! - `smoothing`: adaptive low-pass ("1€") filter, scalar and multi-axis
//! - `ear`: eye aspect ratio from six eye landmarks and closure classification
//! - `blink`: sliding-window blink-rate estimator
//! - `drowsiness`: sustained eye-closure state machine
//! - `engagement`: gaze/pose/blink fusion into an engagement index
//! - `session`: per-connection orchestration of all of the above

pub mod blink;
pub mod config;
pub mod drowsiness;
pub mod ear;
pub mod engagement;
pub mod session;
pub mod smoothing;
pub mod types;

pub use blink::BlinkRateTracker;
pub use config::AttentionConfig;
pub use drowsiness::DrowsinessTracker;
pub use ear::{EyeClosureClassifier, EyeLandmarks};
pub use engagement::{AttentionStatus, EngagementSample, EngagementScorer};
pub use session::{AttentionSession, FrameReport};
pub use smoothing::{MultiAxisFilter, OneEuroFilter};
pub use types::{GazeAngles, HeadPose, Point, RawFrameSignals};

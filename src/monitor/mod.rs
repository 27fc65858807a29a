//! Per-connection monitor loop body: one inbound frame in, one message out.

pub mod protocol;

use std::sync::Arc;

use attention_core::{AttentionConfig, AttentionSession, RawFrameSignals};

use crate::constants::GAZE_CROP_MARGIN;
use crate::metrics::{track_stage, MetricsRegistry, Stage};
use crate::perception::{FrameImage, ImageDecodeError, Perception, PerceptionError};
use protocol::{InboundFrame, MonitorMessage};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing 'image' field")]
    MissingImage,
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageDecodeError),
    #[error("frame too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
    #[error(transparent)]
    Perception(#[from] PerceptionError),
}

/// Parses an inbound `{"image": "..."}` message and decodes its image.
pub fn decode_frame(text: &str, max_frame_bytes: usize) -> Result<FrameImage, FrameError> {
    if text.len() > max_frame_bytes {
        return Err(FrameError::TooLarge {
            size: text.len(),
            max: max_frame_bytes,
        });
    }
    let inbound: InboundFrame = serde_json::from_str(text)?;
    let payload = inbound.image.ok_or(FrameError::MissingImage)?;
    Ok(FrameImage::decode(&payload)?)
}

pub struct MonitorSession {
    id: String,
    attention: AttentionSession,
    perception: Perception,
    metrics: Arc<MetricsRegistry>,
    /// Fixed when the session opens.
    gaze_available: bool,
    max_frame_bytes: usize,
}

impl MonitorSession {
    pub fn new(
        config: AttentionConfig,
        perception: Perception,
        metrics: Arc<MetricsRegistry>,
        max_frame_bytes: usize,
    ) -> Self {
        let gaze_available = perception.gaze_ready();
        let id = uuid::Uuid::new_v4().to_string();
        if !gaze_available {
            tracing::info!(session_id = %id, "Gaze model unavailable, using head-pose proxy");
        }
        Self {
            id,
            attention: AttentionSession::new(config),
            perception,
            metrics,
            gaze_available,
            max_frame_bytes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gaze_available(&self) -> bool {
        self.gaze_available
    }

    pub fn frames_processed(&self) -> u64 {
        self.attention.frames_processed()
    }

    /// Processes one inbound text message. On error the session state is
    /// left exactly as it was before the call.
    pub async fn handle_text(
        &mut self,
        text: &str,
        timestamp: f64,
    ) -> Result<MonitorMessage, FrameError> {
        let result = track_stage!(self.metrics, Stage::Frame, self.process(text, timestamp).await);
        match &result {
            Ok(msg) => tracing::debug!(
                session_id = %self.id,
                frame = self.attention.frames_processed(),
                status = msg.status.as_str(),
                score = msg.attention_score,
                "frame processed"
            ),
            Err(e) => tracing::warn!(session_id = %self.id, error = %e, "frame rejected"),
        }
        result
    }

    async fn process(&mut self, text: &str, timestamp: f64) -> Result<MonitorMessage, FrameError> {
        let image = track_stage!(
            self.metrics,
            Stage::Decode,
            decode_frame(text, self.max_frame_bytes)
        )?;

        let face = track_stage!(
            self.metrics,
            Stage::Landmarks,
            self.perception.landmarks().detect(&image).await
        )?;
        let Some(face) = face else {
            self.metrics.no_face_frame();
            let report = self.attention.process(&RawFrameSignals::no_face(timestamp));
            return Ok(MonitorMessage::from(&report));
        };

        let points = face.pose_points_px();
        let pose = track_stage!(
            self.metrics,
            Stage::HeadPose,
            self.perception.head_pose().estimate(&points, face.camera()).await
        )?;

        let gaze = if self.gaze_available {
            let crop = face.face_box.expand(
                GAZE_CROP_MARGIN,
                face.image_width as f64,
                face.image_height as f64,
            );
            let predicted = track_stage!(
                self.metrics,
                Stage::Gaze,
                self.perception.predict_gaze(image, crop).await
            );
            match predicted {
                Ok(gaze) => gaze,
                Err(e) => {
                    tracing::warn!(session_id = %self.id, error = %e, "Gaze inference failed, using head-pose proxy");
                    self.metrics.gaze_fallback();
                    pose.gaze_proxy()
                }
            }
        } else {
            pose.gaze_proxy()
        };

        let left_ear = face.left_eye_px().aspect_ratio();
        let right_ear = face.right_eye_px().aspect_ratio();
        let signals = RawFrameSignals::new(gaze, pose, left_ear, right_ear, timestamp);
        let report = self.attention.process(&signals);
        Ok(MonitorMessage::from(&report))
    }

    /// Releases all per-session state.
    pub fn close(&mut self) {
        tracing::info!(
            session_id = %self.id,
            frames = self.attention.frames_processed(),
            "Monitor session closed"
        );
        self.attention.reset();
    }
}

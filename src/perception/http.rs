use std::time::Duration;

use attention_core::{GazeAngles, HeadPose, Point};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    BoundingBox, CameraIntrinsics, FaceLandmarks, FrameImage, GazeProvider, HeadPoseProvider,
    LandmarkProvider, PerceptionError,
};
use crate::config::PerceptionConfig;

/// Client for an out-of-process perception sidecar.
#[derive(Clone)]
pub struct HttpPerception {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    gaze_ready: bool,
}

#[derive(Serialize)]
struct ImageRequest {
    image: String,
}

#[derive(Deserialize)]
struct LandmarksResponse {
    face: Option<FaceLandmarks>,
}

#[derive(Serialize)]
struct HeadPoseRequest<'a> {
    points: &'a [Point; 6],
    camera: CameraIntrinsics,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GazeRequest {
    image: String,
    face_box: BoundingBox,
}

#[derive(Deserialize)]
struct ReadyResponse {
    ready: bool,
}

impl From<reqwest::Error> for PerceptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PerceptionError::Timeout
        } else if e.is_decode() {
            PerceptionError::InvalidResponse(e.to_string())
        } else {
            PerceptionError::Network(e.to_string())
        }
    }
}

impl HttpPerception {
    pub fn new(config: &PerceptionConfig) -> Result<Self, PerceptionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PerceptionError::Unavailable(format!("http client: {e}")))?;
        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            gaze_ready: false,
        })
    }

    /// Builds the client and probes gaze readiness once.
    pub async fn connect(config: &PerceptionConfig) -> Result<Self, PerceptionError> {
        let mut perception = Self::new(config)?;
        perception.gaze_ready = match perception.probe_gaze().await {
            Ok(ready) => ready,
            Err(e) => {
                tracing::warn!(error = %e, "Gaze readiness probe failed, using head-pose proxy");
                false
            }
        };
        tracing::info!(
            base_url = %perception.base_url,
            gaze_ready = perception.gaze_ready,
            "Perception sidecar configured"
        );
        Ok(perception)
    }

    async fn probe_gaze(&self) -> Result<bool, PerceptionError> {
        let resp = self
            .authorized(self.client.get(self.url("/v1/gaze/ready")))
            .send()
            .await?;
        let body: ReadyResponse = Self::read_json(resp).await?;
        Ok(body.ready)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn post_json<B, R>(request: reqwest::RequestBuilder, body: &B) -> Result<R, PerceptionError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = request.json(body).send().await?;
        Self::read_json(resp).await
    }

    async fn read_json<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, PerceptionError> {
        let status = resp.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(PerceptionError::Unavailable(format!("sidecar returned {status}")));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PerceptionError::Failed(format!("status {status}: {text}")));
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| PerceptionError::InvalidResponse(e.to_string()))
    }
}

impl LandmarkProvider for HttpPerception {
    fn detect<'a>(
        &'a self,
        image: &'a FrameImage,
    ) -> BoxFuture<'a, Result<Option<FaceLandmarks>, PerceptionError>> {
        async move {
            let request = self.authorized(self.client.post(self.url("/v1/landmarks")));
            let body = ImageRequest {
                image: image.to_base64(),
            };
            let resp: LandmarksResponse =
                Self::post_json(request, &body).await?;
            Ok(resp.face)
        }
        .boxed()
    }
}

impl HeadPoseProvider for HttpPerception {
    fn estimate<'a>(
        &'a self,
        points: &'a [Point; 6],
        camera: CameraIntrinsics,
    ) -> BoxFuture<'a, Result<HeadPose, PerceptionError>> {
        async move {
            let request = self.authorized(self.client.post(self.url("/v1/head-pose")));
            let body = HeadPoseRequest { points, camera };
            Self::post_json(request, &body).await
        }
        .boxed()
    }
}

impl GazeProvider for HttpPerception {
    fn is_ready(&self) -> bool {
        self.gaze_ready
    }

    fn predict(
        &self,
        image: FrameImage,
        face_box: BoundingBox,
    ) -> BoxFuture<'static, Result<GazeAngles, PerceptionError>> {
        let request = self.authorized(self.client.post(self.url("/v1/gaze")));
        async move {
            let body = GazeRequest {
                image: image.to_base64(),
                face_box,
            };
            Self::post_json(request, &body).await
        }
        .boxed()
    }
}

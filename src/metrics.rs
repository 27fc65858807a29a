use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

// microseconds; the last bucket catches everything slower than 5s
const LATENCY_BUCKETS: [u64; 6] = [5_000, 20_000, 50_000, 200_000, 1_000_000, u64::MAX];
const BUCKET_MIDPOINTS_MS: [f64; 6] = [2.5, 12.5, 35.0, 125.0, 600.0, 2_500.0];

/// One timed step of frame processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Landmarks,
    HeadPose,
    Gaze,
    Frame,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Decode,
        Stage::Landmarks,
        Stage::HeadPose,
        Stage::Gaze,
        Stage::Frame,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Landmarks => "landmarks",
            Stage::HeadPose => "head_pose",
            Stage::Gaze => "gaze",
            Stage::Frame => "frame",
        }
    }

    fn index(self) -> usize {
        match self {
            Stage::Decode => 0,
            Stage::Landmarks => 1,
            Stage::HeadPose => 2,
            Stage::Gaze => 3,
            Stage::Frame => 4,
        }
    }
}

#[derive(Default)]
pub struct StageMetrics {
    pub call_count: AtomicU64,
    pub total_latency_us: AtomicU64,
    pub error_count: AtomicU64,
    pub last_called_at: AtomicI64,
    latency_buckets: [AtomicU64; 6],
}

impl StageMetrics {
    fn record(&self, latency_us: u64, is_error: bool) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        if is_error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(i) = LATENCY_BUCKETS.iter().position(|&t| latency_us <= t) {
            self.latency_buckets[i].fetch_add(1, Ordering::Relaxed);
        }
        self.last_called_at
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Approximate p50/p95/p99 in milliseconds, from bucket midpoints.
    pub fn percentiles_ms(&self) -> (f64, f64, f64) {
        let counts: Vec<u64> = self
            .latency_buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }

        let percentile = |pct: f64| -> f64 {
            let target = (pct / 100.0 * total as f64).ceil() as u64;
            let mut cumulative = 0u64;
            for (i, &count) in counts.iter().enumerate() {
                cumulative += count;
                if cumulative >= target {
                    return BUCKET_MIDPOINTS_MS[i];
                }
            }
            BUCKET_MIDPOINTS_MS[5]
        };

        (percentile(50.0), percentile(95.0), percentile(99.0))
    }

    fn snapshot(&self) -> StageSnapshot {
        let call_count = self.call_count.load(Ordering::Relaxed);
        let total_latency_us = self.total_latency_us.load(Ordering::Relaxed);
        let (p50_ms, p95_ms, p99_ms) = self.percentiles_ms();
        StageSnapshot {
            call_count,
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: if call_count == 0 {
                0.0
            } else {
                total_latency_us as f64 / call_count as f64 / 1_000.0
            },
            p50_ms,
            p95_ms,
            p99_ms,
            last_called_at: match self.last_called_at.load(Ordering::Relaxed) {
                0 => None,
                ms => chrono::DateTime::from_timestamp_millis(ms),
            },
        }
    }
}

/// Process-wide counters for the monitor pipeline.
#[derive(Default)]
pub struct MetricsRegistry {
    stages: [StageMetrics; 5],
    sessions_opened: AtomicU64,
    sessions_rejected: AtomicU64,
    no_face_frames: AtomicU64,
    gaze_fallbacks: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stage: Stage, latency_us: u64, is_error: bool) {
        self.stages[stage.index()].record(latency_us, is_error);
    }

    pub fn stage(&self, stage: Stage) -> &StageMetrics {
        &self.stages[stage.index()]
    }

    pub fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_rejected(&self) {
        self.sessions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn no_face_frame(&self) {
        self.no_face_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn gaze_fallback(&self) {
        self.gaze_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_rejected: self.sessions_rejected.load(Ordering::Relaxed),
            no_face_frames: self.no_face_frames.load(Ordering::Relaxed),
            gaze_fallbacks: self.gaze_fallbacks.load(Ordering::Relaxed),
            stages: Stage::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), self.stage(*s).snapshot()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    pub call_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub last_called_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub sessions_opened: u64,
    pub sessions_rejected: u64,
    pub no_face_frames: u64,
    pub gaze_fallbacks: u64,
    pub stages: std::collections::BTreeMap<String, StageSnapshot>,
}

/// Times `$block` and records it against `$stage`. The block must evaluate to a `Result`.
macro_rules! track_stage {
    ($registry:expr, $stage:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let latency_us = start.elapsed().as_micros() as u64;
        $registry.record($stage, latency_us, result.is_err());
        result
    }};
}

pub(crate) use track_stage;

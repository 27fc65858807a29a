use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use attention_core::config::{EngagementWeights, ScoringConfig};
use attention_core::smoothing::FilterParams;
use attention_core::AttentionConfig;

use crate::constants::{DEFAULT_MAX_FRAME_BYTES, DEFAULT_MAX_MONITOR_CONNECTIONS};

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub limits: LimitsConfig,
    pub perception: PerceptionConfig,
    pub attention: AttentionEnvConfig,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_monitor_connections: usize,
    pub max_frame_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_monitor_connections: DEFAULT_MAX_MONITOR_CONNECTIONS,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct PerceptionConfig {
    pub mock: bool,
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_concurrent_inference: usize,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            mock: true,
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 10,
            max_concurrent_inference: 2,
        }
    }
}

/// Attention thresholds as read from the environment.
#[derive(Debug, Clone)]
pub struct AttentionEnvConfig {
    pub ear_closed_threshold: f64,
    pub ear_semi_closed_threshold: f64,
    pub gaze_yaw_threshold: f64,
    pub pose_yaw_threshold: f64,
    pub pose_pitch_threshold: f64,
    pub blink_rate_min: f64,
    pub blink_rate_max: f64,
    pub weight_gaze: f64,
    pub weight_pose: f64,
    pub weight_blink: f64,
    pub engaged_threshold: f64,
    pub drowsiness_secs: f64,
    pub blink_window_secs: f64,
    pub reset_blink_window_on_face_loss: bool,
}

impl Default for AttentionEnvConfig {
    fn default() -> Self {
        Self::from_attention(&AttentionConfig::default())
    }
}

impl AttentionEnvConfig {
    fn from_attention(cfg: &AttentionConfig) -> Self {
        let s = &cfg.scoring;
        Self {
            ear_closed_threshold: cfg.ear_closed_threshold,
            ear_semi_closed_threshold: s.ear_semi_closed_threshold,
            gaze_yaw_threshold: s.gaze_yaw_threshold,
            pose_yaw_threshold: s.pose_yaw_threshold,
            pose_pitch_threshold: s.pose_pitch_threshold,
            blink_rate_min: s.blink_rate_min,
            blink_rate_max: s.blink_rate_max,
            weight_gaze: s.weights.gaze,
            weight_pose: s.weights.pose,
            weight_blink: s.weights.blink,
            engaged_threshold: s.engaged_threshold,
            drowsiness_secs: cfg.drowsiness_threshold_secs,
            blink_window_secs: cfg.blink_window_secs,
            reset_blink_window_on_face_loss: cfg.reset_blink_window_on_face_loss,
        }
    }

    fn from_env() -> Self {
        let d = Self::default();
        Self {
            ear_closed_threshold: env_or_parse("ATTENTION_EAR_CLOSED_THRESHOLD", d.ear_closed_threshold),
            ear_semi_closed_threshold: env_or_parse(
                "ATTENTION_EAR_SEMI_CLOSED_THRESHOLD",
                d.ear_semi_closed_threshold,
            ),
            gaze_yaw_threshold: env_or_parse("ATTENTION_GAZE_YAW_THRESHOLD", d.gaze_yaw_threshold),
            pose_yaw_threshold: env_or_parse("ATTENTION_POSE_YAW_THRESHOLD", d.pose_yaw_threshold),
            pose_pitch_threshold: env_or_parse(
                "ATTENTION_POSE_PITCH_THRESHOLD",
                d.pose_pitch_threshold,
            ),
            blink_rate_min: env_or_parse("ATTENTION_BLINK_RATE_MIN", d.blink_rate_min),
            blink_rate_max: env_or_parse("ATTENTION_BLINK_RATE_MAX", d.blink_rate_max),
            weight_gaze: env_or_parse("ATTENTION_WEIGHT_GAZE", d.weight_gaze),
            weight_pose: env_or_parse("ATTENTION_WEIGHT_POSE", d.weight_pose),
            weight_blink: env_or_parse("ATTENTION_WEIGHT_BLINK", d.weight_blink),
            engaged_threshold: env_or_parse("ATTENTION_ENGAGED_THRESHOLD", d.engaged_threshold),
            drowsiness_secs: env_or_parse("ATTENTION_DROWSINESS_SECS", d.drowsiness_secs),
            blink_window_secs: env_or_parse("ATTENTION_BLINK_WINDOW_SECS", d.blink_window_secs),
            reset_blink_window_on_face_loss: env_or_bool(
                "ATTENTION_RESET_BLINK_WINDOW_ON_FACE_LOSS",
                d.reset_blink_window_on_face_loss,
            ),
        }
    }

    /// Builds the core pipeline configuration. Filter tuning is not exposed
    /// through the environment.
    pub fn to_attention_config(&self) -> AttentionConfig {
        AttentionConfig {
            ear_closed_threshold: self.ear_closed_threshold,
            scoring: ScoringConfig {
                gaze_yaw_threshold: self.gaze_yaw_threshold,
                pose_yaw_threshold: self.pose_yaw_threshold,
                pose_pitch_threshold: self.pose_pitch_threshold,
                blink_rate_min: self.blink_rate_min,
                blink_rate_max: self.blink_rate_max,
                weights: EngagementWeights {
                    gaze: self.weight_gaze,
                    pose: self.weight_pose,
                    blink: self.weight_blink,
                },
                engaged_threshold: self.engaged_threshold,
                ear_semi_closed_threshold: self.ear_semi_closed_threshold,
            },
            drowsiness_threshold_secs: self.drowsiness_secs,
            blink_window_secs: self.blink_window_secs,
            reset_blink_window_on_face_loss: self.reset_blink_window_on_face_loss,
            gaze_filter: FilterParams::GAZE,
            pose_filter: FilterParams::POSE,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("cors_origin", &self.cors_origin)
            .field("limits", &self.limits)
            .field("perception", &self.perception)
            .field("attention", &self.attention)
            .finish()
    }
}

impl fmt::Debug for PerceptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerceptionConfig")
            .field("mock", &self.mock)
            .field("base_url", &self.base_url)
            .field("api_key", &"***REDACTED***")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrent_inference", &self.max_concurrent_inference)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 8000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:3000"),
            limits: LimitsConfig {
                max_monitor_connections: env_or_parse(
                    "MAX_MONITOR_CONNECTIONS",
                    DEFAULT_MAX_MONITOR_CONNECTIONS,
                ),
                max_frame_bytes: env_or_parse("MAX_FRAME_BYTES", DEFAULT_MAX_FRAME_BYTES),
            },
            perception: PerceptionConfig {
                mock: env_or_bool("PERCEPTION_MOCK", true),
                base_url: env_or("PERCEPTION_URL", ""),
                api_key: env_or("PERCEPTION_API_KEY", ""),
                timeout_secs: env_or_parse("PERCEPTION_TIMEOUT_SECS", 10_u64),
                max_concurrent_inference: env_or_parse("PERCEPTION_MAX_CONCURRENT_INFERENCE", 2_usize)
                    .max(1),
            },
            attention: AttentionEnvConfig::from_env(),
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

use std::sync::Arc;

use axum::Router;
use tokio::sync::broadcast;

use attention_monitor::config::{AttentionEnvConfig, Config, LimitsConfig, PerceptionConfig};
use attention_monitor::perception::Perception;
use attention_monitor::routes::build_router;
use attention_monitor::state::AppState;

use super::perception::ScriptedPerception;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub shutdown_tx: broadcast::Sender<()>,
}

/// Builds `Config` directly so parallel tests never race on `set_var`.
pub fn test_config() -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 0,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        limits: LimitsConfig {
            max_monitor_connections: 4,
            max_frame_bytes: 64 * 1024,
        },
        perception: PerceptionConfig::default(),
        attention: AttentionEnvConfig::default(),
    }
}

pub async fn spawn_with(config: Config, perception: Perception) -> TestApp {
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(&config, perception, shutdown_tx.clone());
    let app = build_router(state.clone());
    TestApp {
        app,
        state,
        config,
        shutdown_tx,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with(test_config(), Perception::mock(2)).await
}

pub async fn spawn_scripted_app(script: Arc<ScriptedPerception>) -> TestApp {
    spawn_with(test_config(), script.perception()).await
}

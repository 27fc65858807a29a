use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "attention-monitor";
const LOG_FILES_KEPT: usize = 14;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// Installs the global subscriber: human-readable stdout, plus daily JSON
/// files when enabled. `RUST_LOG` overrides `log_level`.
///
/// Calling it again once a subscriber is installed does nothing, so test
/// binaries that build several apps can all call it.
pub fn init_tracing(config: &LogConfig) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let file_layer = config.enable_file_logs.then(|| {
        fmt::layer()
            .with_writer(session_log_appender(Path::new(&config.log_dir)))
            .with_ansi(false)
            .json()
            .with_current_span(true)
    });

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    // losing a race against another initializer is fine
    if let Err(e) = result {
        if !tracing::dispatcher::has_been_set() {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}

/// Daily-rotated `attention-monitor.<date>.log` files under `dir`.
fn session_log_appender(dir: &Path) -> RollingFileAppender {
    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(LOG_FILES_KEPT)
        .build(dir)
    {
        Ok(appender) => appender,
        Err(e) => panic!("Failed to create log appender in {}: {e}", dir.display()),
    }
}

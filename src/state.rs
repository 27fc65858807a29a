use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use attention_core::AttentionConfig;
use tokio::sync::broadcast;

use crate::blink_counter::BlinkCounter;
use crate::config::Config;
use crate::metrics::MetricsRegistry;
use crate::perception::Perception;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    attention: Arc<AttentionConfig>,
    perception: Perception,
    metrics: Arc<MetricsRegistry>,
    blink_counter: Arc<BlinkCounter>,
    monitor_sessions: Arc<AtomicUsize>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config, perception: Perception, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self {
            attention: Arc::new(config.attention.to_attention_config()),
            config: Arc::new(config.clone()),
            perception,
            metrics: Arc::new(MetricsRegistry::new()),
            blink_counter: Arc::new(BlinkCounter::new()),
            monitor_sessions: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn attention_config(&self) -> &AttentionConfig {
        &self.attention
    }

    pub fn perception(&self) -> &Perception {
        &self.perception
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn blink_counter(&self) -> &BlinkCounter {
        &self.blink_counter
    }

    /// Reserves a monitor slot, or `None` when the limit is reached.
    /// The slot is released when the guard drops.
    pub fn try_acquire_monitor_slot(&self) -> Option<MonitorSlot> {
        let max = self.config.limits.max_monitor_connections;
        let current = self.monitor_sessions.fetch_add(1, Ordering::SeqCst);
        if current >= max {
            self.monitor_sessions.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(MonitorSlot {
            counter: self.monitor_sessions.clone(),
        })
    }

    pub fn active_monitor_sessions(&self) -> usize {
        self.monitor_sessions.load(Ordering::SeqCst)
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub struct MonitorSlot {
    counter: Arc<AtomicUsize>,
}

impl Drop for MonitorSlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

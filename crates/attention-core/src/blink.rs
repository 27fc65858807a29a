//! Blink-rate estimation
//!
//! A blink onset is an open→closed transition. Onset timestamps are kept in a
//! trailing window and converted into blinks per minute. Below two onsets the
//! estimate falls back to a mid-band value so a cold start or a long pause
//! does not read as an abnormal rate.

use std::collections::VecDeque;

/// Rate reported while fewer than two onsets are in the window.
pub const FALLBACK_BLINKS_PER_MINUTE: f64 = 13.0;
/// Upper bound on the reported rate.
pub const MAX_BLINKS_PER_MINUTE: f64 = 60.0;
pub const DEFAULT_WINDOW_SECS: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct BlinkRateTracker {
    window_secs: f64,
    onsets: VecDeque<f64>,
    last_closed: bool,
    last_rate: f64,
}

impl BlinkRateTracker {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs,
            onsets: VecDeque::with_capacity(64),
            last_closed: false,
            last_rate: FALLBACK_BLINKS_PER_MINUTE,
        }
    }

    /// Feeds one frame's closed/open state and returns blinks per minute.
    pub fn update(&mut self, is_closed: bool, timestamp: f64) -> f64 {
        if is_closed && !self.last_closed {
            self.onsets.push_back(timestamp);
        }
        self.last_closed = is_closed;

        let cutoff = timestamp - self.window_secs;
        while let Some(&front) = self.onsets.front() {
            if front <= cutoff {
                self.onsets.pop_front();
            } else {
                break;
            }
        }

        self.last_rate = self.rate_at(timestamp);
        self.last_rate
    }

    fn rate_at(&self, now: f64) -> f64 {
        if self.onsets.len() < 2 {
            return FALLBACK_BLINKS_PER_MINUTE;
        }
        let Some(&earliest) = self.onsets.front() else {
            return FALLBACK_BLINKS_PER_MINUTE;
        };
        let span = now - earliest;
        if span <= 0.0 {
            return FALLBACK_BLINKS_PER_MINUTE;
        }
        let rate = self.onsets.len() as f64 / span * 60.0;
        rate.min(MAX_BLINKS_PER_MINUTE)
    }

    /// Rate returned by the most recent `update`.
    pub fn last_rate(&self) -> f64 {
        self.last_rate
    }

    pub fn onset_count(&self) -> usize {
        self.onsets.len()
    }

    pub fn window_secs(&self) -> f64 {
        self.window_secs
    }

    pub fn reset(&mut self) {
        self.onsets.clear();
        self.last_closed = false;
        self.last_rate = FALLBACK_BLINKS_PER_MINUTE;
    }
}

impl Default for BlinkRateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SECS)
    }
}

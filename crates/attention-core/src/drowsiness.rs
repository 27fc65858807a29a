//! Sustained eye-closure ("asleep") detection
//!
//! Three-state machine: `Open → Closing { since } → Asleep`. Any open frame
//! returns to `Open` immediately; there is no hysteresis on waking.

pub const DEFAULT_THRESHOLD_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrowsinessState {
    Open,
    Closing { since: f64 },
    Asleep { since: f64 },
}

#[derive(Debug, Clone)]
pub struct DrowsinessTracker {
    threshold_secs: f64,
    state: DrowsinessState,
}

impl DrowsinessTracker {
    pub fn new(threshold_secs: f64) -> Self {
        Self {
            threshold_secs,
            state: DrowsinessState::Open,
        }
    }

    /// Returns `true` once eyes have stayed closed longer than the threshold.
    pub fn update(&mut self, eyes_closed: bool, timestamp: f64) -> bool {
        if !eyes_closed {
            self.state = DrowsinessState::Open;
            return false;
        }

        self.state = match self.state {
            DrowsinessState::Open => DrowsinessState::Closing { since: timestamp },
            DrowsinessState::Closing { since } if timestamp - since > self.threshold_secs => {
                DrowsinessState::Asleep { since }
            }
            other => other,
        };
        self.is_asleep()
    }

    pub fn is_asleep(&self) -> bool {
        matches!(self.state, DrowsinessState::Asleep { .. })
    }

    /// Start of the current closure, `None` while eyes are open.
    pub fn closed_since(&self) -> Option<f64> {
        match self.state {
            DrowsinessState::Open => None,
            DrowsinessState::Closing { since } | DrowsinessState::Asleep { since } => Some(since),
        }
    }

    pub fn state(&self) -> DrowsinessState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DrowsinessState::Open;
    }
}

impl Default for DrowsinessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_SECS)
    }
}

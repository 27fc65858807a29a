//! Adaptive low-pass ("1€") filter
//!
//! Speed-adaptive smoothing for noisy scalar signals (gaze pitch/yaw, head
//! yaw/pitch/roll). Slow signals get a low cutoff and heavy smoothing; fast
//! motion raises the cutoff so the output keeps up.
//!
//! Casiez, Roussel & Vogel (2012), "1€ Filter: A Simple Speed-based Low-pass
//! Filter for Noisy Input in Interactive Systems".

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Tuning shared by every axis of one filter bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// Expected sampling frequency (Hz) until timestamps say otherwise.
    pub frequency: f64,
    /// Minimum cutoff (Hz). Lower is smoother.
    pub min_cutoff: f64,
    /// Speed coefficient. Higher means less lag on fast motion.
    pub beta: f64,
    /// Cutoff used for the derivative (Hz).
    pub d_cutoff: f64,
}

impl FilterParams {
    pub const GAZE: Self = Self {
        frequency: 15.0,
        min_cutoff: 1.0,
        beta: 0.5,
        d_cutoff: 1.0,
    };

    pub const POSE: Self = Self {
        frequency: 15.0,
        min_cutoff: 0.8,
        beta: 0.5,
        d_cutoff: 1.0,
    };

    pub fn validate(&self) -> Result<(), String> {
        if !(self.frequency > 0.0) {
            return Err(format!("filter frequency must be > 0, got {}", self.frequency));
        }
        if !(self.min_cutoff > 0.0) || !(self.d_cutoff > 0.0) {
            return Err("filter cutoffs must be > 0".to_string());
        }
        if self.beta < 0.0 {
            return Err("filter beta must be >= 0".to_string());
        }
        Ok(())
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::GAZE
    }
}

/// `alpha = 1 / (1 + tau / te)` with `tau = 1 / (2π·cutoff)`, `te = 1 / frequency`.
fn smoothing_factor(cutoff: f64, frequency: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    let te = 1.0 / frequency;
    1.0 / (1.0 + tau / te)
}

#[derive(Debug, Clone, Copy, Default)]
struct LowPass {
    raw: Option<f64>,
    smoothed: Option<f64>,
}

impl LowPass {
    fn apply(&mut self, value: f64, alpha: f64) -> f64 {
        let out = match self.smoothed {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        self.raw = Some(value);
        self.smoothed = Some(out);
        out
    }

    fn reset(&mut self) {
        self.raw = None;
        self.smoothed = None;
    }
}

/// Single-axis 1€ filter. Holds the per-dimension filter state.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: FilterParams,
    sampling_frequency: f64,
    value: LowPass,
    derivative: LowPass,
    last_timestamp: Option<f64>,
}

impl OneEuroFilter {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            sampling_frequency: params.frequency,
            value: LowPass::default(),
            derivative: LowPass::default(),
            last_timestamp: None,
        }
    }

    /// Smooths `raw` observed at `timestamp` (seconds).
    ///
    /// Without timestamps the filter keeps its last known sampling frequency.
    /// The first call after construction or `reset` returns `raw` unchanged.
    pub fn filter(&mut self, raw: f64, timestamp: Option<f64>) -> f64 {
        if let (Some(ts), Some(last)) = (timestamp, self.last_timestamp) {
            let dt = ts - last;
            if dt > 0.0 {
                self.sampling_frequency = 1.0 / dt;
            }
        }
        self.last_timestamp = timestamp;

        let dx = match self.value.raw {
            Some(prev) => (raw - prev) * self.sampling_frequency,
            None => 0.0,
        };
        let d_alpha = smoothing_factor(self.params.d_cutoff, self.sampling_frequency);
        let edx = self.derivative.apply(dx, d_alpha);

        let cutoff = self.params.min_cutoff + self.params.beta * edx.abs();
        let alpha = smoothing_factor(cutoff, self.sampling_frequency);
        self.value.apply(raw, alpha)
    }

    pub fn reset(&mut self) {
        self.sampling_frequency = self.params.frequency;
        self.value.reset();
        self.derivative.reset();
        self.last_timestamp = None;
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    pub fn last_raw_value(&self) -> Option<f64> {
        self.value.raw
    }

    pub fn last_smoothed_derivative(&self) -> Option<f64> {
        self.derivative.smoothed
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }
}

/// N independent 1€ filters sharing one parameter set, one per axis.
#[derive(Debug, Clone)]
pub struct MultiAxisFilter<const N: usize> {
    axes: [OneEuroFilter; N],
}

impl<const N: usize> MultiAxisFilter<N> {
    pub fn new(params: FilterParams) -> Self {
        Self {
            axes: std::array::from_fn(|_| OneEuroFilter::new(params)),
        }
    }

    pub fn filter(&mut self, values: [f64; N], timestamp: Option<f64>) -> [f64; N] {
        let mut out = [0.0; N];
        for ((slot, axis), value) in out.iter_mut().zip(self.axes.iter_mut()).zip(values) {
            *slot = axis.filter(value, timestamp);
        }
        out
    }

    pub fn reset(&mut self) {
        for axis in &mut self.axes {
            axis.reset();
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::FraError;

/// Half-open sample range `[start, end)` inside one response window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleWindow {
    pub start: isize,
    pub end: isize,
}

impl SampleWindow {
    pub fn new(start: isize, end: isize) -> Self {
        Self { start, end }
    }

    /// Bounds are never clamped: anything outside `[0, len)` is an error.
    pub fn checked(&self, len: usize) -> Result<(usize, usize), FraError> {
        if self.start < 0 || self.end < 0 || self.end as usize >= len || self.start >= self.end {
            return Err(FraError::WindowBounds {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok((self.start as usize, self.end as usize))
    }
}

impl From<(usize, usize)> for SampleWindow {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start as isize, end as isize)
    }
}

/// Scalar activity of one trace inside a sub-window.
pub trait ActivityMetric: Send + Sync {
    fn name(&self) -> &'static str;
    fn measure(&self, trace: &[f64], window: SampleWindow) -> Result<f64, FraError>;
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn mean_square_about(values: &[f64], centre: f64) -> f64 {
    values
        .iter()
        .map(|v| {
            let delta = v - centre;
            delta * delta
        })
        .sum::<f64>()
        / values.len() as f64
}

/// Population variance about the in-window mean.
pub struct WindowVariance;

impl ActivityMetric for WindowVariance {
    fn name(&self) -> &'static str {
        "window_variance"
    }

    fn measure(&self, trace: &[f64], window: SampleWindow) -> Result<f64, FraError> {
        let (start, end) = window.checked(trace.len())?;
        let slice = &trace[start..end];
        Ok(mean_square_about(slice, mean(slice)))
    }
}

/// Mean squared deviation of the window from the whole-trace mean.
pub struct BaselineVariance;

impl ActivityMetric for BaselineVariance {
    fn name(&self) -> &'static str {
        "baseline_variance"
    }

    fn measure(&self, trace: &[f64], window: SampleWindow) -> Result<f64, FraError> {
        let (start, end) = window.checked(trace.len())?;
        Ok(mean_square_about(&trace[start..end], mean(trace)))
    }
}

pub struct PeakToPeak;

impl ActivityMetric for PeakToPeak {
    fn name(&self) -> &'static str {
        "peak_to_peak"
    }

    fn measure(&self, trace: &[f64], window: SampleWindow) -> Result<f64, FraError> {
        let (start, end) = window.checked(trace.len())?;
        let (lo, hi) = trace[start..end]
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(hi - lo)
    }
}

/// Number of in-window samples above `n_sds` standard deviations of the trace.
pub struct SpikeCount {
    pub n_sds: f64,
}

impl ActivityMetric for SpikeCount {
    fn name(&self) -> &'static str {
        "spike_count"
    }

    fn measure(&self, trace: &[f64], window: SampleWindow) -> Result<f64, FraError> {
        let (start, end) = window.checked(trace.len())?;
        let std = mean_square_about(trace, mean(trace)).sqrt();
        let threshold = self.n_sds * std;
        Ok(trace[start..end].iter().filter(|&&v| v > threshold).count() as f64)
    }
}

pub const DEFAULT_SPIKE_SDS: f64 = 2.3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    WindowVariance,
    BaselineVariance,
    PeakToPeak,
    SpikeCount {
        #[serde(default = "default_spike_sds")]
        n_sds: f64,
    },
}

fn default_spike_sds() -> f64 {
    DEFAULT_SPIKE_SDS
}

impl MetricKind {
    pub fn build(&self) -> Box<dyn ActivityMetric> {
        match *self {
            MetricKind::WindowVariance => Box::new(WindowVariance),
            MetricKind::BaselineVariance => Box::new(BaselineVariance),
            MetricKind::PeakToPeak => Box::new(PeakToPeak),
            MetricKind::SpikeCount { n_sds } => Box::new(SpikeCount { n_sds }),
        }
    }
}

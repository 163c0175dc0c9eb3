//! Best-frequency / threshold estimation from an FRA matrix.
//!
//! Five independent strategies share one input contract. They are never
//! merged: callers pick any subset and compare the estimates side by side.
//!
//! | kind | threshold from | d' | boundary |
//! |------|----------------|----|----------|
//! | `binarize_above_mean` | lowest active row of the filtered matrix binarised at its mean | yes | yes |
//! | `segment_boundary` | frequency-activity bins mapped onto levels | yes | yes |
//! | `local_curvature` | finite-difference curvature of the best-frequency column | no | no |
//! | `polynomial_curvature` | second derivative of a quartic fit to that column | no | no |
//! | `profile_finite_difference` | second difference of the level profile | no | no |
mod binarize;
mod boundary;
mod curvature;
mod polynomial;
mod profile;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::analysis::smoothing::FraProfiles;
use crate::error::FraError;

pub use binarize::BinarizeAboveMean;
pub use boundary::SegmentBoundary;
pub use curvature::LocalCurvature;
pub use polynomial::PolynomialCurvature;
pub use profile::ProfileFiniteDifference;

/// Everything a strategy may look at. Rows descend in level, columns ascend in frequency.
#[derive(Clone, Copy, Debug)]
pub struct TuningInput<'a> {
    pub raw: &'a Array2<f64>,
    pub filtered: &'a Array2<f64>,
    pub profiles: &'a FraProfiles,
    pub levels: &'a [f64],
    pub frequencies: &'a [f64],
}

impl<'a> TuningInput<'a> {
    fn require_levels(&self, strategy: &'static str, required: usize) -> Result<(), FraError> {
        if self.levels.len() < required {
            return Err(FraError::InsufficientLevels {
                strategy,
                required,
                found: self.levels.len(),
            });
        }
        Ok(())
    }

    fn best_frequency_index(&self, strategy: &'static str) -> Result<usize, FraError> {
        self.profiles
            .best_frequency_index()
            .ok_or(FraError::NoActiveRegion { strategy })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuningEstimate {
    pub best_frequency: f64,
    /// Every frequency tied for best; a single entry for argmax strategies.
    pub best_frequencies: Vec<f64>,
    pub level_threshold: f64,
    pub discriminability: Option<f64>,
    /// Lowest responsive level per frequency, aligned with the matrix columns.
    pub boundary: Option<Vec<Option<f64>>>,
}

impl TuningEstimate {
    fn point(best_frequency: f64, level_threshold: f64) -> Self {
        Self {
            best_frequency,
            best_frequencies: vec![best_frequency],
            level_threshold,
            discriminability: None,
            boundary: None,
        }
    }
}

pub trait TuningStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn estimate(&self, input: &TuningInput) -> Result<TuningEstimate, FraError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    BinarizeAboveMean,
    SegmentBoundary,
    LocalCurvature,
    PolynomialCurvature {
        #[serde(default)]
        absolute: bool,
    },
    ProfileFiniteDifference,
}

impl StrategyKind {
    pub fn all() -> [StrategyKind; 5] {
        [
            StrategyKind::BinarizeAboveMean,
            StrategyKind::SegmentBoundary,
            StrategyKind::LocalCurvature,
            StrategyKind::PolynomialCurvature { absolute: false },
            StrategyKind::ProfileFiniteDifference,
        ]
    }

    pub fn build(&self) -> Box<dyn TuningStrategy> {
        match *self {
            StrategyKind::BinarizeAboveMean => Box::new(BinarizeAboveMean),
            StrategyKind::SegmentBoundary => Box::new(SegmentBoundary),
            StrategyKind::LocalCurvature => Box::new(LocalCurvature),
            StrategyKind::PolynomialCurvature { absolute } => {
                Box::new(PolynomialCurvature { absolute })
            }
            StrategyKind::ProfileFiniteDifference => Box::new(ProfileFiniteDifference),
        }
    }
}

/// Threshold, best frequency, d' and boundary from an active-cell mask.
fn estimate_from_mask(
    strategy: &'static str,
    input: &TuningInput,
    mask: &Array2<bool>,
) -> Result<TuningEstimate, FraError> {
    let threshold_row = mask
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&active| active))
        .map(|(r, _)| r)
        .last()
        .ok_or(FraError::NoActiveRegion { strategy })?;

    let active_cols: Vec<usize> = mask
        .row(threshold_row)
        .iter()
        .enumerate()
        .filter(|(_, active)| **active)
        .map(|(c, _)| c)
        .collect();
    let mut best_col = active_cols[0];
    for &c in &active_cols[1..] {
        if input.filtered[[threshold_row, c]] > input.filtered[[threshold_row, best_col]] {
            best_col = c;
        }
    }

    let boundary = mask
        .columns()
        .into_iter()
        .map(|column| {
            column
                .iter()
                .rposition(|&active| active)
                .map(|r| input.levels[r])
        })
        .collect();

    Ok(TuningEstimate {
        best_frequency: input.frequencies[best_col],
        best_frequencies: active_cols.iter().map(|&c| input.frequencies[c]).collect(),
        level_threshold: input.levels[threshold_row],
        discriminability: d_prime(input.raw, mask),
        boundary: Some(boundary),
    })
}

/// `(mean(active) - mean(inactive)) / std(raw)`; `None` if either side is empty
/// or the matrix is flat.
pub fn d_prime(raw: &Array2<f64>, mask: &Array2<bool>) -> Option<f64> {
    let (mut on_sum, mut on_n, mut off_sum, mut off_n) = (0.0, 0usize, 0.0, 0usize);
    for (&value, &active) in raw.iter().zip(mask.iter()) {
        if active {
            on_sum += value;
            on_n += 1;
        } else {
            off_sum += value;
            off_n += 1;
        }
    }
    let std = raw.std(0.0);
    if on_n == 0 || off_n == 0 || !(std > 0.0) {
        return None;
    }
    Some((on_sum / on_n as f64 - off_sum / off_n as f64) / std)
}

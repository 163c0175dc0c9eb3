use ndarray::Array2;

use super::{estimate_from_mask, TuningEstimate, TuningInput, TuningStrategy};
use crate::error::FraError;

/// Bins the frequency profile into one band per level and activates each
/// column down to its band.
///
/// Band membership is tested per level with inclusive edges and the last
/// matching band wins, so bands are not exclusive. In practice almost every
/// frequency above the weakest one ends up active at the highest level.
/// Existing estimates depend on this, so it is kept as is.
pub struct SegmentBoundary;

impl SegmentBoundary {
    const NAME: &'static str = "segment_boundary";

    pub fn mask(input: &TuningInput) -> Array2<bool> {
        let n_levels = input.levels.len();
        let profile = &input.profiles.activity_frequency;
        let min = profile.fold(f64::INFINITY, |acc, &v| acc.min(v));
        let max = profile.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let step = (max - min) / n_levels as f64;

        let mut mask = Array2::from_elem(input.filtered.dim(), false);
        for (col, &activity) in profile.iter().enumerate() {
            let offset = activity - min;
            for k in 0..n_levels {
                if k as f64 * step <= offset && offset <= (k + 1) as f64 * step {
                    for row in 0..n_levels {
                        mask[[row, col]] = row < k;
                    }
                }
            }
        }
        mask
    }
}

impl TuningStrategy for SegmentBoundary {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn estimate(&self, input: &TuningInput) -> Result<TuningEstimate, FraError> {
        estimate_from_mask(Self::NAME, input, &Self::mask(input))
    }
}

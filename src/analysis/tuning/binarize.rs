use ndarray::Array2;

use super::{estimate_from_mask, TuningEstimate, TuningInput, TuningStrategy};
use crate::error::FraError;

/// Active where the filtered matrix exceeds its own mean.
pub struct BinarizeAboveMean;

impl BinarizeAboveMean {
    const NAME: &'static str = "binarize_above_mean";

    pub fn mask(filtered: &Array2<f64>) -> Array2<bool> {
        let mean = filtered.mean().unwrap_or(0.0);
        filtered.mapv(|v| v > mean)
    }
}

impl TuningStrategy for BinarizeAboveMean {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn estimate(&self, input: &TuningInput) -> Result<TuningEstimate, FraError> {
        estimate_from_mask(Self::NAME, input, &Self::mask(input.filtered))
    }
}

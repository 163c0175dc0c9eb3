use super::{TuningEstimate, TuningInput, TuningStrategy};
use crate::error::FraError;

/// Finite-difference curvature down the best-frequency column.
///
/// With only a handful of levels the one-sided end estimates often dominate,
/// so the threshold can land on the first or last level.
pub struct LocalCurvature;

impl LocalCurvature {
    const NAME: &'static str = "local_curvature";

    /// `|f''|` estimate per sample: 3-point centred inside, 4-point one-sided at the ends.
    fn curvature(a: &[f64]) -> Vec<f64> {
        let n = a.len();
        (0..n)
            .map(|i| {
                if i == 0 {
                    (2.0 * a[0] - 5.0 * a[1] + 4.0 * a[2] - a[3]).abs()
                } else if i == n - 1 {
                    (2.0 * a[n - 1] - 5.0 * a[n - 2] + 4.0 * a[n - 3] - a[n - 4]).abs()
                } else {
                    (a[i + 1] + a[i - 1] - 2.0 * a[i]).abs()
                }
            })
            .collect()
    }
}

impl TuningStrategy for LocalCurvature {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn estimate(&self, input: &TuningInput) -> Result<TuningEstimate, FraError> {
        input.require_levels(Self::NAME, 4)?;
        let best = input.best_frequency_index(Self::NAME)?;
        let column = input.raw.column(best).to_vec();
        let curvature = Self::curvature(&column);

        let mut threshold = 0;
        for (i, &c) in curvature.iter().enumerate() {
            if c > curvature[threshold] {
                threshold = i;
            }
        }
        Ok(TuningEstimate::point(
            input.frequencies[best],
            input.levels[threshold],
        ))
    }
}

use super::{TuningEstimate, TuningInput, TuningStrategy};
use crate::analysis::polyfit::Polynomial;
use crate::analysis::smoothing::argmax;
use crate::error::FraError;

const DEGREE: usize = 4;

/// Quartic least-squares fit of the best-frequency column against level.
/// The threshold is where the fitted curve bends hardest.
pub struct PolynomialCurvature {
    /// Rank by `|p''|` instead of `p''`.
    pub absolute: bool,
}

impl PolynomialCurvature {
    const NAME: &'static str = "polynomial_curvature";
}

impl TuningStrategy for PolynomialCurvature {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn estimate(&self, input: &TuningInput) -> Result<TuningEstimate, FraError> {
        input.require_levels(Self::NAME, DEGREE + 1)?;
        let best = input.best_frequency_index(Self::NAME)?;
        let column = input.raw.column(best).to_vec();
        let fit = Polynomial::fit(input.levels, &column, DEGREE)?;

        let curvature = input.levels.iter().map(|&level| {
            let d2 = fit.second_derivative(level);
            if self.absolute {
                d2.abs()
            } else {
                d2
            }
        });
        let threshold = argmax(curvature).ok_or(FraError::NoActiveRegion {
            strategy: Self::NAME,
        })?;
        Ok(TuningEstimate::point(
            input.frequencies[best],
            input.levels[threshold],
        ))
    }
}

use super::{TuningEstimate, TuningInput, TuningStrategy};
use crate::analysis::smoothing::argmax;
use crate::error::FraError;

/// Second difference of the level profile (all frequencies pooled).
pub struct ProfileFiniteDifference;

impl ProfileFiniteDifference {
    const NAME: &'static str = "profile_finite_difference";
}

impl TuningStrategy for ProfileFiniteDifference {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn estimate(&self, input: &TuningInput) -> Result<TuningEstimate, FraError> {
        input.require_levels(Self::NAME, 3)?;
        let best = input.best_frequency_index(Self::NAME)?;

        // rows descend in level, so ties go to the louder level
        let profile = input.profiles.activity_level.to_vec();
        let second_diff = profile.windows(3).map(|w| w[2] - 2.0 * w[1] + w[0]);
        let row = argmax(second_diff).ok_or(FraError::NoActiveRegion {
            strategy: Self::NAME,
        })? + 1;
        Ok(TuningEstimate::point(
            input.frequencies[best],
            input.levels[row],
        ))
    }
}

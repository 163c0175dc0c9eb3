//! Whole-recording descriptors used to filter recordings before annotation.
//!
//! - Offset: a recording is zero-mean when its mean sits inside (-2, 2).
//! - Symmetry: asymmetric when the excursions above and below the mean differ
//!   by more than 0.5 in absolute size.
use serde::Serialize;

use crate::recording::segment::{GridCheck, StimulusResponse};

pub const ZERO_MEAN_BAND: f64 = 2.0;
pub const SYMMETRY_TOLERANCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetCategory {
    ZeroMean,
    Offset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symmetry {
    Symmetric,
    Asymmetric,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecordingSummary {
    /// `(levels, frequencies)` of the declared grid.
    pub shape: (usize, usize),
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub offset: OffsetCategory,
    pub symmetry: Symmetry,
}

impl RecordingSummary {
    /// Summarise every window sample of one recording; `None` if there are none.
    pub fn from_responses<'a, I>(responses: I, grid: &GridCheck) -> Option<Self>
    where
        I: IntoIterator<Item = &'a StimulusResponse>,
    {
        let samples = responses
            .into_iter()
            .flat_map(|r| r.window.samples.iter().copied());
        let (count, sum, min, max) = samples.fold(
            (0usize, 0.0f64, f64::INFINITY, f64::NEG_INFINITY),
            |(n, s, lo, hi), v| (n + 1, s + v, lo.min(v), hi.max(v)),
        );
        if count == 0 {
            return None;
        }
        let mean = sum / count as f64;
        let offset = if mean > -ZERO_MEAN_BAND && mean < ZERO_MEAN_BAND {
            OffsetCategory::ZeroMean
        } else {
            OffsetCategory::Offset
        };
        let symmetry = if ((mean - max).abs() - (mean - min).abs()).abs() > SYMMETRY_TOLERANCE {
            Symmetry::Asymmetric
        } else {
            Symmetry::Symmetric
        };
        Some(Self {
            shape: (grid.levels, grid.frequencies),
            mean,
            min,
            max,
            offset,
            symmetry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::segment::ResponseWindow;
    use crate::recording::source::StimulusEvent;

    fn response(samples: Vec<f64>) -> StimulusResponse {
        StimulusResponse {
            window: ResponseWindow {
                tone_id: "A001/000".into(),
                onset: 0,
                samples,
            },
            event: StimulusEvent::new(0, 1_000.0, 10.0),
        }
    }

    #[test]
    fn centred_sine_like_trace_is_zero_mean_and_symmetric() {
        let grid = GridCheck::of(&[StimulusEvent::new(0, 1_000.0, 10.0)]);
        let summary =
            RecordingSummary::from_responses(&[response(vec![-1.0, 0.0, 1.0, 0.0])], &grid)
                .unwrap();
        assert_eq!(summary.shape, (1, 1));
        assert_eq!(summary.offset, OffsetCategory::ZeroMean);
        assert_eq!(summary.symmetry, Symmetry::Symmetric);
    }

    #[test]
    fn offset_trace_with_one_sided_spike() {
        let grid = GridCheck::of(&[StimulusEvent::new(0, 1_000.0, 10.0)]);
        let summary =
            RecordingSummary::from_responses(&[response(vec![-60.0, -60.0, -60.0, -40.0])], &grid)
                .unwrap();
        assert_eq!(summary.offset, OffsetCategory::Offset);
        assert_eq!(summary.symmetry, Symmetry::Asymmetric);
        assert_eq!(summary.min, -60.0);
        assert_eq!(summary.max, -40.0);
    }

    #[test]
    fn empty_recording_has_no_summary() {
        let grid = GridCheck::of(&[]);
        assert!(RecordingSummary::from_responses(Vec::<&StimulusResponse>::new(), &grid).is_none());
    }
}

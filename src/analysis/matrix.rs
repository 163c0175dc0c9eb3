use std::cmp::Ordering;

use ndarray::Array2;
use serde::Serialize;

use crate::analysis::metric::{ActivityMetric, SampleWindow};
use crate::config::AcquisitionConfig;
use crate::error::FraError;
use crate::recording::segment::{sort_dedup, StimulusResponse};

/// Activity of a single trial.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ActivityCell {
    pub level: f64,
    pub frequency: f64,
    pub activity: f64,
}

/// Measure every response inside the tone sub-window.
pub fn activity_table<'a, I>(
    responses: I,
    metric: &dyn ActivityMetric,
    acquisition: &AcquisitionConfig,
) -> Result<Vec<ActivityCell>, FraError>
where
    I: IntoIterator<Item = &'a StimulusResponse>,
{
    let window = SampleWindow::from(acquisition.stimulus_window());
    responses
        .into_iter()
        .map(|response| {
            Ok(ActivityCell {
                level: response.event.level,
                frequency: response.event.frequency,
                activity: metric.measure(&response.window.samples, window)?,
            })
        })
        .collect()
}

/// Level x frequency grid: rows descend in level, columns ascend in frequency.
#[derive(Clone, Debug)]
pub struct ActivityMatrix {
    pub values: Array2<f64>,
    pub trials: Array2<usize>,
    pub levels: Vec<f64>,
    pub frequencies: Vec<f64>,
}

impl ActivityMatrix {
    /// Duplicate trials of one cell are averaged; unobserved cells are NaN.
    pub fn assemble(cells: &[ActivityCell]) -> Self {
        let mut levels: Vec<f64> = cells.iter().map(|c| c.level).collect();
        let mut frequencies: Vec<f64> = cells.iter().map(|c| c.frequency).collect();
        sort_dedup(&mut levels);
        levels.reverse();
        sort_dedup(&mut frequencies);

        let shape = (levels.len(), frequencies.len());
        let mut sums = Array2::<f64>::zeros(shape);
        let mut trials = Array2::<usize>::zeros(shape);
        for cell in cells {
            let row = position(&levels, cell.level, |a, b| b.total_cmp(a));
            let col = position(&frequencies, cell.frequency, f64::total_cmp);
            sums[[row, col]] += cell.activity;
            trials[[row, col]] += 1;
        }
        let values = ndarray::Zip::from(&sums)
            .and(&trials)
            .map_collect(|&sum, &n| if n == 0 { f64::NAN } else { sum / n as f64 });

        Self {
            values,
            trials,
            levels,
            frequencies,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn observed_cells(&self) -> usize {
        self.trials.iter().filter(|&&n| n > 0).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.levels.is_empty() && self.observed_cells() == self.levels.len() * self.frequencies.len()
    }

    /// Error unless every (level, frequency) cell has at least one trial.
    pub fn ensure_complete(&self) -> Result<(), FraError> {
        if self.is_complete() {
            return Ok(());
        }
        Err(FraError::GridInconsistency {
            levels: self.levels.len(),
            frequencies: self.frequencies.len(),
            combinations: self.observed_cells(),
        })
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.rows().into_iter().map(|row| row.to_vec()).collect()
    }
}

fn position(sorted: &[f64], value: f64, cmp: impl Fn(&f64, &f64) -> Ordering) -> usize {
    // value is always present: the axes were built from the same cells
    sorted
        .binary_search_by(|probe| cmp(probe, &value))
        .unwrap_or_else(|insert_at| insert_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(level: f64, frequency: f64, activity: f64) -> ActivityCell {
        ActivityCell {
            level,
            frequency,
            activity,
        }
    }

    #[test]
    fn axes_are_ordered_and_shape_matches() {
        let cells = [
            cell(40.0, 8_000.0, 4.0),
            cell(60.0, 2_000.0, 5.0),
            cell(20.0, 4_000.0, 6.0),
            cell(60.0, 8_000.0, 1.0),
            cell(40.0, 2_000.0, 2.0),
            cell(20.0, 8_000.0, 3.0),
            cell(60.0, 4_000.0, 7.0),
            cell(40.0, 4_000.0, 8.0),
            cell(20.0, 2_000.0, 9.0),
        ];
        let matrix = ActivityMatrix::assemble(&cells);
        assert_eq!(matrix.shape(), (3, 3));
        assert_eq!(matrix.levels, vec![60.0, 40.0, 20.0]);
        assert_eq!(matrix.frequencies, vec![2_000.0, 4_000.0, 8_000.0]);
        assert!(matrix.levels.windows(2).all(|w| w[0] > w[1]));
        assert!(matrix.frequencies.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(matrix.values[[0, 0]], 5.0);
        assert_eq!(matrix.values[[1, 2]], 4.0);
        assert_eq!(matrix.values[[2, 1]], 6.0);
        assert!(matrix.is_complete());
    }

    #[test]
    fn duplicate_trials_are_averaged() {
        let cells = [
            cell(50.0, 1_000.0, 2.0),
            cell(50.0, 1_000.0, 4.0),
            cell(50.0, 1_000.0, 9.0),
        ];
        let matrix = ActivityMatrix::assemble(&cells);
        assert_eq!(matrix.shape(), (1, 1));
        assert_eq!(matrix.trials[[0, 0]], 3);
        assert!((matrix.values[[0, 0]] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn missing_cells_are_nan_and_incomplete() {
        let cells = [cell(60.0, 4_000.0, 1.0), cell(40.0, 8_000.0, 2.0)];
        let matrix = ActivityMatrix::assemble(&cells);
        assert_eq!(matrix.shape(), (2, 2));
        assert!(matrix.values[[0, 1]].is_nan());
        assert!(!matrix.is_complete());
        assert!(matches!(
            matrix.ensure_complete(),
            Err(FraError::GridInconsistency {
                levels: 2,
                frequencies: 2,
                combinations: 2
            })
        ));
    }
}

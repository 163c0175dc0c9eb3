use crate::analysis::matrix::ActivityCell;
use crate::error::FraError;

/// Relevance-weighted mean frequency of the per-trial activity table.
///
/// Each trial is weighted by `activity^(-level / 10)`; weights are
/// normalised to sum to one.
pub fn characteristic_frequency(cells: &[ActivityCell]) -> Result<f64, FraError> {
    if cells.is_empty() {
        return Err(FraError::Numerical("no trials to weight".into()));
    }
    let relevance: Vec<f64> = cells
        .iter()
        .map(|cell| cell.activity.powf(-cell.level / 10.0))
        .collect();
    if relevance.iter().any(|w| !w.is_finite()) {
        return Err(FraError::Numerical(
            "non-finite relevance weight (zero or negative activity)".into(),
        ));
    }
    let total: f64 = relevance.iter().sum();
    if !(total > 0.0) {
        return Err(FraError::Numerical("relevance weights sum to zero".into()));
    }
    Ok(cells
        .iter()
        .zip(&relevance)
        .map(|(cell, w)| cell.frequency * w / total)
        .sum())
}

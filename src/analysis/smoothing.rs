use ndarray::{Array1, Array2, Axis};

/// 3x3 median filter; the border reflects about the edge (`d c b a | a b c d`).
pub fn median_filter_3x3(matrix: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = matrix.dim();
    let mut filtered = Array2::<f64>::zeros((rows, cols));
    let mut window = [0.0f64; 9];
    for r in 0..rows {
        for c in 0..cols {
            let mut k = 0;
            for dr in -1..=1 {
                for dc in -1..=1 {
                    window[k] = matrix[[reflect(r, dr, rows), reflect(c, dc, cols)]];
                    k += 1;
                }
            }
            window.sort_by(f64::total_cmp);
            filtered[[r, c]] = window[4];
        }
    }
    filtered
}

fn reflect(index: usize, offset: isize, len: usize) -> usize {
    let n = len as isize;
    let mut i = index as isize + offset;
    if i < 0 {
        i = -i - 1;
    }
    if i >= n {
        i = 2 * n - i - 1;
    }
    i.clamp(0, n - 1) as usize
}

/// Marginal activity of the filtered matrix.
#[derive(Clone, Debug)]
pub struct FraProfiles {
    /// Column sums, one per frequency (ascending).
    pub activity_frequency: Array1<f64>,
    /// Row sums, one per level (descending, same order as the matrix rows).
    pub activity_level: Array1<f64>,
}

impl FraProfiles {
    pub fn of(filtered: &Array2<f64>) -> Self {
        Self {
            activity_frequency: filtered.sum_axis(Axis(0)),
            activity_level: filtered.sum_axis(Axis(1)),
        }
    }

    /// Column with the greatest marginal activity; first one on ties.
    pub fn best_frequency_index(&self) -> Option<usize> {
        argmax(self.activity_frequency.iter().copied())
    }
}

pub(crate) fn argmax(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.into_iter().enumerate() {
        match best {
            Some((_, b)) if !(v > b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

//! Least-squares polynomial fitting for short level/activity curves.
//!
//! Abscissae are centred and scaled to unit spread before the normal
//! equations are formed, so a quartic over 0..100 dB stays well conditioned.
// Indexed loops are clearer for the elimination
#![allow(clippy::needless_range_loop)]

use crate::error::FraError;

const SINGULAR_THRESHOLD: f64 = 1e-12;

/// `p(x) = sum c_k t^k` with `t = (x - centre) / scale`.
#[derive(Clone, Debug)]
pub struct Polynomial {
    coeffs: Vec<f64>,
    centre: f64,
    scale: f64,
}

impl Polynomial {
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self, FraError> {
        if x.len() != y.len() {
            return Err(FraError::Numerical(format!(
                "{} abscissae for {} ordinates",
                x.len(),
                y.len()
            )));
        }
        if x.len() <= degree {
            return Err(FraError::Numerical(format!(
                "degree {degree} fit needs more than {} points",
                x.len()
            )));
        }
        let n = x.len() as f64;
        let centre = x.iter().sum::<f64>() / n;
        let spread = (x.iter().map(|v| (v - centre).powi(2)).sum::<f64>() / n).sqrt();
        let scale = if spread > 0.0 { spread } else { 1.0 };
        let t: Vec<f64> = x.iter().map(|v| (v - centre) / scale).collect();

        // Normal equations: (V^T V) c = V^T y
        let m = degree + 1;
        let mut ata = vec![vec![0.0; m]; m];
        let mut aty = vec![0.0; m];
        for (&ti, &yi) in t.iter().zip(y) {
            let powers: Vec<f64> = (0..2 * m - 1).map(|k| ti.powi(k as i32)).collect();
            for row in 0..m {
                aty[row] += powers[row] * yi;
                for col in 0..m {
                    ata[row][col] += powers[row + col];
                }
            }
        }
        let coeffs = solve_linear_system(ata, aty)
            .ok_or_else(|| FraError::Numerical("polynomial fit is singular".into()))?;
        Ok(Self {
            coeffs,
            centre,
            scale,
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let t = (x - self.centre) / self.scale;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }

    /// Closed-form `p''(x)` in the units of `x`.
    pub fn second_derivative(&self, x: f64) -> f64 {
        let t = (x - self.centre) / self.scale;
        let d2 = self
            .coeffs
            .iter()
            .enumerate()
            .skip(2)
            .rev()
            .fold(0.0, |acc, (k, &c)| acc * t + (k * (k - 1)) as f64 * c);
        d2 / (self.scale * self.scale)
    }
}

/// Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let norm = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if norm == 0.0 {
        return None;
    }
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < SINGULAR_THRESHOLD * norm {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_quartic() {
        let f = |x: f64| 3.0 - 0.5 * x + 0.02 * x * x - 1e-4 * x.powi(3) + 2e-7 * x.powi(4);
        let xs: Vec<f64> = (0..9).map(|i| i as f64 * 10.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let p = Polynomial::fit(&xs, &ys, 4).unwrap();
        for &x in &xs {
            assert!((p.eval(x) - f(x)).abs() < 1e-6);
            let d2 = 0.04 - 6e-4 * x + 2.4e-6 * x * x;
            assert!((p.second_derivative(x) - d2).abs() < 1e-8);
        }
    }

    #[test]
    fn line_through_collinear_points() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let p = Polynomial::fit(&xs, &ys, 1).unwrap();
        assert!((p.eval(10.0) - 21.0).abs() < 1e-9);
        assert!(p.second_derivative(1.5).abs() < 1e-12);
    }

    #[test]
    fn too_few_points_fail() {
        assert!(Polynomial::fit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 4).is_err());
    }

    #[test]
    fn repeated_abscissa_is_singular() {
        let xs = [5.0; 6];
        let ys = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(matches!(
            Polynomial::fit(&xs, &ys, 2),
            Err(FraError::Numerical(_))
        ));
    }
}

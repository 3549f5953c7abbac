//! Small dense linear algebra on row-major `Vec<Vec<f64>>` matrices.
//!
//! Only what the regression code needs: Cholesky factorisation of
//! symmetric positive definite matrices, solves and inverses.

use crate::error::{ForecastError, Result};

/// Dense row-major matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Lower-triangular Cholesky factor `L` with `A = L L'`.
///
/// Returns `None` when `a` is not (numerically) positive definite.
pub fn cholesky(a: &[Vec<f64>]) -> Option<Matrix> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        if a[i].len() != n {
            return None;
        }
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve `L L' x = b` given the Cholesky factor `L`.
pub fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // forward: L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // backward: L' x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}

/// Solve `A x = b` for symmetric positive definite `A`.
pub fn solve_spd(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    if a.len() != b.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    let l = cholesky(a).ok_or_else(not_positive_definite)?;
    Ok(cholesky_solve(&l, b))
}

/// Inverse of a symmetric positive definite matrix.
pub fn invert_spd(a: &[Vec<f64>]) -> Result<Matrix> {
    let n = a.len();
    let l = cholesky(a).ok_or_else(not_positive_definite)?;

    let mut columns = Vec::with_capacity(n);
    let mut unit = vec![0.0; n];
    for j in 0..n {
        unit[j] = 1.0;
        columns.push(cholesky_solve(&l, &unit));
        unit[j] = 0.0;
    }

    // columns[j][i] == inv[i][j]; the inverse is symmetric
    Ok((0..n)
        .map(|i| (0..n).map(|j| columns[j][i]).collect())
        .collect())
}

/// `X'X` for a design given as columns.
pub fn gram(columns: &[&[f64]]) -> Matrix {
    let k = columns.len();
    let mut out = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in i..k {
            let dot = dot(columns[i], columns[j]);
            out[i][j] = dot;
            out[j][i] = dot;
        }
    }
    out
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn not_positive_definite() -> ForecastError {
    ForecastError::ComputationError("matrix is not positive definite".into())
}

//! Ordinary least squares with an intercept.
//!
//! Solves the normal equations `(X'X) b = X'y` by Gaussian elimination with
//! partial pivoting. Designs are a handful of columns, so nothing heavier is
//! warranted.

use fee_analysis_core::{AnalysisError, AnalysisResult};

/// Relative pivot size below which the design is treated as singular.
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Fitted linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub intercept: f64,
    /// One slope per regressor column, in input order.
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub n_observations: usize,
}

impl OlsFit {
    /// Predicted response for one row of regressors.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// Fits `y = b0 + b1*x1 + ... + bk*xk`.
///
/// # Arguments
/// * `rows` - One regressor row per observation, all of equal length `k`
/// * `y` - Response per observation
///
/// # Errors
/// * [`AnalysisError::InsufficientData`] unless there are more observations than parameters
/// * [`AnalysisError::Degenerate`] when the design matrix is singular
pub fn ols_fit(rows: &[Vec<f64>], y: &[f64]) -> AnalysisResult<OlsFit> {
    let n = y.len();
    let k = rows.first().map_or(0, Vec::len);
    let p = k + 1;

    if rows.len() != n || rows.iter().any(|r| r.len() != k) {
        return Err(AnalysisError::degenerate(
            "ols",
            "regressor rows and response have mismatched shapes",
        ));
    }
    if n <= p {
        return Err(AnalysisError::insufficient("ols", p + 1, n));
    }

    // Normal equations with the intercept as column 0.
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in rows.iter().zip(y) {
        let design: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
        for a in 0..p {
            xty[a] += design[a] * yi;
            for b in 0..p {
                xtx[a][b] += design[a] * design[b];
            }
        }
    }

    let beta = solve(xtx, xty)?;

    let fit = OlsFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        r_squared: 0.0,
        n_observations: n,
    };

    let mean_y = y.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    let ss_res: f64 = rows
        .iter()
        .zip(y)
        .map(|(row, yi)| (yi - fit.predict(row)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(OlsFit { r_squared, ..fit })
}

/// Solves `a x = b` in place by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> AnalysisResult<Vec<f64>> {
    let p = b.len();
    let scale = (0..p).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max).max(1.0);

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < SINGULAR_TOLERANCE * scale {
            return Err(AnalysisError::degenerate(
                "ols",
                "design matrix is singular (collinear or constant regressors)",
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..p {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..p {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; p];
    for row in (0..p).rev() {
        let tail: f64 = ((row + 1)..p).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

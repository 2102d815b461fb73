//! Least squares solver.
//!
//! Every candidate model in the pipeline is an ordinary least squares problem
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! solved many times during subset enumeration and stepwise search.
//!
//! Implementation choices:
//! - SVD solve, which stays robust when the design matrix is tall (always the
//!   case here: rows >> columns) and when dummy columns are nearly collinear.
//! - Progressively looser tolerances before giving up, since one-hot encoded
//!   categories with sparse levels can produce near-singular designs.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

//! Weighted least squares solver.
//!
//! Given fixed nonlinear Bazin parameters `(t0, tfall, trise)` the model is
//! linear in amplitude and baseline, so each grid candidate reduces to:
//!
//! ```text
//! minimize Σ w_i (flux_i - A g(t_i) - B)^2
//! ```
//!
//! Rows are scaled by `sqrt(w_i)` and the resulting ordinary problem goes
//! through SVD. A flat `g(t)` over the observed window is nearly collinear
//! with the baseline column, so the solve falls back to looser tolerances.

use nalgebra::{DMatrix, DVector};

const SVD_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Solve `x β ≈ y` with per-row weights `w`.
///
/// Returns `None` when the shapes disagree or no tolerance yields a finite
/// solution.
pub fn solve_weighted(x: &DMatrix<f64>, y: &DVector<f64>, w: &[f64]) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || y.len() != w.len() {
        return None;
    }

    let mut xw = x.clone();
    let mut yw = y.clone();
    for (i, &wi) in w.iter().enumerate() {
        let s = wi.sqrt();
        xw.row_mut(i).scale_mut(s);
        yw[i] *= s;
    }

    let svd = xw.svd(true, true);
    SVD_TOLERANCES.iter().find_map(|&tol| {
        svd.solve(&yw, tol)
            .ok()
            .filter(|beta| beta.iter().all(|v| v.is_finite()))
    })
}

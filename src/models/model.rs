//! Bazin light-curve model.
//!
//! ```text
//! f(t) = A · exp(-(t - t0)/tfall) / (1 + exp(-(t - t0)/trise)) + B
//! ```
//!
//! The fitter relies on two primitive operations:
//! - the shape term `g(t)` for fixed `(t0, tfall, trise)` (the design column
//!   multiplying `A`; `B` multiplies a constant column)
//! - full evaluation `f(t)` for residuals and extrapolation

use crate::domain::BazinParams;

/// Shape term `exp(-(t - t0)/tfall) / (1 + exp(-(t - t0)/trise))`.
///
/// Evaluated in log space: far before `t0` both exponentials overflow on
/// their own while their ratio is still finite.
pub fn bazin_shape(t: f64, t0: f64, tfall: f64, trise: f64) -> f64 {
    let dt = t - t0;
    (-dt / tfall - softplus(-dt / trise)).exp()
}

/// Evaluate the full Bazin model at `t`.
pub fn bazin(t: f64, params: &BazinParams) -> f64 {
    params.a * bazin_shape(t, params.t0, params.tfall, params.trise) + params.b
}

/// Fill a design row `[g(t), 1]` for the linear `(A, B)` solve.
///
/// # Panics
/// Panics if `out` is shorter than 2.
pub fn fill_design_row(t: f64, t0: f64, tfall: f64, trise: f64, out: &mut [f64]) {
    out[0] = bazin_shape(t, t0, tfall, trise);
    out[1] = 1.0;
}

/// `ln(1 + e^x)` without overflow for large `x`.
fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BazinParams {
        BazinParams {
            a: 100.0,
            b: 2.0,
            t0: 20.0,
            tfall: 30.0,
            trise: 4.0,
        }
    }

    #[test]
    fn bazin_matches_direct_formula() {
        let p = params();
        for &t in &[0.0, 10.0, 20.0, 35.0, 80.0] {
            let dt = t - p.t0;
            let direct = p.a * (-dt / p.tfall).exp() / (1.0 + (-dt / p.trise).exp()) + p.b;
            assert!((bazin(t, &p) - direct).abs() < 1e-9, "t={t}");
        }
    }

    #[test]
    fn shape_stays_finite_far_from_peak() {
        let v = bazin_shape(-5000.0, 0.0, 10.0, 1.0);
        assert!(v.is_finite());
        assert!(v >= 0.0 && v < 1e-100);
        assert!(bazin_shape(5000.0, 0.0, 10.0, 1.0).is_finite());
    }

    #[test]
    fn design_row_has_constant_column() {
        let mut row = [0.0; 2];
        fill_design_row(20.0, 20.0, 30.0, 4.0, &mut row);
        assert!((row[0] - 0.5).abs() < 1e-12);
        assert_eq!(row[1], 1.0);
    }
}

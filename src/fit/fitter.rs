//! Per-band Bazin fitting.
//!
//! Given, for one band:
//! - observation times `t_i` (measured from the band's first observation)
//! - fluxes `f_i` and their errors
//! - a grid of candidate `(t0, tfall, trise)` tuples
//!
//! we solve, for each candidate:
//! - a weighted OLS problem for amplitude `A` and baseline `B`
//! - the resulting SSE
//!
//! and keep the best (lowest SSE) candidate. The winner is then polished
//! with a Nelder-Mead search over `(t0, ln tfall, ln trise)` inside the grid
//! box, so features are not quantized to grid values. Both stages are
//! deterministic: the same photometry always yields the same parameters.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{Band, BandFits, BazinFit, BazinParams, LightCurve};
use crate::error::AppError;
use crate::math::{SimplexOptions, lin_space, log_space, minimize, solve_weighted};
use crate::models::{bazin, fill_design_row};
use crate::survey::ModelFitter;

/// Grid-search settings for the nonlinear Bazin parameters.
#[derive(Debug, Clone)]
pub struct BazinGrid {
    /// Days searched before the first and after the last observation for `t0`.
    pub t0_margin: f64,
    pub t0_steps: usize,

    pub tfall_min: f64,
    pub tfall_max: f64,
    pub tfall_steps: usize,

    pub trise_min: f64,
    pub trise_max: f64,
    pub trise_steps: usize,

    /// Bands with fewer usable points report the failure sentinel.
    pub min_points: usize,

    /// Nelder-Mead iterations after the grid pick (0 keeps the grid value).
    pub refine_iters: usize,
}

/// Relative SSE spread at which refinement stops.
const REFINE_F_TOL: f64 = 1e-10;

impl Default for BazinGrid {
    fn default() -> Self {
        Self {
            t0_margin: 10.0,
            t0_steps: 30,
            tfall_min: 1.0,
            tfall_max: 100.0,
            tfall_steps: 12,
            trise_min: 0.5,
            trise_max: 20.0,
            trise_steps: 10,
            min_points: 3,
            refine_iters: 500,
        }
    }
}

/// Fits every band of a light curve independently.
#[derive(Debug, Clone)]
pub struct BazinFitter {
    grid: BazinGrid,
    /// `(tfall, trise)` pairs; `t0` depends on each band's time span.
    shape_grid: Vec<(f64, f64)>,
    /// Half grid spacing of `ln tfall` and `ln trise` (initial simplex size).
    log_half_steps: [f64; 2],
}

impl BazinFitter {
    pub fn new(grid: BazinGrid) -> Result<Self, AppError> {
        let tfalls = log_space(grid.tfall_min, grid.tfall_max, grid.tfall_steps)?;
        let trises = log_space(grid.trise_min, grid.trise_max, grid.trise_steps)?;
        if grid.t0_steps < 2 {
            return Err(AppError::config("t0 grid steps must be >= 2."));
        }
        if !(grid.t0_margin.is_finite() && grid.t0_margin >= 0.0) {
            return Err(AppError::config("t0 margin must be finite and >= 0."));
        }

        let mut shape_grid = Vec::with_capacity(tfalls.len() * trises.len());
        for &tfall in &tfalls {
            for &trise in &trises {
                shape_grid.push((tfall, trise));
            }
        }

        let log_half_steps = [
            0.5 * (tfalls[1] / tfalls[0]).ln(),
            0.5 * (trises[1] / trises[0]).ln(),
        ];

        Ok(Self {
            grid,
            shape_grid,
            log_half_steps,
        })
    }

    /// Fit one band. Returns `None` when the band cannot be fitted.
    pub fn fit_band(&self, lc: &LightCurve, band: Band) -> Option<BazinFit> {
        let mut mjd = Vec::new();
        let mut flux = Vec::new();
        let mut weight = Vec::new();
        for p in lc.band_points(band) {
            if !(p.mjd.is_finite() && p.flux.is_finite()) {
                continue;
            }
            mjd.push(p.mjd);
            flux.push(p.flux);
            weight.push(inverse_variance(p.flux_err));
        }

        if mjd.len() < self.grid.min_points.max(2) {
            return None;
        }

        let t_ref = mjd.iter().copied().fold(f64::INFINITY, f64::min);
        let t_last = mjd.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let times: Vec<f64> = mjd.iter().map(|t| t - t_ref).collect();

        let t0s = lin_space(
            -self.grid.t0_margin,
            (t_last - t_ref) + self.grid.t0_margin,
            self.grid.t0_steps,
        )
        .ok()?;

        let best = self.search(&t0s, &times, &flux, &weight)?;
        let params = self.refine(&best, &t0s, &times, &flux, &weight);
        Some(BazinFit { params, t_ref })
    }

    fn search(&self, t0s: &[f64], times: &[f64], flux: &[f64], weight: &[f64]) -> Option<Candidate> {
        let per_t0 = self.shape_grid.len();
        let total = t0s.len() * per_t0;

        // Evaluate each grid tuple independently (parallel).
        let candidates: Vec<Candidate> = (0..total)
            .into_par_iter()
            .filter_map(|idx| {
                let t0 = t0s[idx / per_t0];
                let (tfall, trise) = self.shape_grid[idx % per_t0];
                evaluate_candidate(t0, tfall, trise, times, flux, weight).map(|(params, sse)| Candidate {
                    idx,
                    params,
                    sse,
                })
            })
            .collect();

        // Deterministic selection: pick the minimum SSE; break ties by grid index.
        let mut best = candidates.first()?;
        for c in &candidates[1..] {
            if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
                best = c;
            }
        }
        Some(best.clone())
    }

    /// Polish the grid winner; points outside the grid box score `+inf`.
    fn refine(&self, best: &Candidate, t0s: &[f64], times: &[f64], flux: &[f64], weight: &[f64]) -> BazinParams {
        if self.grid.refine_iters == 0 || t0s.len() < 2 {
            return best.params;
        }
        let (t0_lo, t0_hi) = (t0s[0], t0s[t0s.len() - 1]);
        let tfall_box = self.grid.tfall_min.ln()..=self.grid.tfall_max.ln();
        let trise_box = self.grid.trise_min.ln()..=self.grid.trise_max.ln();

        let score = |x: &[f64; 3]| -> Option<(BazinParams, f64)> {
            if !((t0_lo..=t0_hi).contains(&x[0]) && tfall_box.contains(&x[1]) && trise_box.contains(&x[2])) {
                return None;
            }
            evaluate_candidate(x[0], x[1].exp(), x[2].exp(), times, flux, weight)
        };

        let p = best.params;
        let (x, _) = minimize(
            |x: &[f64; 3]| score(x).map_or(f64::INFINITY, |(_, sse)| sse),
            [p.t0, p.tfall.ln(), p.trise.ln()],
            best.sse,
            [
                0.5 * (t0s[1] - t0s[0]),
                self.log_half_steps[0],
                self.log_half_steps[1],
            ],
            SimplexOptions {
                max_iters: self.grid.refine_iters,
                f_tol: REFINE_F_TOL,
            },
        );
        score(&x).map_or(p, |(params, _)| params)
    }
}

impl ModelFitter for BazinFitter {
    fn fit_all(&self, lc: &LightCurve) -> BandFits {
        let mut fits = BandFits::default();
        for band in Band::ALL {
            fits.set(band, self.fit_band(lc, band));
        }
        fits
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: BazinParams,
    sse: f64,
}

fn evaluate_candidate(
    t0: f64,
    tfall: f64,
    trise: f64,
    times: &[f64],
    flux: &[f64],
    weight: &[f64],
) -> Option<(BazinParams, f64)> {
    let n = times.len();

    let mut x = DMatrix::<f64>::zeros(n, 2);
    let mut row = [0.0; 2];
    for (i, &t) in times.iter().enumerate() {
        fill_design_row(t, t0, tfall, trise, &mut row);
        x[(i, 0)] = row[0];
        x[(i, 1)] = row[1];
    }

    let ab = solve_weighted(&x, &DVector::from_column_slice(flux), weight)?;
    let params = BazinParams {
        a: ab[0],
        b: ab[1],
        t0,
        tfall,
        trise,
    };

    let mut sse = 0.0;
    for i in 0..n {
        let r = flux[i] - bazin(times[i], &params);
        sse += weight[i] * r * r;
    }

    if sse.is_finite() {
        Some((params, sse))
    } else {
        None
    }
}

/// `1/σ²`, falling back to unit weight for missing or invalid errors.
fn inverse_variance(err: f64) -> f64 {
    if err.is_finite() && err > 0.0 {
        1.0 / (err * err)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PhotoPoint, Sample, SnType};

    fn synthetic_curve(truth: &BazinParams, t_ref: f64, bands: &[Band], n: usize) -> LightCurve {
        let mut photometry = Vec::new();
        for &band in bands {
            for i in 0..n {
                let t = i as f64 * 4.0;
                photometry.push(PhotoPoint {
                    mjd: t_ref + t,
                    band,
                    flux: bazin(t, truth),
                    flux_err: 1.0,
                    snr: None,
                    mag: 22.0,
                    mag_err: None,
                });
            }
        }
        LightCurve {
            id: "42".to_string(),
            redshift: 0.2,
            sn_type: SnType::Ia,
            sn_code: "0".to_string(),
            sample: Sample::Train,
            photometry,
        }
    }

    #[test]
    fn recovers_parameters_lying_on_the_grid() {
        let grid = BazinGrid {
            t0_margin: 10.0,
            t0_steps: 20,
            tfall_min: 5.0,
            tfall_max: 80.0,
            tfall_steps: 5,
            trise_min: 1.0,
            trise_max: 16.0,
            trise_steps: 5,
            min_points: 3,
            refine_iters: 400,
        };
        // Times 0..=76 in steps of 4 => t0 grid over [-10, 86] with 20 steps (step 96/19).
        let t0 = -10.0 + 5.0 * 96.0 / 19.0;
        let truth = BazinParams {
            a: 150.0,
            b: 3.0,
            t0,
            tfall: 20.0,
            trise: 4.0,
        };
        let lc = synthetic_curve(&truth, 56200.0, &[Band::R], 20);

        let fitter = BazinFitter::new(grid).unwrap();
        let fit = fitter.fit_band(&lc, Band::R).unwrap();

        assert_eq!(fit.t_ref, 56200.0);
        assert!((fit.params.t0 - truth.t0).abs() < 1e-6);
        assert!((fit.params.tfall - 20.0).abs() < 1e-6);
        assert!((fit.params.trise - 4.0).abs() < 1e-6);
        assert!((fit.params.a - 150.0).abs() < 1e-4);
        assert!((fit.params.b - 3.0).abs() < 1e-4);
    }

    #[test]
    fn refinement_recovers_off_grid_parameters() {
        let truth = BazinParams {
            a: 150.0,
            b: 2.0,
            t0: 21.3,
            tfall: 27.3,
            trise: 3.7,
        };
        let lc = synthetic_curve(&truth, 56200.0, &[Band::R], 20);

        let grid_only = BazinFitter::new(BazinGrid {
            refine_iters: 0,
            ..BazinGrid::default()
        })
        .unwrap()
        .fit_band(&lc, Band::R)
        .unwrap();
        let refined = BazinFitter::new(BazinGrid::default())
            .unwrap()
            .fit_band(&lc, Band::R)
            .unwrap();

        let tfalls = log_space(1.0, 100.0, 12).unwrap();
        assert!(tfalls.contains(&grid_only.params.tfall));
        assert!(!tfalls.contains(&refined.params.tfall));

        assert!((refined.params.t0 - truth.t0).abs() < 0.1, "t0 {}", refined.params.t0);
        assert!((refined.params.tfall - truth.tfall).abs() < 0.1, "tfall {}", refined.params.tfall);
        assert!((refined.params.trise - truth.trise).abs() < 0.1, "trise {}", refined.params.trise);
        assert!((refined.params.a - truth.a).abs() < 1.0, "A {}", refined.params.a);
    }

    #[test]
    fn refined_fit_stays_inside_grid_box() {
        // Monotone decline: the fall time wants to run past the grid maximum.
        let truth = BazinParams {
            a: 100.0,
            b: 0.0,
            t0: -30.0,
            tfall: 400.0,
            trise: 2.0,
        };
        let lc = synthetic_curve(&truth, 56200.0, &[Band::G], 12);
        let grid = BazinGrid::default();
        let fit = BazinFitter::new(grid.clone()).unwrap().fit_band(&lc, Band::G).unwrap();
        assert!(fit.params.tfall <= grid.tfall_max * (1.0 + 1e-12));
        assert!(fit.params.trise >= grid.trise_min * (1.0 - 1e-12));
        assert!(fit.params.t0 >= -grid.t0_margin);
    }

    #[test]
    fn sparse_band_reports_failure_sentinel() {
        let truth = BazinParams {
            a: 100.0,
            b: 0.0,
            t0: 10.0,
            tfall: 30.0,
            trise: 3.0,
        };
        let mut lc = synthetic_curve(&truth, 56180.0, &[Band::G, Band::R, Band::I], 8);
        lc.photometry.extend(synthetic_curve(&truth, 56180.0, &[Band::Z], 2).photometry);

        let fitter = BazinFitter::new(BazinGrid::default()).unwrap();
        let fits = fitter.fit_all(&lc);

        assert!(fits.get(Band::G).is_some());
        assert!(fits.get(Band::Z).is_none());
        assert!(fits.features().is_none());
    }

    #[test]
    fn fit_is_deterministic() {
        let truth = BazinParams {
            a: 80.0,
            b: 1.0,
            t0: 12.0,
            tfall: 25.0,
            trise: 2.0,
        };
        let lc = synthetic_curve(&truth, 56190.0, &Band::ALL, 10);
        let fitter = BazinFitter::new(BazinGrid::default()).unwrap();
        assert_eq!(fitter.fit_all(&lc), fitter.fit_all(&lc));
    }

    #[test]
    fn invalid_grid_is_a_config_error() {
        let grid = BazinGrid {
            tfall_min: 0.0,
            ..BazinGrid::default()
        };
        let err = BazinFitter::new(grid).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}

//! Derivative-free local minimization (Nelder-Mead) over small fixed-size
//! parameter vectors.

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Stopping rules for [`minimize`].
#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    pub max_iters: usize,
    /// Stop once every vertex scores within `f_tol * (1 + |best|)` of the best.
    pub f_tol: f64,
}

/// Minimize `f` starting from `start`, whose score is `start_value`.
///
/// The initial simplex adds one vertex `steps[k]` away along each axis.
/// Non-finite scores count as `+inf`. The returned point never scores worse
/// than `start`.
pub fn minimize<const N: usize>(
    f: impl Fn(&[f64; N]) -> f64,
    start: [f64; N],
    start_value: f64,
    steps: [f64; N],
    opts: SimplexOptions,
) -> ([f64; N], f64) {
    let eval = |x: &[f64; N]| {
        let v = f(x);
        if v.is_finite() { v } else { f64::INFINITY }
    };

    let mut simplex: Vec<([f64; N], f64)> = Vec::with_capacity(N + 1);
    let start_value = if start_value.is_finite() { start_value } else { f64::INFINITY };
    simplex.push((start, start_value));
    for k in 0..N {
        let mut x = start;
        x[k] += steps[k];
        simplex.push((x, eval(&x)));
    }

    for _ in 0..opts.max_iters {
        // Stable sort: on ties the earlier vertex (initially `start`) stays best.
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[N].1;
        if worst - best <= opts.f_tol * (1.0 + best.abs()) {
            break;
        }

        let mut centroid = [0.0; N];
        for (x, _) in &simplex[..N] {
            for (c, xi) in centroid.iter_mut().zip(x) {
                *c += xi / N as f64;
            }
        }
        // centroid + t * (from - centroid)
        let along = |from: &[f64; N], t: f64| {
            let mut out = centroid;
            for (o, (c, xi)) in out.iter_mut().zip(centroid.iter().zip(from)) {
                *o = c + t * (xi - c);
            }
            out
        };

        let worst_x = simplex[N].0;
        let reflected = along(&worst_x, -REFLECT);
        let fr = eval(&reflected);

        if fr < best {
            let expanded = along(&worst_x, -EXPAND);
            let fe = eval(&expanded);
            simplex[N] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
        } else if fr < simplex[N - 1].1 {
            simplex[N] = (reflected, fr);
        } else {
            let contracted = if fr < worst {
                along(&worst_x, -CONTRACT)
            } else {
                along(&worst_x, CONTRACT)
            };
            let fc = eval(&contracted);
            if fc < fr.min(worst) {
                simplex[N] = (contracted, fc);
            } else {
                let best_x = simplex[0].0;
                for (x, value) in simplex.iter_mut().skip(1) {
                    for (xi, b) in x.iter_mut().zip(best_x) {
                        *xi = b + SHRINK * (*xi - b);
                    }
                    *value = eval(x);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    simplex[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTS: SimplexOptions = SimplexOptions {
        max_iters: 500,
        f_tol: 1e-14,
    };

    #[test]
    fn finds_minimum_of_a_skewed_bowl() {
        let f = |x: &[f64; 2]| (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2) + 0.5 * x[0] * x[1];
        let (x, value) = minimize(f, [0.0, 0.0], f(&[0.0, 0.0]), [0.5, 0.5], OPTS);

        // Gradient vanishes at the minimum.
        let gx = 2.0 * (x[0] - 1.0) + 0.5 * x[1];
        let gy = 20.0 * (x[1] + 2.0) + 0.5 * x[0];
        assert!(gx.abs() < 1e-4 && gy.abs() < 1e-4, "gradient ({gx}, {gy}) at {x:?}");
        assert!(value <= f(&[0.0, 0.0]));
    }

    #[test]
    fn never_returns_worse_than_start() {
        // Only the start point has a finite score.
        let f = |x: &[f64; 3]| if x == &[0.0; 3] { 1.0 } else { f64::NAN };
        let (x, value) = minimize(f, [0.0; 3], 1.0, [1.0; 3], OPTS);
        assert_eq!(x, [0.0; 3]);
        assert_eq!(value, 1.0);
    }
}

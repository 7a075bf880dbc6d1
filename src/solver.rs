//! Brent's method: a bracketed 1-D root finder combining bisection, secant,
//! and inverse quadratic interpolation. Guaranteed to converge if the
//! initial bracket straddles a continuous zero.

use crate::config::SolverConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverResult {
    pub root: f64,
    pub converged: bool,
    pub iterations: u32,
}

pub struct BrentSolver;

impl BrentSolver {
    /// Solves `f(x) = 0` for `x` in `[min, max]` given `f(min)*f(max) <= 0`.
    pub fn solve<F>(mut f: F, min: f64, max: f64, config: &SolverConfig) -> SolverResult
    where
        F: FnMut(f64) -> f64,
    {
        let mut a = min;
        let mut b = max;
        let mut fa = f(a);
        let mut fb = f(b);

        if fa * fb > 0.0 {
            if fa.abs() < f64::EPSILON {
                return SolverResult {
                    root: a,
                    converged: true,
                    iterations: 0,
                };
            }
            if fb.abs() < f64::EPSILON {
                return SolverResult {
                    root: b,
                    converged: true,
                    iterations: 0,
                };
            }
            return SolverResult {
                root: 0.0,
                converged: false,
                iterations: 0,
            };
        }

        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut e = d;

        for iter in 0..config.max_iter {
            if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }

            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol = 2.0 * f64::EPSILON * b.abs() + config.tolerance;
            let m = 0.5 * (c - b);

            if m.abs() <= tol || fb == 0.0 {
                return SolverResult {
                    root: b,
                    converged: true,
                    iterations: iter + 1,
                };
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q);

                if a == c {
                    p = 2.0 * m * s;
                    q = 1.0 - s;
                } else {
                    q = fa / fc;
                    let r = fb / fc;
                    p = s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0));
                    q = (q - 1.0) * (r - 1.0) * (s - 1.0);
                }

                if p > 0.0 {
                    q = -q;
                } else {
                    p = -p;
                }

                let s_prev = e;
                e = d;

                if 2.0 * p < 3.0 * m * q - (tol * q).abs() && p < (0.5 * s_prev * q).abs() {
                    d = p / q;
                } else {
                    d = m;
                    e = m;
                }
            } else {
                d = m;
                e = m;
            }

            a = b;
            fa = fb;

            if d.abs() > tol {
                b += d;
            } else {
                b += if m > 0.0 { tol } else { -tol };
            }
            fb = f(b);
        }

        SolverResult {
            root: b,
            converged: false,
            iterations: config.max_iter,
        }
    }
}

//! Numeric knobs that the original engine and solver hard-coded inline.
//!
//! Every `Default` value reproduces the constant the spec names, so existing
//! call sites can pass `&EngineConfig::default()` and get exactly the
//! documented behavior.

/// Bump sizes and the common-random-numbers seed used by the Monte Carlo
/// engine's finite-difference Greeks.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Seed used for the base simulation and every bumped rerun. Keeping this
    /// fixed across reruns is what makes the finite differences low-variance
    /// (common random numbers).
    pub mc_seed: u64,
    /// Fraction of `S0` used for the central spot bump (delta, gamma).
    pub delta_bump_frac: f64,
    /// Absolute volatility-point bump used for vega (flat-vol reconstruction).
    pub vega_bump: f64,
    /// Absolute rate bump used for rho (flat-rate reconstruction).
    pub rho_bump: f64,
    /// Calendar days backed out of `T` for the backward theta difference.
    pub theta_bump_days: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mc_seed: 42,
            delta_bump_frac: 0.01,
            vega_bump: 0.01,
            rho_bump: 1e-4,
            theta_bump_days: 1.0,
        }
    }
}

/// Convergence knobs for [`crate::solver::BrentSolver`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iter: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            tolerance: 1e-8,
            max_iter: 100,
        }
    }
}

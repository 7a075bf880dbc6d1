//! Optional PyO3 bindings, built only with `--features python`.
//!
//! The core API is generic over term-structure, payoff, and gatherer traits;
//! PyO3 classes can't expose generics directly, so this layer binds the
//! common concrete case (flat rate, flat vol, vanilla payoff, `Actual365Fixed`
//! day count, linear interpolation) that the Python side actually needs.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::curve::{CurveInput, YieldCurve};
use crate::engine::{self, McResult};
use crate::error::GreekCoreError;
use crate::interpolation::LinearInterpolator;
use crate::payoff::{OptionType, VanillaPayoff};
use crate::term_structure::ConstantParameters;
use crate::config::{EngineConfig, SolverConfig};
use crate::time::{Actual365Fixed, Date};

fn to_py_err(e: GreekCoreError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

#[pyclass(name = "OptionGreeks")]
#[derive(Clone)]
pub struct PyOptionGreeks {
    #[pyo3(get)]
    pub price: f64,
    #[pyo3(get)]
    pub delta: f64,
    #[pyo3(get)]
    pub gamma: f64,
    #[pyo3(get)]
    pub theta: f64,
    #[pyo3(get)]
    pub vega: f64,
    #[pyo3(get)]
    pub rho: f64,
    #[pyo3(get)]
    pub stderr: f64,
}

impl From<McResult> for PyOptionGreeks {
    fn from(r: McResult) -> Self {
        PyOptionGreeks {
            price: r.price,
            delta: r.delta,
            gamma: r.gamma,
            theta: r.theta,
            vega: r.vega,
            rho: r.rho,
            stderr: r.stderr,
        }
    }
}

/// Monte Carlo price and Greeks for a European vanilla call/put under flat
/// rate and flat volatility.
///
/// Args:
///     spot: Current underlying price.
///     strike: Option strike.
///     rate: Flat annualized risk-free rate.
///     vol: Flat annualized volatility.
///     maturity_years: Time to maturity, in years.
///     n_paths: Number of antithetic path pairs to simulate.
///     is_call: `True` for a call, `False` for a put.
///
/// Returns:
///     An `OptionGreeks` with price, delta, gamma, theta, vega, rho, stderr.
#[pyfunction]
#[pyo3(name = "monte_carlo_price_european")]
fn py_monte_carlo_price_european(
    spot: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    maturity_years: f64,
    n_paths: u64,
    is_call: bool,
) -> PyResult<PyOptionGreeks> {
    let r = ConstantParameters::new(rate);
    let sigma = ConstantParameters::new(vol);
    let option_type = if is_call { OptionType::Call } else { OptionType::Put };
    let payoff = VanillaPayoff::new(option_type, strike);
    let config = EngineConfig::default();

    let result = engine::monte_carlo_price_european(
        spot,
        &r,
        &sigma,
        maturity_years,
        n_paths,
        &payoff,
        &config,
    )
    .map_err(to_py_err)?;

    Ok(result.into())
}

/// A discount curve bootstrapped from deposits and annual par swaps,
/// `Actual365Fixed` day-count, linear log-DF interpolation.
#[pyclass(name = "YieldCurve")]
pub struct PyYieldCurve {
    inner: YieldCurve<Actual365Fixed, LinearInterpolator>,
}

#[pymethods]
impl PyYieldCurve {
    /// Builds the curve from parallel lists: `rate`, `is_swap`, `start_days`
    /// (offset from `ref_date`), `maturity_days`, and `frequency` (payments
    /// per year, ignored for deposits). All lists must have the same length
    /// and be sorted by ascending `maturity_days`.
    #[new]
    #[allow(clippy::too_many_arguments)]
    fn new(
        ref_year: i32,
        ref_month: u32,
        ref_day: u32,
        rates: Vec<f64>,
        is_swap: Vec<bool>,
        start_days: Vec<i64>,
        maturity_days: Vec<i64>,
        frequency: Vec<u32>,
    ) -> PyResult<Self> {
        let ref_date = Date::new(ref_year, ref_month, ref_day)
            .ok_or_else(|| PyValueError::new_err("invalid reference date"))?;

        if rates.len() != is_swap.len()
            || rates.len() != start_days.len()
            || rates.len() != maturity_days.len()
            || rates.len() != frequency.len()
        {
            return Err(PyValueError::new_err("curve input arrays must have equal length"));
        }

        let instruments: Vec<CurveInput> = (0..rates.len())
            .map(|i| {
                let start = ref_date.add_days(start_days[i]);
                let maturity = ref_date.add_days(maturity_days[i]);
                if is_swap[i] {
                    CurveInput::swap(rates[i], start, maturity, frequency[i])
                } else {
                    CurveInput::deposit(rates[i], start, maturity)
                }
            })
            .collect();

        let inner = YieldCurve::new(
            ref_date,
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .map_err(to_py_err)?;

        Ok(PyYieldCurve { inner })
    }

    fn discount_factor_at(&self, t: f64) -> PyResult<f64> {
        self.inner.discount_factor_at(t).map_err(to_py_err)
    }

    fn zero_rate_at(&self, t: f64) -> PyResult<f64> {
        self.inner.zero_rate_at(t).map_err(to_py_err)
    }
}

/// A Python module implemented in Rust for Monte Carlo option pricing and
/// discount-curve bootstrapping.
///
/// - `monte_carlo_price_european`: price and Greeks for a flat-rate,
///   flat-vol European vanilla option.
/// - `YieldCurve`: bootstraps a discount curve from deposits and swaps.
/// - `OptionGreeks`: container returned by the pricing function.
#[pymodule]
fn greekcore(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_monte_carlo_price_european, m)?)?;
    m.add_class::<PyYieldCurve>()?;
    m.add_class::<PyOptionGreeks>()?;
    Ok(())
}

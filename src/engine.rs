//! Monte Carlo pricing under risk-neutral geometric Brownian motion, plus
//! Greeks by finite differences with common random numbers.

use std::f64::consts::PI;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::EngineConfig;
use crate::error::GreekCoreError;
use crate::payoff::{PathPayoff, TerminalPayoff};
use crate::rng::ScrambledRng;
use crate::statistics::{Gatherer, StatisticsMean, SyncGatherer};
use crate::term_structure::{ConstantParameters, TermStructure};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct McResult {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
    pub stderr: f64,
}

/// One Box-Muller standard normal draw, clamped away from `u1=0` per the
/// documented `~1e-9` bias tradeoff.
#[inline]
fn standard_normal(rng: &mut ScrambledRng) -> f64 {
    let mut u1 = rng.next_f64();
    if u1 < 1e-9 {
        u1 = 1e-9;
    }
    let u2 = rng.next_f64();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn validate_common(s0: f64, t: f64, n_paths: u64) -> Result<(), GreekCoreError> {
    if s0 <= 0.0 {
        return Err(GreekCoreError::invalid_input("spot must be positive"));
    }
    if t <= 0.0 {
        return Err(GreekCoreError::invalid_input("maturity must be positive"));
    }
    if n_paths == 0 {
        return Err(GreekCoreError::invalid_input("path count must be positive"));
    }
    Ok(())
}

/// Simulates antithetic path pairs and pushes `df * pair_estimate` to
/// `observe` once per pair — so the gatherer's observation count is
/// `n_paths / 2`, not `n_paths`.
fn simulate_european_core<R, V, P>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    payoff: &P,
    seed: u64,
    mut observe: impl FnMut(f64),
) -> Result<(), GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: TerminalPayoff,
{
    validate_common(s0, t, n_paths)?;

    let total_r = r.integral(0.0, t);
    let total_v2 = sigma.integral_square(0.0, t);
    let drift = total_r - 0.5 * total_v2;
    let diffusion = total_v2.sqrt();
    let df = (-total_r).exp();

    let mut rng = ScrambledRng::new(seed);
    let pairs = n_paths.div_ceil(2);

    for _ in 0..pairs {
        let z = standard_normal(&mut rng);
        let st_plus = s0 * (drift + diffusion * z).exp();
        let st_minus = s0 * (drift - diffusion * z).exp();
        let pair_estimate = 0.5 * (payoff.payoff(st_plus) + payoff.payoff(st_minus));
        observe(df * pair_estimate);
    }

    Ok(())
}

/// Runs the European path simulation, pushing each pair result into
/// `gatherer`.
pub fn simulate_european<R, V, P, G>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    payoff: &P,
    seed: u64,
    gatherer: &mut G,
) -> Result<(), GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: TerminalPayoff,
    G: Gatherer,
{
    simulate_european_core(s0, r, sigma, t, n_paths, payoff, seed, |x| gatherer.observe(x))
}

fn run_european<R, V, P>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    payoff: &P,
    seed: u64,
) -> Result<(f64, f64), GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: TerminalPayoff,
{
    let mut gatherer = StatisticsMean::new();
    simulate_european(s0, r, sigma, t, n_paths, payoff, seed, &mut gatherer)?;
    let row = gatherer
        .results()
        .into_iter()
        .next()
        .expect("StatisticsMean::results always yields exactly one row");
    Ok((row[0], row[1]))
}

/// Five perturbed reruns of the European path sharing `config.mc_seed`
/// (common random numbers), given the already-computed base `price`.
/// Returns `(delta, gamma, vega, rho, theta)`.
#[allow(clippy::too_many_arguments)]
fn european_greeks<R, V, P>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    payoff: &P,
    config: &EngineConfig,
    price: f64,
) -> Result<(f64, f64, f64, f64, f64), GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: TerminalPayoff,
{
    let ds = config.delta_bump_frac * s0;
    let (p_plus, _) = run_european(s0 + ds, r, sigma, t, n_paths, payoff, config.mc_seed)?;
    let (p_minus, _) = run_european(s0 - ds, r, sigma, t, n_paths, payoff, config.mc_seed)?;
    let delta = (p_plus - p_minus) / (2.0 * ds);
    let gamma = (p_plus - 2.0 * price + p_minus) / (ds * ds);

    let sigma_rms = sigma.rms(0.0, t);
    let sigma_up = ConstantParameters::new(sigma_rms + config.vega_bump);
    let sigma_down = ConstantParameters::new((sigma_rms - config.vega_bump).max(0.0));
    let (p_vega_plus, _) = run_european(s0, r, &sigma_up, t, n_paths, payoff, config.mc_seed)?;
    let (p_vega_minus, _) = run_european(s0, r, &sigma_down, t, n_paths, payoff, config.mc_seed)?;
    let vega = (p_vega_plus - p_vega_minus) / (2.0 * config.vega_bump);

    let r_mean = r.mean(0.0, t);
    let r_up = ConstantParameters::new(r_mean + config.rho_bump);
    let r_down = ConstantParameters::new(r_mean - config.rho_bump);
    let (p_rho_plus, _) = run_european(s0, &r_up, sigma, t, n_paths, payoff, config.mc_seed)?;
    let (p_rho_minus, _) = run_european(s0, &r_down, sigma, t, n_paths, payoff, config.mc_seed)?;
    let rho = (p_rho_plus - p_rho_minus) / (2.0 * config.rho_bump);

    let theta_dt = config.theta_bump_days / 365.0;
    let theta = if t > theta_dt {
        let (p_theta, _) = run_european(s0, r, sigma, t - theta_dt, n_paths, payoff, config.mc_seed)?;
        (p_theta - price) / theta_dt
    } else {
        0.0
    };

    Ok((delta, gamma, vega, rho, theta))
}

/// Prices a European option and its Greeks. Five perturbed reruns share the
/// base run's path count and RNG seed (common random numbers), so finite
/// differences see only the bump, not fresh sampling noise.
pub fn monte_carlo_price_european<R, V, P>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    payoff: &P,
    config: &EngineConfig,
) -> Result<McResult, GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: TerminalPayoff,
{
    let (price, stderr) = run_european(s0, r, sigma, t, n_paths, payoff, config.mc_seed)?;
    let (delta, gamma, vega, rho, theta) = european_greeks(s0, r, sigma, t, n_paths, payoff, config, price)?;

    tracing::debug!(
        price,
        delta,
        gamma,
        vega,
        rho,
        theta,
        stderr,
        "priced european option via monte carlo"
    );

    Ok(McResult {
        price,
        delta,
        gamma,
        theta,
        vega,
        rho,
        stderr,
    })
}

/// Runs the European path simulation on a background thread, observing the
/// base run into `gatherer` so a monitor thread can poll progress, then
/// completes the five Greek bumps on private gatherers before returning the
/// full `McResult`. `gatherer` is `Arc`-owned so its lifetime does not need
/// to outlive the spawned thread by convention alone.
pub fn monte_carlo_price_european_async<R, V, P, G>(
    s0: f64,
    r: R,
    sigma: V,
    t: f64,
    n_paths: u64,
    payoff: P,
    gatherer: Arc<G>,
    config: EngineConfig,
) -> JoinHandle<Result<McResult, GreekCoreError>>
where
    R: TermStructure + 'static,
    V: TermStructure + 'static,
    P: TerminalPayoff + 'static,
    G: SyncGatherer + 'static,
{
    thread::spawn(move || {
        simulate_european_core(s0, &r, &sigma, t, n_paths, &payoff, config.mc_seed, |x| {
            gatherer.observe_shared(x)
        })?;

        let base_row = SyncGatherer::results(&*gatherer)
            .into_iter()
            .next()
            .expect("a synchronized gatherer always yields exactly one row");
        let price = base_row[0];
        let stderr = base_row[1];

        let (delta, gamma, vega, rho, theta) =
            european_greeks(s0, &r, &sigma, t, n_paths, &payoff, &config, price)?;

        Ok(McResult {
            price,
            delta,
            gamma,
            theta,
            vega,
            rho,
            stderr,
        })
    })
}

/// Simulates a full path in `m_steps` increments and pushes one discounted
/// payoff per path; no antithetic pairing.
pub fn simulate_path_dependent<R, V, P, G>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    m_steps: u32,
    payoff: &P,
    seed: u64,
    gatherer: &mut G,
) -> Result<(), GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: PathPayoff,
    G: Gatherer,
{
    validate_common(s0, t, n_paths)?;
    if m_steps == 0 {
        return Err(GreekCoreError::invalid_input("step count must be positive"));
    }

    let dt = t / m_steps as f64;
    let mut step_drift = Vec::with_capacity(m_steps as usize);
    let mut step_diffusion = Vec::with_capacity(m_steps as usize);
    for j in 0..m_steps {
        let t0 = j as f64 * dt;
        let t1 = t0 + dt;
        let r_j = r.integral(t0, t1);
        let v2_j = sigma.integral_square(t0, t1);
        step_drift.push(r_j - 0.5 * v2_j);
        step_diffusion.push(v2_j.sqrt());
    }
    let df = (-r.integral(0.0, t)).exp();

    let mut rng = ScrambledRng::new(seed);
    let mut path = vec![0.0f64; m_steps as usize];

    for _ in 0..n_paths {
        let mut spot = s0;
        for j in 0..m_steps as usize {
            let z = standard_normal(&mut rng);
            spot *= (step_drift[j] + step_diffusion[j] * z).exp();
            path[j] = spot;
        }
        gatherer.observe(df * payoff.payoff(&path));
    }

    Ok(())
}

fn run_path_dependent<R, V, P>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    m_steps: u32,
    payoff: &P,
    seed: u64,
) -> Result<(f64, f64), GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: PathPayoff,
{
    let mut gatherer = StatisticsMean::new();
    simulate_path_dependent(s0, r, sigma, t, n_paths, m_steps, payoff, seed, &mut gatherer)?;
    let row = gatherer
        .results()
        .into_iter()
        .next()
        .expect("StatisticsMean::results always yields exactly one row");
    Ok((row[0], row[1]))
}

/// Prices a path-dependent option and its Greeks. Mirrors
/// [`monte_carlo_price_european`]'s five bumped reruns on common random
/// numbers, just against the full-path simulation core instead of the
/// antithetic terminal-spot one.
#[allow(clippy::too_many_arguments)]
pub fn monte_carlo_price_path_dependent<R, V, P>(
    s0: f64,
    r: &R,
    sigma: &V,
    t: f64,
    n_paths: u64,
    m_steps: u32,
    payoff: &P,
    config: &EngineConfig,
) -> Result<McResult, GreekCoreError>
where
    R: TermStructure,
    V: TermStructure,
    P: PathPayoff,
{
    let (price, stderr) = run_path_dependent(s0, r, sigma, t, n_paths, m_steps, payoff, config.mc_seed)?;

    let ds = config.delta_bump_frac * s0;
    let (p_plus, _) = run_path_dependent(s0 + ds, r, sigma, t, n_paths, m_steps, payoff, config.mc_seed)?;
    let (p_minus, _) = run_path_dependent(s0 - ds, r, sigma, t, n_paths, m_steps, payoff, config.mc_seed)?;
    let delta = (p_plus - p_minus) / (2.0 * ds);
    let gamma = (p_plus - 2.0 * price + p_minus) / (ds * ds);

    let sigma_rms = sigma.rms(0.0, t);
    let sigma_up = ConstantParameters::new(sigma_rms + config.vega_bump);
    let sigma_down = ConstantParameters::new((sigma_rms - config.vega_bump).max(0.0));
    let (p_vega_plus, _) = run_path_dependent(s0, r, &sigma_up, t, n_paths, m_steps, payoff, config.mc_seed)?;
    let (p_vega_minus, _) = run_path_dependent(s0, r, &sigma_down, t, n_paths, m_steps, payoff, config.mc_seed)?;
    let vega = (p_vega_plus - p_vega_minus) / (2.0 * config.vega_bump);

    let r_mean = r.mean(0.0, t);
    let r_up = ConstantParameters::new(r_mean + config.rho_bump);
    let r_down = ConstantParameters::new(r_mean - config.rho_bump);
    let (p_rho_plus, _) = run_path_dependent(s0, &r_up, sigma, t, n_paths, m_steps, payoff, config.mc_seed)?;
    let (p_rho_minus, _) = run_path_dependent(s0, &r_down, sigma, t, n_paths, m_steps, payoff, config.mc_seed)?;
    let rho = (p_rho_plus - p_rho_minus) / (2.0 * config.rho_bump);

    let theta_dt = config.theta_bump_days / 365.0;
    let theta = if t > theta_dt {
        let (p_theta, _) =
            run_path_dependent(s0, r, sigma, t - theta_dt, n_paths, m_steps, payoff, config.mc_seed)?;
        (p_theta - price) / theta_dt
    } else {
        0.0
    };

    tracing::debug!(
        price,
        delta,
        gamma,
        vega,
        rho,
        theta,
        stderr,
        "priced path-dependent option via monte carlo"
    );

    Ok(McResult {
        price,
        delta,
        gamma,
        theta,
        vega,
        rho,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payoff::{AsianPayoff, OptionType, VanillaPayoff};
    use statrs::distribution::{ContinuousCDF, Normal};

    fn black_scholes_call(s0: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        let d1 = ((s0 / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
        let d2 = d1 - sigma * t.sqrt();
        let n = Normal::new(0.0, 1.0).unwrap();
        s0 * n.cdf(d1) - k * (-r * t).exp() * n.cdf(d2)
    }

    fn black_scholes_put(s0: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        black_scholes_call(s0, k, r, sigma, t) - s0 + k * (-r * t).exp()
    }

    #[test]
    fn vanilla_call_converges_to_black_scholes() {
        let s0 = 100.0;
        let k = 100.0;
        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.2);
        let t = 1.0;
        let payoff = VanillaPayoff::new(OptionType::Call, k);
        let config = EngineConfig::default();

        let result = monte_carlo_price_european(s0, &r, &sigma, t, 1_000_000, &payoff, &config).unwrap();
        let exact = black_scholes_call(s0, k, r.value(), sigma.value(), t);
        assert!(
            (result.price - exact).abs() < 3.0 * result.stderr + 0.1,
            "mc price {} vs exact {}, stderr {}",
            result.price,
            exact,
            result.stderr
        );
    }

    #[test]
    fn put_call_parity_holds_within_tolerance() {
        let s0 = 100.0;
        let k = 110.0;
        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.3);
        let t = 0.5;
        let config = EngineConfig::default();

        let call = VanillaPayoff::new(OptionType::Call, k);
        let put = VanillaPayoff::new(OptionType::Put, k);
        let rc = monte_carlo_price_european(s0, &r, &sigma, t, 100_000, &call, &config).unwrap();
        let rp = monte_carlo_price_european(s0, &r, &sigma, t, 100_000, &put, &config).unwrap();

        let parity_gap = (rc.price - rp.price - (s0 - k * (-r.value() * t).exp())).abs();
        let tol = 5.0 * rc.stderr.max(rp.stderr);
        assert!(parity_gap <= tol, "parity gap {parity_gap} exceeds tolerance {tol}");
    }

    #[test]
    fn asian_call_is_cheaper_than_vanilla_call() {
        let s0 = 100.0;
        let k = 100.0;
        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.2);
        let t = 1.0;
        let config = EngineConfig::default();

        let vanilla = VanillaPayoff::new(OptionType::Call, k);
        let euro = monte_carlo_price_european(s0, &r, &sigma, t, 100_000, &vanilla, &config).unwrap();

        let asian = AsianPayoff::new(OptionType::Call, k);
        let result = monte_carlo_price_path_dependent(s0, &r, &sigma, t, 100_000, 252, &asian, &config).unwrap();

        assert!(result.price < euro.price);
        assert!(result.stderr > 0.0);
    }

    #[test]
    fn path_dependent_greeks_are_finite() {
        let s0 = 100.0;
        let k = 100.0;
        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.2);
        let t = 1.0;
        let config = EngineConfig::default();
        let asian = AsianPayoff::new(OptionType::Call, k);

        let result = monte_carlo_price_path_dependent(s0, &r, &sigma, t, 50_000, 50, &asian, &config).unwrap();

        assert!(result.delta.is_finite());
        assert!(result.gamma.is_finite());
        assert!(result.vega.is_finite());
        assert!(result.rho.is_finite());
        assert!(result.theta.is_finite());
        assert!(result.delta > 0.0, "an Asian call's delta should be positive");
    }

    #[test]
    fn theta_is_zero_when_maturity_is_below_the_bump_horizon() {
        let s0 = 100.0;
        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.2);
        let payoff = VanillaPayoff::new(OptionType::Call, 100.0);
        let config = EngineConfig::default();

        let result = monte_carlo_price_european(s0, &r, &sigma, 0.5 / 365.0, 1_000, &payoff, &config).unwrap();
        assert_eq!(result.theta, 0.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.2);
        let payoff = VanillaPayoff::new(OptionType::Call, 100.0);
        let config = EngineConfig::default();
        assert!(monte_carlo_price_european(-1.0, &r, &sigma, 1.0, 1000, &payoff, &config).is_err());
        assert!(monte_carlo_price_european(100.0, &r, &sigma, 1.0, 0, &payoff, &config).is_err());
    }

    #[test]
    fn async_pricing_populates_the_shared_gatherer() {
        use crate::statistics::StatisticsMeanLockFree;

        let r = ConstantParameters::new(0.05);
        let sigma = ConstantParameters::new(0.2);
        let payoff = VanillaPayoff::new(OptionType::Call, 100.0);
        let gatherer = Arc::new(StatisticsMeanLockFree::new());
        let config = EngineConfig::default();

        let handle = monte_carlo_price_european_async(
            100.0,
            r,
            sigma,
            1.0,
            200_000,
            payoff,
            Arc::clone(&gatherer),
            config,
        );
        let result = handle.join().unwrap().unwrap();

        assert!(gatherer.path_count() > 0);
        assert!(result.price > 0.0);
        assert!(result.delta.is_finite());
    }
}

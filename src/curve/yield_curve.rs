//! Sequential bootstrap of a discount curve from deposits, FRAs, and swaps.

use crate::config::SolverConfig;
use crate::error::GreekCoreError;
use crate::interpolation::Interpolator;
use crate::solver::BrentSolver;
use crate::time::{Date, DayCount};

use super::instrument::{CurveInput, InstrumentType};

/// `times[0..]` (years since `ref_date`) and `log_dfs[0..]` (`ln P(0,T)`),
/// both anchored at `(0, 0)`. `times` is strictly increasing; queries between
/// knots use `interpolator` on `log_dfs`, exponentiated.
pub struct YieldCurve<D: DayCount, I: Interpolator> {
    ref_date: Date,
    times: Vec<f64>,
    log_dfs: Vec<f64>,
    day_count: D,
    interpolator: I,
}

impl<D: DayCount, I: Interpolator> YieldCurve<D, I> {
    pub fn new(
        ref_date: Date,
        instruments: &[CurveInput],
        day_count: D,
        interpolator: I,
        solver_config: &SolverConfig,
    ) -> Result<Self, GreekCoreError> {
        let mut curve = YieldCurve {
            ref_date,
            times: vec![0.0],
            log_dfs: vec![0.0],
            day_count,
            interpolator,
        };

        let mut prev_maturity_years = 0.0f64;
        for (idx, instrument) in instruments.iter().enumerate() {
            let maturity_years = curve
                .day_count
                .year_fraction(curve.ref_date, instrument.maturity_date);

            if maturity_years <= prev_maturity_years {
                return Err(GreekCoreError::invalid_input(
                    "curve instruments must be sorted by strictly increasing maturity",
                ));
            }
            prev_maturity_years = maturity_years;

            curve.bootstrap_point(instrument, maturity_years, idx, solver_config)?;
        }

        Ok(curve)
    }

    /// Log-DF of a time `t` given a trial `(T, L)` pair not yet appended to
    /// the curve's grid: flat-interpolated over the established grid for
    /// `t <= T_prev`, linearly interpolated between `(T_prev, L_prev)` and
    /// `(T, candidate_log_df)` beyond it. This is the invariant that keeps
    /// the solver's view of intermediate dates consistent with the final
    /// interpolator once the point is appended.
    fn trial_discount_factor(
        &self,
        t: f64,
        maturity_years: f64,
        candidate_log_df: f64,
    ) -> Result<f64, GreekCoreError> {
        let t_prev = *self.times.last().expect("anchor point always present");
        let l_prev = *self.log_dfs.last().expect("anchor point always present");

        let log_df = if t <= t_prev {
            self.interpolator.interpolate(t, &self.times, &self.log_dfs)?
        } else {
            let span = maturity_years - t_prev;
            if span.abs() < f64::EPSILON {
                candidate_log_df
            } else {
                l_prev + (t - t_prev) * (candidate_log_df - l_prev) / span
            }
        };
        Ok(log_df.exp())
    }

    fn bootstrap_point(
        &mut self,
        instrument: &CurveInput,
        maturity_years: f64,
        instrument_index: usize,
        solver_config: &SolverConfig,
    ) -> Result<(), GreekCoreError> {
        let start_years = self.day_count.year_fraction(self.ref_date, instrument.start_date);

        let residual = |candidate_log_df: f64| -> f64 {
            match instrument.instrument_type {
                InstrumentType::Deposit | InstrumentType::Fra => {
                    let alpha = self
                        .day_count
                        .year_fraction(instrument.start_date, instrument.maturity_date);
                    let df_maturity = self
                        .trial_discount_factor(maturity_years, maturity_years, candidate_log_df)
                        .unwrap_or(0.0);
                    let df_start = self
                        .trial_discount_factor(start_years, maturity_years, candidate_log_df)
                        .unwrap_or(0.0);
                    df_maturity * (1.0 + instrument.rate * alpha) - df_start
                }
                InstrumentType::Swap => {
                    let freq = instrument.frequency.max(1) as f64;
                    let dt = 1.0 / freq;
                    let mut sum = 0.0;
                    let mut k = 1u32;
                    loop {
                        let t_k = start_years + k as f64 * dt;
                        if t_k > maturity_years + 1e-4 {
                            break;
                        }
                        sum += self
                            .trial_discount_factor(t_k, maturity_years, candidate_log_df)
                            .unwrap_or(0.0);
                        k += 1;
                    }
                    let df_maturity = self
                        .trial_discount_factor(maturity_years, maturity_years, candidate_log_df)
                        .unwrap_or(0.0);
                    let df_start = self
                        .trial_discount_factor(start_years, maturity_years, candidate_log_df)
                        .unwrap_or(0.0);
                    instrument.rate * dt * sum - (df_start - df_maturity)
                }
            }
        };

        let bracket_min = -2.0 * maturity_years;
        let bracket_max = 0.1 * maturity_years;
        let result = BrentSolver::solve(residual, bracket_min, bracket_max, solver_config);

        if !result.converged {
            tracing::warn!(
                instrument_index,
                maturity_years,
                "curve bootstrap failed to converge"
            );
            return Err(GreekCoreError::BootstrapFailure {
                instrument_index,
                maturity_years,
            });
        }

        tracing::debug!(
            instrument_index,
            maturity_years,
            log_df = result.root,
            iterations = result.iterations,
            "bootstrapped curve knot"
        );

        self.times.push(maturity_years);
        self.log_dfs.push(result.root);
        Ok(())
    }

    fn year_fraction_from_ref(&self, date: Date) -> Result<f64, GreekCoreError> {
        if date < self.ref_date {
            return Err(GreekCoreError::invalid_input(
                "cannot query the curve before its reference date",
            ));
        }
        Ok(self.day_count.year_fraction(self.ref_date, date))
    }

    pub fn discount_factor_at(&self, t: f64) -> Result<f64, GreekCoreError> {
        if t < 0.0 {
            return Err(GreekCoreError::invalid_input(
                "cannot query the curve before its reference date",
            ));
        }
        let log_df = self.interpolator.interpolate(t, &self.times, &self.log_dfs)?;
        Ok(log_df.exp())
    }

    pub fn discount_factor(&self, date: Date) -> Result<f64, GreekCoreError> {
        let t = self.year_fraction_from_ref(date)?;
        self.discount_factor_at(t)
    }

    pub fn zero_rate_at(&self, t: f64) -> Result<f64, GreekCoreError> {
        if t == 0.0 {
            return Ok(0.0);
        }
        let df = self.discount_factor_at(t)?;
        Ok(-df.ln() / t)
    }

    pub fn zero_rate(&self, date: Date) -> Result<f64, GreekCoreError> {
        let t = self.year_fraction_from_ref(date)?;
        self.zero_rate_at(t)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn log_dfs(&self) -> &[f64] {
        &self.log_dfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::LinearInterpolator;
    use crate::time::Actual365Fixed;

    fn ref_date() -> Date {
        Date::new(2023, 1, 1).unwrap()
    }

    #[test]
    fn curve_knots_are_strictly_increasing_in_time() {
        let instruments = vec![
            CurveInput::deposit(0.02, ref_date(), ref_date().add_days(182)),
            CurveInput::swap(0.025, ref_date(), ref_date().add_days(365), 1),
        ];
        let curve = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .unwrap();
        let times = curve.times();
        for w in times.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn six_month_deposit_matches_closed_form_discount_factor() {
        let maturity = ref_date().add_days(182);
        let instruments = vec![CurveInput::deposit(0.02, ref_date(), maturity)];
        let curve = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .unwrap();

        let alpha = 182.0 / 365.0;
        let expected = 1.0 / (1.0 + 0.02 * alpha);
        let actual = curve.discount_factor(maturity).unwrap();
        assert!((actual - expected).abs() < 1e-7);
    }

    #[test]
    fn one_year_annual_swap_matches_closed_form_discount_factor() {
        let maturity = ref_date().add_days(365);
        let instruments = vec![CurveInput::swap(0.025, ref_date(), maturity, 1)];
        let curve = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .unwrap();

        let expected = 1.0 / 1.025;
        let actual = curve.discount_factor(maturity).unwrap();
        assert!((actual - expected).abs() < 1e-7);
    }

    #[test]
    fn unsorted_instruments_are_rejected() {
        let instruments = vec![
            CurveInput::deposit(0.02, ref_date(), ref_date().add_days(365)),
            CurveInput::deposit(0.02, ref_date(), ref_date().add_days(182)),
        ];
        let result = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn querying_before_the_reference_date_is_invalid() {
        let instruments = vec![CurveInput::deposit(0.02, ref_date(), ref_date().add_days(182))];
        let curve = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!(curve.discount_factor(ref_date().add_days(-1)).is_err());
    }

    #[test]
    fn zero_rate_at_the_reference_date_is_zero_by_convention() {
        let instruments = vec![CurveInput::deposit(0.02, ref_date(), ref_date().add_days(182))];
        let curve = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .unwrap();
        assert_eq!(curve.zero_rate(ref_date()).unwrap(), 0.0);
    }

    #[test]
    fn each_calibrating_instrument_reprices_to_par() {
        let dep_maturity = ref_date().add_days(182);
        let swap1_maturity = ref_date().add_days(365);
        let swap2_maturity = ref_date().add_days(730);
        let instruments = vec![
            CurveInput::deposit(0.02, ref_date(), dep_maturity),
            CurveInput::swap(0.025, ref_date(), swap1_maturity, 1),
            CurveInput::swap(0.03, ref_date(), swap2_maturity, 1),
        ];
        let curve = YieldCurve::new(
            ref_date(),
            &instruments,
            Actual365Fixed,
            LinearInterpolator,
            &SolverConfig::default(),
        )
        .unwrap();

        // Re-derive the par condition for the 2Y swap directly off the built curve.
        let df_start = curve.discount_factor(ref_date()).unwrap();
        let df_1y = curve.discount_factor(swap1_maturity).unwrap();
        let df_2y = curve.discount_factor(swap2_maturity).unwrap();
        let fixed_leg_pv = 0.03 * (df_1y + df_2y);
        let floating_leg_pv = df_start - df_2y;
        assert!((fixed_leg_pv - floating_leg_pv).abs() < 1e-6);
    }
}

//! Monte Carlo pricing of European and path-dependent equity derivatives
//! with Greeks, and bootstrapping of a discount curve from deposits, FRAs,
//! and par swaps.

pub mod config;
pub mod curve;
pub mod engine;
pub mod error;
pub mod interpolation;
pub mod payoff;
pub mod rng;
pub mod solver;
pub mod statistics;
pub mod term_structure;
pub mod time;

#[cfg(feature = "python")]
mod python;

pub use config::{EngineConfig, SolverConfig};
pub use curve::{CurveInput, InstrumentType, YieldCurve};
pub use engine::{
    monte_carlo_price_european, monte_carlo_price_european_async, monte_carlo_price_path_dependent,
    simulate_european, simulate_path_dependent, McResult,
};
pub use error::GreekCoreError;
pub use interpolation::{linear_interpolate, Interpolator, LinearInterpolator};
pub use payoff::{AsianPayoff, DigitalPayoff, DoubleDigitalPayoff, OptionType, PathPayoff, TerminalPayoff, VanillaPayoff};
pub use rng::ScrambledRng;
pub use solver::{BrentSolver, SolverResult};
pub use statistics::{Gatherer, StatisticsConvergence, StatisticsMean, StatisticsMeanLockFree, StatisticsThreadSafe, SyncGatherer};
pub use term_structure::{ConstantParameters, TermStructure};
pub use time::{adjust, Actual360, Actual365Fixed, ActualActual, BusinessDayConvention, Calendar, CustomCalendar, Date, DayCount, Thirty360, WeekendCalendar};

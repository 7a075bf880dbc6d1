//! Discount-curve bootstrap from deposits, FRAs, and swaps.

mod instrument;
mod yield_curve;

pub use instrument::{CurveInput, InstrumentType};
pub use yield_curve::YieldCurve;

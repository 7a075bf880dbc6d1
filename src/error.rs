//! Error taxonomy for the pricing and curve-bootstrap core.
//!
//! `NumericalDegeneracy` (negative variance, zero-width interval, zero paths
//! observed) is deliberately not a variant here: it is a soft condition that
//! gets silently sanitized at the point it occurs rather than propagated.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GreekCoreError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("bootstrap failed to converge for instrument {instrument_index} (T={maturity_years} years)")]
    BootstrapFailure {
        instrument_index: usize,
        maturity_years: f64,
    },
}

impl GreekCoreError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        GreekCoreError::InvalidInput {
            reason: reason.into(),
        }
    }
}

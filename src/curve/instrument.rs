//! Market instruments consumed by the curve bootstrap.

use crate::time::Date;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstrumentType {
    Deposit,
    Fra,
    Swap,
}

/// One calibrating instrument: a market rate observed on `start_date` to
/// `maturity_date`. `frequency` is payments per year and only consumed for
/// `Swap`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveInput {
    pub instrument_type: InstrumentType,
    pub rate: f64,
    pub start_date: Date,
    pub maturity_date: Date,
    pub frequency: u32,
}

impl CurveInput {
    pub fn deposit(rate: f64, start_date: Date, maturity_date: Date) -> Self {
        CurveInput {
            instrument_type: InstrumentType::Deposit,
            rate,
            start_date,
            maturity_date,
            frequency: 0,
        }
    }

    pub fn fra(rate: f64, start_date: Date, maturity_date: Date) -> Self {
        CurveInput {
            instrument_type: InstrumentType::Fra,
            rate,
            start_date,
            maturity_date,
            frequency: 0,
        }
    }

    pub fn swap(rate: f64, start_date: Date, maturity_date: Date, frequency: u32) -> Self {
        CurveInput {
            instrument_type: InstrumentType::Swap,
            rate,
            start_date,
            maturity_date,
            frequency,
        }
    }
}

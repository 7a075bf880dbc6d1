//! Business-day calendars and date adjustment conventions.
//!
//! No fixed holiday table ships here (see the curve and engine modules'
//! date handling — both operate in year-fraction space and never need one).
//! [`WeekendCalendar`] and [`CustomCalendar`] are enough to exercise and test
//! the adjustment conventions; a production deployment would plug in an
//! exchange-specific calendar implementing the same trait.

use std::collections::BTreeSet;

use super::date::Date;

pub trait Calendar {
    fn is_business_day(&self, d: Date) -> bool;

    fn name(&self) -> &str;
}

/// Weekends only.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeekendCalendar;

impl Calendar for WeekendCalendar {
    fn is_business_day(&self, d: Date) -> bool {
        !d.is_weekend()
    }

    fn name(&self) -> &str {
        "WeekendCalendar"
    }
}

/// Weekends plus an explicit holiday set.
#[derive(Clone, Debug, Default)]
pub struct CustomCalendar {
    holidays: BTreeSet<Date>,
}

impl CustomCalendar {
    pub fn new() -> Self {
        CustomCalendar::default()
    }

    pub fn add_holiday(&mut self, d: Date) {
        self.holidays.insert(d);
    }
}

impl Calendar for CustomCalendar {
    fn is_business_day(&self, d: Date) -> bool {
        if d.is_weekend() {
            return false;
        }
        !self.holidays.contains(&d)
    }

    fn name(&self) -> &str {
        "CustomCalendar"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusinessDayConvention {
    Unadjusted,
    Following,
    ModifiedFollowing,
    Preceding,
}

/// Rolls `d` onto a business day per `convention`, using `calendar` to test
/// each candidate.
pub fn adjust(d: Date, convention: BusinessDayConvention, calendar: &dyn Calendar) -> Date {
    if convention == BusinessDayConvention::Unadjusted || calendar.is_business_day(d) {
        return d;
    }

    match convention {
        BusinessDayConvention::Unadjusted => d,
        BusinessDayConvention::Following => {
            let mut curr = d;
            while !calendar.is_business_day(curr) {
                curr = curr.add_days(1);
            }
            curr
        }
        BusinessDayConvention::ModifiedFollowing => {
            let mut curr = d;
            while !calendar.is_business_day(curr) {
                curr = curr.add_days(1);
            }
            if curr.month() != d.month() {
                adjust(d, BusinessDayConvention::Preceding, calendar)
            } else {
                curr
            }
        }
        BusinessDayConvention::Preceding => {
            let mut curr = d;
            while !calendar.is_business_day(curr) {
                curr = curr.add_days(-1);
            }
            curr
        }
    }
}

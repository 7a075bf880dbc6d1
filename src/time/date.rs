//! A thin, explicit wrapper around [`chrono::NaiveDate`].

use chrono::{Datelike, Duration, NaiveDate};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    pub fn from_naive(d: NaiveDate) -> Self {
        Date(d)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn add_days(&self, n: i64) -> Self {
        Date(self.0 + Duration::days(n))
    }

    pub fn add_years(&self, n: i32) -> Self {
        let target_year = self.0.year() + n;
        let day = self.0.day().min(days_in_month(target_year, self.0.month()));
        Date(NaiveDate::from_ymd_opt(target_year, self.0.month(), day).expect("valid calendar date"))
    }

    pub fn add_months(&self, n: i32) -> Self {
        let total_months = (self.0.year() * 12 + self.0.month() as i32 - 1) + n;
        let target_year = total_months.div_euclid(12);
        let target_month = total_months.rem_euclid(12) as u32 + 1;
        let day = self.0.day().min(days_in_month(target_year, target_month));
        Date(NaiveDate::from_ymd_opt(target_year, target_month, day).expect("valid calendar date"))
    }

    /// `end - self`, in whole days. Negative if `end` precedes `self`.
    pub fn days_between(&self, end: Date) -> i64 {
        (end.0 - self.0).num_days()
    }

    pub fn is_weekend(&self) -> bool {
        use chrono::Weekday;
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid calendar date");
    let this_month_first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid calendar date");
    (next_month_first - this_month_first).num_days() as u32
}

//! Month arithmetic used by the monthly activity report.

use chrono::{Datelike, Months, NaiveDate, Weekday};

/// Returns the first and last day of the month `date` belongs to.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_day = date.with_day(1).unwrap_or(date);
    let last_day = first_day
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first_day);
    (first_day, last_day)
}

/// Iterates over every day of the month `date` belongs to, in order.
pub fn days_of_month(date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let (first_day, last_day) = month_bounds(date);
    first_day
        .iter_days()
        .take_while(move |day| *day <= last_day)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

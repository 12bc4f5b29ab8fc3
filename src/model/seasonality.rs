// src/model/seasonality.rs

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Demand intensity per calendar month. Peaks in July/August and tapers off
/// towards spring and winter.
pub fn month_multiplier(month: u32) -> f64 {
    match month {
        4 => 1.10,
        5 => 1.20,
        6 => 1.30,
        7 => 1.50,
        8 => 1.50,
        9 => 1.40,
        10 => 1.30,
        11 => 1.20,
        12 => 1.10,
        _ => 1.0,
    }
}

/// Demand intensity per weekday: busier on Monday, Friday and Saturday.
pub fn weekday_multiplier(weekday: Weekday) -> f64 {
    match weekday {
        Weekday::Sat => 1.50,
        Weekday::Mon | Weekday::Fri => 1.20,
        _ => 1.0,
    }
}

/// Combined multiplier for simulation day `day` counted from `start_date`.
pub fn seasonality_multiplier(start_date: NaiveDate, day: usize) -> f64 {
    start_date
        .checked_add_days(Days::new(day as u64))
        .map_or(1.0, |date| {
            month_multiplier(date.month()) * weekday_multiplier(date.weekday())
        })
}

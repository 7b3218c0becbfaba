// Calendar arithmetic for fixed-length terms and monthly pay periods.

use chrono::{Datelike, NaiveDate};

/// A calendar month.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> YearMonth {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_index(idx: i64) -> YearMonth {
        YearMonth {
            year: idx.div_euclid(12) as i32,
            month: (idx.rem_euclid(12) + 1) as u32,
        }
    }

    pub fn next(&self) -> YearMonth {
        YearMonth::from_index(self.index() + 1)
    }
}

/// Walks the calendar months of a span, one month at a time.
///
/// The walk starts at the month of `start` and stops before the month of `end`:
/// a span from 2019-04-21 to 2023-04-23 covers April 2019 to March 2023.
#[derive(Debug, Clone)]
pub struct MonthWalk {
    current: YearMonth,
    end_marker: YearMonth,
}

impl Iterator for MonthWalk {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        if self.current >= self.end_marker {
            return None;
        }
        let res = self.current;
        self.current = self.current.next();
        Some(res)
    }
}

pub fn iterate_months(start: NaiveDate, end: NaiveDate) -> MonthWalk {
    MonthWalk {
        current: YearMonth::of(start),
        end_marker: YearMonth::of(end),
    }
}

/// The number of whole calendar months walked between two dates.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    iterate_months(start, end).count() as u32
}

/// How many times the given calendar month (1-based) occurs in the walk between two dates.
pub fn count_month_occurrences(start: NaiveDate, end: NaiveDate, month: u32) -> u32 {
    iterate_months(start, end)
        .filter(|ym| ym.month == month)
        .count() as u32
}

/// Adds whole years to a date. February 29th maps to February 28th in non-leap years.
/// Dates past the calendar range saturate to `NaiveDate::MAX`.
pub fn add_years_safe(date: NaiveDate, years: u32) -> NaiveDate {
    let year = match i32::try_from(years)
        .ok()
        .and_then(|y| date.year().checked_add(y))
    {
        Some(y) => y,
        None => return NaiveDate::MAX,
    };
    match NaiveDate::from_ymd_opt(year, date.month(), date.day()) {
        Some(d) => d,
        // Only February 29th can fail here.
        None => NaiveDate::from_ymd_opt(year, 2, 28).unwrap_or(NaiveDate::MAX),
    }
}

/// The compact `YYYYMMDD` code of a date.
pub fn date_code(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Parses a `YYYYMMDD` code. Returns None if the code is not a valid date.
pub fn parse_date_code(code: &str) -> Option<NaiveDate> {
    if code.len() != 8 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(code, "%Y%m%d").ok()
}

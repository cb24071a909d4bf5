//! Calendar quarters and date ranges.
//!
//! Quarters are written `YYYYQn`, e.g. `2015Q1`, which is also the form used
//! in file names throughout the pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillsError};

/// First and last (month, day) of each quarter.
const MONTH_DAY: [((u32, u32), (u32, u32)); 4] = [
    ((1, 1), (3, 31)),
    ((4, 1), (6, 30)),
    ((7, 1), (9, 30)),
    ((10, 1), (12, 31)),
];

/// Years a [`Quarter`] can hold; its text form has exactly four year digits.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// A calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Create a quarter; `quarter` must be 1 through 4 and `year` within
    /// [`YEAR_RANGE`].
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !YEAR_RANGE.contains(&year) {
            return Err(SkillsError::invalid_argument(format!(
                "year must be between 0 and 9999, got {year}"
            )));
        }
        if !(1..=4).contains(&quarter) {
            return Err(SkillsError::invalid_argument(format!(
                "quarter must be between 1 and 4, got {quarter}"
            )));
        }
        Ok(Quarter { year, quarter })
    }

    /// The quarter containing `date`.
    pub fn from_date<D: Datelike>(date: &D) -> Result<Self> {
        let (year, quarter) = datetime_to_year_quarter(date);
        Quarter::new(year, quarter)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// First and last day of the quarter, both inclusive.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let ((start_month, start_day), (end_month, end_day)) =
            MONTH_DAY[usize::from(self.quarter - 1)];
        let date = |month, day| {
            NaiveDate::from_ymd_opt(self.year, month, day).ok_or_else(|| {
                SkillsError::invalid_argument(format!("year {} is out of range", self.year))
            })
        };
        Ok((date(start_month, start_day)?, date(end_month, end_day)?))
    }

    /// Whether `date` falls inside this quarter.
    pub fn contains<D: Datelike>(&self, date: &D) -> bool {
        datetime_to_year_quarter(date) == (self.year, self.quarter)
    }

    /// The following quarter, `None` after `9999Q4`.
    pub fn next(&self) -> Option<Quarter> {
        if self.quarter < 4 {
            return Some(Quarter {
                year: self.year,
                quarter: self.quarter + 1,
            });
        }
        Quarter::new(self.year + 1, 1).ok()
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = SkillsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SkillsError::parse(format!("expected a quarter like 2015Q1, got {s:?}"));

        let bytes = s.as_bytes();
        if bytes.len() != 6 || !bytes[..4].iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        if !matches!(bytes[4], b'Q' | b'q') || !(b'1'..=b'4').contains(&bytes[5]) {
            return Err(invalid());
        }

        let year = s[..4].parse().map_err(|_| invalid())?;
        Ok(Quarter {
            year,
            quarter: bytes[5] - b'0',
        })
    }
}

impl TryFrom<String> for Quarter {
    type Error = SkillsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Quarter> for String {
    fn from(quarter: Quarter) -> Self {
        quarter.to_string()
    }
}

/// Convert a quarter such as `2015Q1` into its first and last day.
pub fn quarter_to_daterange(quarter: &str) -> Result<(NaiveDate, NaiveDate)> {
    quarter.parse::<Quarter>()?.date_range()
}

/// The year and quarter number of a date or datetime.
pub fn datetime_to_year_quarter<D: Datelike>(dt: &D) -> (i32, u8) {
    let quarter = (dt.month0() / 3 + 1) as u8;
    (dt.year(), quarter)
}

/// The quarter of a date or datetime in `2015Q1` form.
pub fn datetime_to_quarter<D: Datelike>(dt: &D) -> Result<String> {
    Ok(Quarter::from_date(dt)?.to_string())
}

/// Whether two closed ranges share at least one point.
pub fn overlaps<T: PartialOrd>(start_one: T, end_one: T, start_two: T, end_two: T) -> bool {
    start_one <= end_two && start_two <= end_one
}

/// Every date from `start_date` (inclusive) up to `end_date` (exclusive).
pub fn dates_in_range(start_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDate> {
    start_date
        .iter_days()
        .take_while(|date| *date < end_date)
        .collect()
}

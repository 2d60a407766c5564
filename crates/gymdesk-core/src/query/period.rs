//! Symbolic time periods and their resolution to concrete instant ranges.
//!
//! Every period resolves to a half-open `[start, end)` range. `today` is
//! `[00:00 today, 00:00 tomorrow)` in the caller's UTC offset; calendar
//! periods end at the first instant of the following period. Weeks start on
//! Monday.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::GymError;
use crate::validate::ValidationErrors;

/// Field key used for a missing or invalid custom start bound.
pub const CUSTOM_START_FIELD: &str = "custom_start_date";
/// Field key used for a missing or invalid custom end bound.
pub const CUSTOM_END_FIELD: &str = "custom_end_date";

/// Symbolic time period tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    ThisYear,
    LastYear,
    Custom,
}

impl Period {
    pub const ALL: [Self; 11] = [
        Self::Today,
        Self::Yesterday,
        Self::ThisWeek,
        Self::LastWeek,
        Self::ThisMonth,
        Self::LastMonth,
        Self::ThisQuarter,
        Self::LastQuarter,
        Self::ThisYear,
        Self::LastYear,
        Self::Custom,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this_week",
            Self::LastWeek => "last_week",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::ThisQuarter => "this_quarter",
            Self::LastQuarter => "last_quarter",
            Self::ThisYear => "this_year",
            Self::LastYear => "last_year",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|period| period.as_str() == normalized)
            .ok_or_else(|| GymError::UnknownPeriod {
                token: s.to_string(),
            })
    }
}

/// A half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `start <= t < end`.
    #[must_use]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Resolve `period` to a concrete range anchored at `now`.
///
/// Calendar boundaries are computed in `now`'s offset. Explicit bounds are
/// only consulted for [`Period::Custom`], where both are required.
///
/// # Errors
///
/// Returns a validation error when a custom bound is missing or the bounds
/// are reversed, and [`GymError::InvalidDate`] when calendar arithmetic
/// leaves chrono's supported range.
pub fn resolve_range(
    period: Period,
    explicit_start: Option<DateTime<Utc>>,
    explicit_end: Option<DateTime<Utc>>,
    now: DateTime<FixedOffset>,
) -> Result<DateRange, GymError> {
    let offset = *now.offset();
    let today = now.date_naive();

    let (first, last) = match period {
        Period::Custom => return resolve_custom(explicit_start, explicit_end),
        Period::Today => (today, add_days(today, 1)?),
        Period::Yesterday => (sub_days(today, 1)?, today),
        Period::ThisWeek => {
            let monday = week_start(today)?;
            (monday, add_days(monday, 7)?)
        }
        Period::LastWeek => {
            let monday = week_start(today)?;
            (sub_days(monday, 7)?, monday)
        }
        Period::ThisMonth => {
            let first = month_start(today)?;
            (first, add_months(first, 1)?)
        }
        Period::LastMonth => {
            let first = month_start(today)?;
            (sub_months(first, 1)?, first)
        }
        Period::ThisQuarter => {
            let first = quarter_start(today)?;
            (first, add_months(first, 3)?)
        }
        Period::LastQuarter => {
            let first = quarter_start(today)?;
            (sub_months(first, 3)?, first)
        }
        Period::ThisYear => {
            let first = year_start(today)?;
            (first, add_months(first, 12)?)
        }
        Period::LastYear => {
            let first = year_start(today)?;
            (sub_months(first, 12)?, first)
        }
    };

    Ok(DateRange::new(
        local_midnight(first, offset)?,
        local_midnight(last, offset)?,
    ))
}

/// Parse `token` and resolve it, treating `"all"`/empty as no constraint.
///
/// # Errors
///
/// Returns [`GymError::UnknownPeriod`] for unrecognized tokens, plus every
/// error [`resolve_range`] can return.
pub fn resolve_token(
    token: &str,
    explicit_start: Option<DateTime<Utc>>,
    explicit_end: Option<DateTime<Utc>>,
    now: DateTime<FixedOffset>,
) -> Result<Option<DateRange>, GymError> {
    if is_unconstrained(token) {
        return Ok(None);
    }
    let period = token.parse::<Period>()?;
    resolve_range(period, explicit_start, explicit_end, now).map(Some)
}

/// The `"all"` / empty sentinel.
#[must_use]
pub fn is_unconstrained(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

/// Midnight at the start of `date` in `offset`, as a UTC instant.
///
/// # Errors
///
/// Returns [`GymError::InvalidDate`] if the instant cannot be represented.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<Utc>, GymError> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| GymError::InvalidDate(format!("midnight of {date}")))
}

fn resolve_custom(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<DateRange, GymError> {
    let mut errors = ValidationErrors::new();
    if start.is_none() {
        errors.add(CUSTOM_START_FIELD, "Start date is required for custom range.");
    }
    if end.is_none() {
        errors.add(CUSTOM_END_FIELD, "End date is required for custom range.");
    }
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            errors.add(CUSTOM_END_FIELD, "End date must be on or after start date.");
            Err(errors.into())
        }
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
        _ => Err(errors.into()),
    }
}

pub(crate) fn week_start(date: NaiveDate) -> Result<NaiveDate, GymError> {
    sub_days(date, u64::from(date.weekday().num_days_from_monday()))
}

pub(crate) fn month_start(date: NaiveDate) -> Result<NaiveDate, GymError> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| GymError::InvalidDate(format!("first of month for {date}")))
}

fn quarter_start(date: NaiveDate) -> Result<NaiveDate, GymError> {
    let month = (date.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1)
        .ok_or_else(|| GymError::InvalidDate(format!("first of quarter for {date}")))
}

fn year_start(date: NaiveDate) -> Result<NaiveDate, GymError> {
    NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .ok_or_else(|| GymError::InvalidDate(format!("first of year for {date}")))
}

pub(crate) fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, GymError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| GymError::InvalidDate(format!("{date} + {days} days")))
}

fn sub_days(date: NaiveDate, days: u64) -> Result<NaiveDate, GymError> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| GymError::InvalidDate(format!("{date} - {days} days")))
}

pub(crate) fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, GymError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| GymError::InvalidDate(format!("{date} + {months} months")))
}

fn sub_months(date: NaiveDate, months: u32) -> Result<NaiveDate, GymError> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| GymError::InvalidDate(format!("{date} - {months} months")))
}

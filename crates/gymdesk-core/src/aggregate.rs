//! Summary statistics and date bucketing over filtered record sets.
//!
//! Every division is guarded: an empty input yields zeros, never NaN.
//! Stored values stay unrounded; [`round_percent`] is for display only.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GymError;
use crate::query::field::{FieldKind, Record};
use crate::query::period::{
    DateRange, add_days, add_months, local_midnight, month_start, week_start,
};

/// Implemented by record types that have a dashboard summary.
pub trait Summarize: Sized {
    type Summary: Serialize + fmt::Debug + Clone + PartialEq;

    fn summarize(records: &[&Self]) -> Self::Summary;
}

/// `part / whole * 100`, or 0 when `whole` is zero.
#[must_use]
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 || !whole.is_finite() {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Percentage of two counts.
#[must_use]
pub fn count_percentage(part: usize, whole: usize) -> f64 {
    percentage(as_f64(part), as_f64(whole))
}

/// Sum of `values`, starting from positive zero.
pub fn total(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |sum, value| sum + value)
}

/// Arithmetic mean, or 0 for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / as_f64(count) }
}

/// Round a percentage to the nearest whole number for display.
#[must_use]
pub fn round_percent(value: f64) -> i64 {
    if value.is_finite() {
        #[allow(clippy::cast_possible_truncation)]
        let rounded = value.round() as i64;
        rounded
    } else {
        0
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) const fn as_f64(count: usize) -> f64 {
    count as f64
}

/// Count records per key, pre-seeding `known` keys with zero so dashboards
/// always show every status.
pub fn count_by<'a, T: 'a, K: fmt::Display>(
    records: impl IntoIterator<Item = &'a T>,
    known: impl IntoIterator<Item = K>,
    key: impl Fn(&T) -> K,
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> =
        known.into_iter().map(|k| (k.to_string(), 0)).collect();
    for record in records {
        *counts.entry(key(record).to_string()).or_default() += 1;
    }
    counts
}

/// Bucket width for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report bucket: `[start, end)` with a count and a summed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    pub total: f64,
}

/// Split `range` into contiguous buckets aligned to local midnights.
///
/// The first bucket starts at `range.start`; week and month buckets after
/// it begin on a Monday or the first of a month. The last one is clipped
/// to `range.end`.
///
/// # Errors
///
/// Returns [`GymError::InvalidDate`] if bucket boundaries overflow.
pub fn bucket_bounds(
    range: DateRange,
    granularity: Granularity,
    offset: FixedOffset,
) -> Result<Vec<DateRange>, GymError> {
    let mut bounds = Vec::new();
    let mut start = range.start;
    while start < range.end {
        let local_day = start.with_timezone(&offset).date_naive();
        let next_day = match granularity {
            Granularity::Day => add_days(local_day, 1)?,
            Granularity::Week => add_days(week_start(local_day)?, 7)?,
            Granularity::Month => add_months(month_start(local_day)?, 1)?,
        };
        let next = local_midnight(next_day, offset)?.min(range.end);
        bounds.push(DateRange::new(start, next));
        start = next;
    }
    Ok(bounds)
}

/// Count records (and optionally sum a numeric field) per bucket.
///
/// Records are placed by their value in `date_field`; records outside
/// `range` or without a date are ignored.
///
/// # Errors
///
/// Fails on unknown fields, a non-date `date_field`, a non-numeric
/// `sum_field`, or bucket boundary overflow.
pub fn bucket_records<T: Record>(
    records: &[&T],
    date_field: &str,
    sum_field: Option<&str>,
    range: DateRange,
    granularity: Granularity,
    offset: FixedOffset,
) -> Result<Vec<Bucket>, GymError> {
    let schema = T::schema();
    let date_spec = schema.require(date_field)?;
    if date_spec.kind != FieldKind::Date {
        return Err(GymError::invalid(
            date_field,
            format!("{date_field} is not a date field."),
        ));
    }
    if let Some(sum_field) = sum_field {
        if schema.require(sum_field)?.kind != FieldKind::Number {
            return Err(GymError::invalid(
                sum_field,
                format!("{sum_field} is not a numeric field."),
            ));
        }
    }

    let mut buckets: Vec<Bucket> = bucket_bounds(range, granularity, offset)?
        .into_iter()
        .map(|bounds| Bucket {
            start: bounds.start,
            end: bounds.end,
            count: 0,
            total: 0.0,
        })
        .collect();

    for record in records {
        let Some(at) = record.value(date_field).as_date() else {
            continue;
        };
        if !range.contains(at) {
            continue;
        }
        // Buckets are sorted and contiguous, so the first bucket whose end
        // lies past `at` is the one containing it.
        let index = buckets.partition_point(|bucket| bucket.end <= at);
        if let Some(bucket) = buckets.get_mut(index) {
            bucket.count += 1;
            if let Some(sum_field) = sum_field {
                bucket.total += record.value(sum_field).as_number().unwrap_or(0.0);
            }
        }
    }

    Ok(buckets)
}

/// Per-bucket record counts over the schema's primary date field.
///
/// # Errors
///
/// See [`bucket_records`].
pub fn bucket_counts<T: Record>(
    records: &[&T],
    range: DateRange,
    granularity: Granularity,
    offset: FixedOffset,
) -> Result<Vec<Bucket>, GymError> {
    bucket_records(records, T::schema().date_field, None, range, granularity, offset)
}

/// Per-bucket sums of `sum_field` over the schema's primary date field.
///
/// # Errors
///
/// See [`bucket_records`].
pub fn bucket_sums<T: Record>(
    records: &[&T],
    sum_field: &str,
    range: DateRange,
    granularity: Granularity,
    offset: FixedOffset,
) -> Result<Vec<Bucket>, GymError> {
    bucket_records(
        records,
        T::schema().date_field,
        Some(sum_field),
        range,
        granularity,
        offset,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fixtures::row;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn percentage_guards_zero() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
        assert_eq!(count_percentage(0, 0), 0.0);
        assert!((count_percentage(1, 3) - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
        assert_eq!(mean([2.0, 4.0]), 3.0);
    }

    #[test]
    fn round_percent_is_display_only() {
        let rate = count_percentage(2, 3);
        assert_eq!(round_percent(rate), 67);
        assert!((rate - 66.666_666).abs() < 1e-4);
        assert_eq!(round_percent(f64::NAN), 0);
    }

    #[test]
    fn count_by_seeds_known_keys() {
        let items = ["a", "b", "a"];
        let counts = count_by(items.iter(), ["a", "b", "c"], |s| *s);
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(counts.get("c"), Some(&0));
    }

    #[test]
    fn day_buckets_cover_range() {
        let range = DateRange::new(utc(2024, 10, 21, 0), utc(2024, 10, 24, 0));
        let bounds = bucket_bounds(range, Granularity::Day, FixedOffset::east_opt(0).unwrap())
            .unwrap();
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0].start, range.start);
        assert_eq!(bounds[2].end, range.end);
        for pair in bounds.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn month_buckets_are_clipped() {
        let range = DateRange::new(utc(2024, 1, 1, 0), utc(2024, 3, 15, 0));
        let bounds = bucket_bounds(range, Granularity::Month, FixedOffset::east_opt(0).unwrap())
            .unwrap();
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[1].start, utc(2024, 2, 1, 0));
        assert_eq!(bounds[2].end, utc(2024, 3, 15, 0));
    }

    #[test]
    fn month_buckets_snap_to_the_first() {
        let range = DateRange::new(utc(2024, 1, 31, 0), utc(2024, 4, 10, 0));
        let bounds = bucket_bounds(range, Granularity::Month, FixedOffset::east_opt(0).unwrap())
            .unwrap();
        let starts: Vec<_> = bounds.iter().map(|b| b.start).collect();
        assert_eq!(
            starts,
            [
                utc(2024, 1, 31, 0),
                utc(2024, 2, 1, 0),
                utc(2024, 3, 1, 0),
                utc(2024, 4, 1, 0)
            ]
        );
        assert_eq!(bounds[3].end, range.end);
    }

    #[test]
    fn week_buckets_snap_to_monday() {
        // 2024-10-23 is a Wednesday.
        let range = DateRange::new(utc(2024, 10, 23, 0), utc(2024, 11, 6, 0));
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let bounds = bucket_bounds(range, Granularity::Week, offset).unwrap();
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0].start, range.start);
        assert_eq!(bounds[0].end, utc(2024, 10, 27, 22));
        assert_eq!(bounds[1].end, utc(2024, 11, 3, 22));
        assert_eq!(bounds[2].end, range.end);
    }

    #[test]
    fn records_land_in_their_bucket() {
        let records = [
            row("a", "A", "active", 10.0, utc(2024, 10, 21, 8)),
            row("b", "B", "active", 5.0, utc(2024, 10, 21, 23)),
            row("c", "C", "active", 7.5, utc(2024, 10, 23, 0)),
            row("d", "D", "active", 1.0, utc(2024, 10, 24, 0)),
        ];
        let refs: Vec<_> = records.iter().collect();
        let range = DateRange::new(utc(2024, 10, 21, 0), utc(2024, 10, 24, 0));
        let buckets =
            bucket_sums(&refs, "score", range, Granularity::Day, FixedOffset::east_opt(0).unwrap())
                .unwrap();
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, [2, 0, 1]);
        assert_eq!(buckets[0].total, 15.0);
        assert_eq!(buckets[2].total, 7.5);

        let counts = bucket_counts(&refs, range, Granularity::Week, FixedOffset::east_opt(0).unwrap())
            .unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[0].total, 0.0);
    }

    #[test]
    fn bucket_fields_are_checked() {
        let refs: Vec<&crate::query::fixtures::Row> = Vec::new();
        let range = DateRange::new(utc(2024, 10, 21, 0), utc(2024, 10, 24, 0));
        let offset = FixedOffset::east_opt(0).unwrap();
        assert!(bucket_records(&refs, "name", None, range, Granularity::Day, offset).is_err());
        assert!(bucket_records(&refs, "at", Some("name"), range, Granularity::Day, offset).is_err());
    }
}

//! Generic record query pipeline.
//!
//! Every feature listing goes through the same steps:
//!
//! 1. date-range predicate (when a period filter is active)
//! 2. equality and search predicates, AND-combined
//! 3. `total` = number of filtered records
//! 4. stable sort
//! 5. page slice
//!
//! The pipeline is a pure function of its inputs. `total` always reflects
//! the filtered, pre-pagination count.

pub mod field;
pub mod page;
pub mod period;
pub mod predicate;
pub mod sort;

pub use field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
pub use page::{DEFAULT_PAGE_SIZE, PageState};
pub use period::{DateRange, Period, resolve_range};
pub use predicate::{FilterState, PeriodFilter, Predicate, build_predicate};
pub use sort::{Comparator, SortDirection, SortState, build_comparator};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::Summarize;
use crate::error::GymError;

/// Filter, sort and page configuration for one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub filter: FilterState,
    /// `None` uses the record type's default sort key.
    #[serde(default)]
    pub sort: Option<SortState>,
    #[serde(default)]
    pub page: PageState,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: SortState) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn page(mut self, page: PageState) -> Self {
        self.page = page;
        self
    }
}

/// One page of results plus the filtered total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage<R> {
    pub rows: Vec<R>,
    /// Filtered count before pagination.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Range applied by the period filter, if any.
    pub range: Option<DateRange>,
}

impl<R> QueryPage<R> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A page together with the summary of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome<R, S> {
    #[serde(flatten)]
    pub page: QueryPage<R>,
    pub summary: S,
}

/// Filter and sort `records` without paginating.
///
/// Exposed separately so callers such as export and reporting can work on
/// the complete ordered set.
///
/// # Errors
///
/// Propagates predicate and comparator construction errors.
pub fn filter_and_sort<'a, T: Record>(
    records: &'a [T],
    filter: &FilterState,
    sort: Option<&SortState>,
    now: DateTime<FixedOffset>,
) -> Result<(Vec<&'a T>, Predicate), GymError> {
    let schema = T::schema();
    let predicate = build_predicate(filter, schema, now)?;
    let comparator = build_comparator(schema, sort)?;
    let mut filtered = predicate.filter(records);
    comparator.sort(&mut filtered);
    Ok((filtered, predicate))
}

/// Run the full pipeline and return the requested page.
///
/// # Errors
///
/// Fails on unknown fields or periods, invalid custom ranges, and zero page
/// sizes. No partial result is produced on error.
pub fn run_query<'a, T: Record>(
    records: &'a [T],
    query: &Query,
    now: DateTime<FixedOffset>,
) -> Result<QueryPage<&'a T>, GymError> {
    query.page.validate()?;
    let (sorted, predicate) = filter_and_sort(records, &query.filter, query.sort.as_ref(), now)?;
    let total = sorted.len();
    let rows = query.page.slice(&sorted).to_vec();

    debug!(
        kind = %T::schema().kind,
        source = records.len(),
        total,
        page = query.page.page,
        page_size = query.page.page_size,
        "query pipeline ran"
    );

    Ok(QueryPage {
        rows,
        total,
        page: query.page.page,
        page_size: query.page.page_size,
        page_count: query.page.page_count(total),
        range: predicate.range(),
    })
}

/// Like [`run_query`], additionally summarizing the filtered set.
///
/// # Errors
///
/// Same as [`run_query`].
pub fn run_query_with_summary<'a, T: Record + Summarize>(
    records: &'a [T],
    query: &Query,
    now: DateTime<FixedOffset>,
) -> Result<QueryOutcome<&'a T, T::Summary>, GymError> {
    query.page.validate()?;
    let (sorted, predicate) = filter_and_sort(records, &query.filter, query.sort.as_ref(), now)?;
    let summary = T::summarize(&sorted);
    let total = sorted.len();
    let rows = query.page.slice(&sorted).to_vec();

    Ok(QueryOutcome {
        page: QueryPage {
            rows,
            total,
            page: query.page.page,
            page_size: query.page.page_size,
            page_count: query.page.page_count(total),
            range: predicate.range(),
        },
        summary,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{Row, row};
    use super::*;
    use chrono::{TimeZone, Utc};

    fn now() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 10, 23, 12, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    fn rows() -> Vec<Row> {
        let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 10, d, h, 0, 0).unwrap();
        vec![
            row("r1", "Anna Berg", "active", 3.0, day(23, 6)),
            row("r2", "bob stone", "inactive", 1.0, day(22, 9)),
            row("r3", "Carla Diaz", "active", 5.0, day(23, 0)),
            row("r4", "Dan Annex", "active", 2.0, day(24, 0)),
            row("r5", "Eve Moss", "expired", 4.0, day(1, 10)),
        ]
    }

    fn ids<T: Record>(rows: &[&T]) -> Vec<String> {
        rows.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_default_order() {
        let records = rows();
        let page = run_query(&records, &Query::new(), now()).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(ids(&page.rows), ["r1", "r2", "r3", "r4", "r5"]);
        assert_eq!(page.range, None);
    }

    #[test]
    fn equality_filter_and_all_sentinel() {
        let records = rows();
        let active = Query::new().filter(FilterState::new().with_equals("status", "active"));
        assert_eq!(run_query(&records, &active, now()).unwrap().total, 3);

        let all = Query::new().filter(FilterState::new().with_equals("status", "all"));
        assert_eq!(run_query(&records, &all, now()).unwrap().total, 5);

        let empty = Query::new().filter(FilterState::new().with_equals("status", ""));
        assert_eq!(run_query(&records, &empty, now()).unwrap().total, 5);
    }

    #[test]
    fn all_sentinel_disables_search() {
        let records = rows();
        for term in ["all", "ALL", " all ", ""] {
            let filter = FilterState::new().with_search(term);
            assert!(filter.is_empty(), "{term:?} should not constrain");
            let page = run_query(&records, &Query::new().filter(filter), now()).unwrap();
            assert_eq!(page.total, 5, "search {term:?}");
        }

        let literal = FilterState::new().with_search("alls");
        assert!(!literal.is_empty());
    }

    #[test]
    fn equality_is_exact() {
        let records = rows();
        let q = Query::new().filter(FilterState::new().with_equals("status", "Active"));
        assert_eq!(run_query(&records, &q, now()).unwrap().total, 0);
    }

    #[test]
    fn numeric_equality_parses_value() {
        let records = rows();
        let q = Query::new().filter(FilterState::new().with_equals("score", "5"));
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r3"]);

        let bad = Query::new().filter(FilterState::new().with_equals("score", "five"));
        assert!(matches!(
            run_query(&records, &bad, now()),
            Err(GymError::Validation(_))
        ));
    }

    #[test]
    fn date_equality_is_rejected() {
        let records = rows();
        let q = Query::new().filter(FilterState::new().with_equals("at", "2024-10-23"));
        assert!(matches!(
            run_query(&records, &q, now()),
            Err(GymError::Validation(_))
        ));
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut records = rows();
        records[4].note = Some("Prefers ANNual plan".to_string());
        let q = Query::new().filter(FilterState::new().with_search("  ann "));
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r1", "r4", "r5"]);
    }

    #[test]
    fn search_field_override() {
        let mut records = rows();
        records[4].note = Some("anna's friend".to_string());
        let q = Query::new().filter(
            FilterState::new()
                .with_search("anna")
                .with_search_fields(["note"]),
        );
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r5"]);
    }

    #[test]
    fn missing_values_never_match_equality_but_search_as_empty() {
        let mut records = rows();
        records[0].note = None;
        let q = Query::new().filter(FilterState::new().with_equals("note", "x"));
        assert_eq!(run_query(&records, &q, now()).unwrap().total, 0);
        let search = Query::new().filter(FilterState::new().with_search("zzz"));
        assert_eq!(run_query(&records, &search, now()).unwrap().total, 0);
    }

    #[test]
    fn filters_combine_with_and() {
        let records = rows();
        let q = Query::new().filter(
            FilterState::new()
                .with_equals("status", "active")
                .with_search("an"),
        );
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r1", "r4"]);
    }

    #[test]
    fn today_period_is_half_open() {
        let records = rows();
        let q = Query::new().filter(FilterState::new().with_period(PeriodFilter::new("today")));
        let page = run_query(&records, &q, now()).unwrap();
        // r3 sits exactly on the start; r4 exactly on the end.
        assert_eq!(ids(&page.rows), ["r1", "r3"]);
        assert!(page.range.is_some());
    }

    #[test]
    fn unknown_period_fails_instead_of_matching_everything() {
        let records = rows();
        let q = Query::new().filter(FilterState::new().with_period(PeriodFilter::new("someday")));
        assert!(matches!(
            run_query(&records, &q, now()),
            Err(GymError::UnknownPeriod { .. })
        ));
    }

    #[test]
    fn period_on_non_date_field_is_rejected() {
        let records = rows();
        let q = Query::new()
            .filter(FilterState::new().with_period(PeriodFilter::new("today").on("name")));
        assert!(run_query(&records, &q, now()).is_err());
    }

    #[test]
    fn unknown_fields_are_errors() {
        let records = rows();
        let q = Query::new().filter(FilterState::new().with_equals("colour", "red"));
        assert!(matches!(
            run_query(&records, &q, now()),
            Err(GymError::UnknownField { .. })
        ));
        let s = Query::new().sort(SortState::asc("colour"));
        assert!(matches!(
            run_query(&records, &s, now()),
            Err(GymError::UnknownField { .. })
        ));
    }

    #[test]
    fn sort_by_number_desc() {
        let records = rows();
        let q = Query::new().sort(SortState::desc("score"));
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r3", "r5", "r1", "r4", "r2"]);
    }

    #[test]
    fn sort_by_text_ignores_case() {
        let records = rows();
        let q = Query::new().sort(SortState::asc("name"));
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r1", "r2", "r3", "r4", "r5"]);
    }

    #[test]
    fn missing_dates_sort_first_ascending() {
        let mut records = rows();
        records[2].at = None;
        let q = Query::new().sort(SortState::asc("at"));
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(page.rows[0].id, "r3");
    }

    #[test]
    fn pagination_reports_total_not_page_length() {
        let records = rows();
        let q = Query::new().page(PageState::new(1, 2));
        let page = run_query(&records, &q, now()).unwrap();
        assert_eq!(ids(&page.rows), ["r3", "r4"]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page_count, 3);

        let beyond = Query::new().page(PageState::new(9, 2));
        let page = run_query(&records, &beyond, now()).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn zero_page_size_is_an_error() {
        let records = rows();
        let q = Query::new().page(PageState::new(0, 0));
        assert!(run_query(&records, &q, now()).is_err());
    }
}

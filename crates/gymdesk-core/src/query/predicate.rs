//! Filter state and the predicates built from it.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::field::{FieldKind, FieldValue, Record, Schema, fold_case};
use super::period::{DateRange, is_unconstrained, resolve_token};
use crate::error::GymError;

/// Period constraint as held by a dashboard filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFilter {
    /// Symbolic token (`this_week`, `custom`, ...); `"all"` disables it.
    pub token: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    /// Date field to test; defaults to the schema's date field.
    #[serde(default)]
    pub field: Option<String>,
}

impl PeriodFilter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn custom(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            token: "custom".to_string(),
            start,
            end,
            field: None,
        }
    }

    #[must_use]
    pub fn on(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Filter criteria for a record listing.
///
/// All criteria combine with AND semantics. The sentinel `"all"` (or an
/// empty string) disables a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Exact-match filters keyed by field name.
    #[serde(default)]
    pub equals: BTreeMap<String, String>,
    /// Case-insensitive substring search term.
    #[serde(default)]
    pub search: String,
    /// Fields to search instead of the schema's search list.
    #[serde(default)]
    pub search_fields: Option<Vec<String>>,
    #[serde(default)]
    pub period: Option<PeriodFilter>,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    #[must_use]
    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: PeriodFilter) -> Self {
        self.period = Some(period);
        self
    }

    /// Returns true if no criterion is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equals.values().all(|value| is_unconstrained(value))
            && is_unconstrained(&self.search)
            && self
                .period
                .as_ref()
                .is_none_or(|period| is_unconstrained(&period.token))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expected {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Within {
        field: &'static str,
        range: DateRange,
    },
    Equals {
        field: &'static str,
        expected: Expected,
    },
    Search {
        fields: Vec<&'static str>,
        term: String,
    },
}

impl Clause {
    fn matches<T: Record>(&self, record: &T) -> bool {
        match self {
            Self::Within { field, range } => record
                .value(field)
                .as_date()
                .is_some_and(|at| range.contains(at)),
            Self::Equals { field, expected } => match (record.value(field), expected) {
                (FieldValue::Missing, _) => false,
                (FieldValue::Number(actual), Expected::Number(expected)) => {
                    actual.total_cmp(expected).is_eq()
                }
                (value, Expected::Text(expected)) => value.to_text() == expected.as_str(),
                _ => false,
            },
            Self::Search { fields, term } => fields
                .iter()
                .any(|field| fold_case(&record.value(field).to_text()).contains(term.as_str())),
        }
    }
}

/// A compiled conjunction of filter clauses.
///
/// The date clause, when present, is evaluated first, followed by equality
/// and search clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// A predicate that keeps every record.
    #[must_use]
    pub fn always() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }

    /// The resolved date range, if a period clause is active.
    #[must_use]
    pub fn range(&self) -> Option<DateRange> {
        self.clauses.iter().find_map(|clause| match clause {
            Clause::Within { range, .. } => Some(*range),
            _ => None,
        })
    }

    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Keep the records this predicate accepts, preserving order.
    pub fn filter<'a, T: Record>(&self, records: impl IntoIterator<Item = &'a T>) -> Vec<&'a T>
    where
        T: 'a,
    {
        records
            .into_iter()
            .filter(|record| self.matches(*record))
            .collect()
    }
}

/// Compile `filter` against `schema`, resolving any period at `now`.
///
/// # Errors
///
/// Fails on unknown field names, equality filters on date fields,
/// unparseable numeric filter values, unknown period tokens, and invalid
/// custom ranges.
pub fn build_predicate(
    filter: &FilterState,
    schema: &'static Schema,
    now: DateTime<FixedOffset>,
) -> Result<Predicate, GymError> {
    let mut clauses = Vec::new();

    if let Some(period) = &filter.period {
        let field_name = period.field.as_deref().unwrap_or(schema.date_field);
        let spec = schema.require(field_name)?;
        if spec.kind != FieldKind::Date {
            return Err(GymError::invalid(
                field_name,
                format!("{field_name} is not a date field and cannot take a period filter."),
            ));
        }
        if let Some(range) = resolve_token(&period.token, period.start, period.end, now)? {
            clauses.push(Clause::Within {
                field: spec.name,
                range,
            });
        }
    }

    for (field_name, value) in &filter.equals {
        let spec = schema.require(field_name)?;
        if is_unconstrained(value) {
            continue;
        }
        let expected = match spec.kind {
            FieldKind::Text | FieldKind::Enum => Expected::Text(value.clone()),
            FieldKind::Number => {
                let parsed = value.trim().parse::<f64>().map_err(|_| {
                    GymError::invalid(spec.name, format!("'{value}' is not a number."))
                })?;
                Expected::Number(parsed)
            }
            FieldKind::Date => {
                return Err(GymError::invalid(
                    spec.name,
                    "Date fields are filtered by period, not by exact value.",
                ));
            }
        };
        clauses.push(Clause::Equals {
            field: spec.name,
            expected,
        });
    }

    if !is_unconstrained(&filter.search) {
        let term = fold_case(&filter.search);
        let fields = match &filter.search_fields {
            Some(names) => names
                .iter()
                .map(|name| schema.require(name).map(|spec| spec.name))
                .collect::<Result<Vec<_>, _>>()?,
            None => schema.search.to_vec(),
        };
        clauses.push(Clause::Search { fields, term });
    }

    Ok(Predicate { clauses })
}

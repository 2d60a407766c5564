//! Sort state and comparators built from a record type's field table.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::field::{FieldKind, Record, Schema, compare_values};
use crate::error::GymError;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(GymError::invalid(
                "direction",
                format!("unknown sort direction '{other}': expected asc or desc"),
            )),
        }
    }
}

/// Sort key and direction for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A total order over one record type, resolved from a [`SortState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparator {
    field: &'static str,
    kind: FieldKind,
    direction: SortDirection,
}

impl Comparator {
    #[must_use]
    pub fn compare<T: Record>(&self, a: &T, b: &T) -> Ordering {
        let ordering = compare_values(self.kind, &a.value(self.field), &b.value(self.field));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Stable in-place sort of record references.
    pub fn sort<T: Record>(&self, records: &mut [&T]) {
        records.sort_by(|a, b| self.compare(*a, *b));
    }
}

/// Resolve `sort` against `schema`. `None` falls back to the schema's
/// default key, ascending.
///
/// # Errors
///
/// Returns [`GymError::UnknownField`] when the key is not in the field table.
pub fn build_comparator(
    schema: &'static Schema,
    sort: Option<&SortState>,
) -> Result<Comparator, GymError> {
    let (key, direction) = sort.map_or((schema.default_sort, SortDirection::Asc), |sort| {
        (sort.key.as_str(), sort.direction)
    });
    let spec = schema.require(key)?;
    Ok(Comparator {
        field: spec.name,
        kind: spec.kind,
        direction,
    })
}

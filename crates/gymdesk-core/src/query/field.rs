//! Field-kind tables that drive predicate and comparator dispatch.
//!
//! Each record type declares one static [`Schema`]. The query engine never
//! inspects record structs directly; it asks for a [`FieldValue`] by name and
//! interprets it according to the declared [`FieldKind`].

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::GymError;
use crate::model::RecordKind;

/// How a field is compared, searched, and exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; compared case-insensitively.
    Text,
    /// Enum-like string; equality is exact, ordering case-insensitive.
    Enum,
    /// Numeric value.
    Number,
    /// Instant in time.
    Date,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Enum => "enum",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

/// One named column of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Static description of a record type.
#[derive(Debug)]
pub struct Schema {
    pub kind: RecordKind,
    pub fields: &'static [FieldSpec],
    /// Fields consulted by the free-text search filter.
    pub search: &'static [&'static str],
    /// Field used by period filters unless one is named explicitly.
    pub date_field: &'static str,
    /// Sort key used when the caller provides none.
    pub default_sort: &'static str,
}

impl Schema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Look up a field, failing with [`GymError::UnknownField`].
    ///
    /// # Errors
    ///
    /// Returns an error when `name` is not declared for this record type.
    pub fn require(&self, name: &str) -> Result<&FieldSpec, GymError> {
        self.field(name).ok_or_else(|| GymError::UnknownField {
            kind: self.kind,
            field: name.to_string(),
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|spec| spec.name)
    }
}

/// A field read from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Date(DateTime<Utc>),
    Missing,
}

impl<'a> FieldValue<'a> {
    pub fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    pub fn opt_text(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, Self::text)
    }

    #[must_use]
    pub fn opt_date(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Missing, Self::Date)
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Textual rendering used by search, equality and export.
    ///
    /// Missing values render as the empty string.
    #[must_use]
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(value) => Cow::Borrowed(value.as_ref()),
            Self::Number(value) => Cow::Owned(format_number(*value)),
            Self::Date(value) => Cow::Owned(value.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Missing => Cow::Borrowed(""),
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }
}

/// Order two values of the declared kind.
///
/// Missing values sort as the kind's minimum: the empty string, the Unix
/// epoch, or zero. Values of the wrong shape are treated as missing.
#[must_use]
pub fn compare_values(kind: FieldKind, a: &FieldValue<'_>, b: &FieldValue<'_>) -> Ordering {
    match kind {
        FieldKind::Text | FieldKind::Enum => {
            let a = fold_case(&a.to_text());
            let b = fold_case(&b.to_text());
            a.cmp(&b)
        }
        FieldKind::Number => {
            let a = a.as_number().unwrap_or(0.0);
            let b = b.as_number().unwrap_or(0.0);
            a.total_cmp(&b)
        }
        FieldKind::Date => {
            let a = a.as_date().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let b = b.as_date().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            a.cmp(&b)
        }
    }
}

/// Case folding shared by search and text ordering.
#[must_use]
pub fn fold_case(value: &str) -> String {
    value.trim().to_lowercase()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Implemented by every feature record the engine can query.
pub trait Record {
    /// Static field table for this record type.
    fn schema() -> &'static Schema
    where
        Self: Sized;

    fn id(&self) -> &str;

    /// Read a field or derived key by name. Unknown names yield
    /// [`FieldValue::Missing`]; callers validate names against the schema.
    fn value(&self, field: &str) -> FieldValue<'_>;
}

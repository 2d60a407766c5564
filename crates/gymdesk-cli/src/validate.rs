//! Parsing and validation of raw command-line values.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use gymdesk_core::query::period::local_midnight;

use crate::output::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: &'static str,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: &'static str,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }

    pub fn to_cli_error(&self) -> CliError {
        CliError::with_details(
            format!("invalid {} '{}': {}", self.field, self.value, self.reason),
            self.suggestion.clone(),
            self.code,
        )
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} '{}': {}", self.field, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Which side of a half-open range a date argument bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Split `field=value`. The value may itself contain `=`.
pub fn parse_where(raw: &str) -> Result<(String, String), ValidationError> {
    let Some((field, value)) = raw.split_once('=') else {
        return Err(ValidationError::new(
            "where",
            raw,
            "expected FIELD=VALUE",
            "write the filter as --where status=active",
            "invalid_where",
        ));
    };
    let field = field.trim();
    if field.is_empty() {
        return Err(ValidationError::new(
            "where",
            raw,
            "field name must not be empty",
            "write the filter as --where status=active",
            "invalid_where",
        ));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

/// Parse an RFC 3339 instant or a `YYYY-MM-DD` date.
///
/// A bare date means local midnight in `offset`. As an [`Bound::End`], a
/// bare date covers the whole day, so it resolves to the following midnight.
pub fn parse_date_bound(
    raw: &str,
    offset: FixedOffset,
    bound: Bound,
) -> Result<DateTime<Utc>, ValidationError> {
    let field = match bound {
        Bound::Start => "from",
        Bound::End => "to",
    };
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.to_utc());
    }

    let invalid = |reason: String| {
        ValidationError::new(
            field,
            raw,
            reason,
            "use YYYY-MM-DD or an RFC 3339 timestamp such as 2024-10-23T09:00:00Z",
            "invalid_date",
        )
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| invalid(format!("not a date: {err}")))?;
    let date = match bound {
        Bound::Start => date,
        Bound::End => date
            .succ_opt()
            .ok_or_else(|| invalid("date out of range".to_string()))?,
    };
    local_midnight(date, offset).map_err(|err| invalid(err.to_string()))
}

/// Parse the `--now` override.
pub fn parse_now(raw: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    DateTime::parse_from_rfc3339(raw.trim()).map_err(|err| {
        ValidationError::new(
            "now",
            raw,
            err.to_string(),
            "pass an RFC 3339 timestamp such as 2024-10-23T12:00:00Z",
            "invalid_now",
        )
    })
}

/// Convert a one-based `--page` to the engine's zero-based index.
pub fn page_index(page: usize) -> Result<usize, ValidationError> {
    page.checked_sub(1).ok_or_else(|| {
        ValidationError::new(
            "page",
            page.to_string(),
            "pages are numbered from 1",
            "pass --page 1 for the first page",
            "invalid_page",
        )
    })
}

/// Split a comma-separated column list, dropping empty entries.
///
/// Entries may be `field` or `field:Label`.
pub fn parse_columns(raw: &str) -> Result<Vec<(String, Option<String>)>, ValidationError> {
    let columns: Vec<(String, Option<String>)> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((field, label)) => (field.trim().to_string(), Some(label.trim().to_string())),
            None => (entry.to_string(), None),
        })
        .collect();
    if columns.is_empty() {
        return Err(ValidationError::new(
            "columns",
            raw,
            "no columns named",
            "list fields separated by commas, e.g. --columns id,name,status",
            "invalid_columns",
        ));
    }
    Ok(columns)
}

//! CSV and JSON export of query results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GymError;
use crate::query::field::{FieldSpec, FieldValue, Record, Schema};

/// One output column: the field to read and the header to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,
    pub label: String,
}

impl Column {
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
        }
    }

    /// A column labelled with its field name.
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            label: field.clone(),
            field,
        }
    }
}

/// Every schema field, in declaration order, labelled with its name.
#[must_use]
pub fn default_columns(schema: &Schema) -> Vec<Column> {
    schema.field_names().map(Column::field).collect()
}

fn resolve<'s>(schema: &'s Schema, columns: &[Column]) -> Result<Vec<&'s FieldSpec>, GymError> {
    columns
        .iter()
        .map(|column| schema.require(&column.field))
        .collect()
}

/// Render `records` as RFC 4180 CSV with a header row. Lines end in CRLF.
///
/// # Errors
///
/// Returns [`GymError::UnknownField`] for a column not in the schema.
pub fn export_csv<T: Record>(records: &[&T], columns: &[Column]) -> Result<String, GymError> {
    let specs = resolve(T::schema(), columns)?;
    let mut out = String::new();
    push_row(&mut out, columns.iter().map(|c| c.label.as_str()));
    for record in records {
        let values: Vec<_> = specs.iter().map(|spec| record.value(spec.name)).collect();
        push_row(&mut out, values.iter().map(|v| v.to_text()));
    }
    Ok(out)
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: impl Iterator<Item = S>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(out, cell.as_ref());
    }
    out.push_str("\r\n");
}

fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

/// Render `records` as a JSON array of `{label: value}` objects.
///
/// Numbers stay numbers, dates are RFC 3339 strings and missing values are
/// `null`.
///
/// # Errors
///
/// Returns [`GymError::UnknownField`] for a column not in the schema.
pub fn export_json<T: Record>(records: &[&T], columns: &[Column]) -> Result<Value, GymError> {
    let specs = resolve(T::schema(), columns)?;
    let rows = records
        .iter()
        .map(|record| {
            let object: Map<String, Value> = columns
                .iter()
                .zip(&specs)
                .map(|(column, spec)| (column.label.clone(), to_json(&record.value(spec.name))))
                .collect();
            Value::Object(object)
        })
        .collect();
    Ok(Value::Array(rows))
}

fn to_json(value: &FieldValue<'_>) -> Value {
    match value {
        FieldValue::Missing => Value::Null,
        FieldValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        FieldValue::Text(_) | FieldValue::Date(_) => Value::String(value.to_text().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fixtures::{ROW_SCHEMA, Row, row};
    use chrono::{TimeZone, Utc};

    fn rows() -> Vec<Row> {
        let at = Utc.with_ymd_and_hms(2024, 10, 23, 6, 30, 0).unwrap();
        let mut quoted = row("r2", "Doe, \"JJ\"", "active", 2.5, at);
        quoted.note = Some("line one\nline two".to_string());
        vec![row("r1", "Anna", "active", 3.0, at), quoted]
    }

    #[test]
    fn csv_quotes_special_cells() {
        let records = rows();
        let refs: Vec<_> = records.iter().collect();
        let columns = [Column::field("id"), Column::new("name", "Name"), Column::field("note")];
        let csv = export_csv(&refs, &columns).unwrap();
        let expected = "id,Name,note\r\n\
                        r1,Anna,\r\n\
                        r2,\"Doe, \"\"JJ\"\"\",\"line one\nline two\"\r\n";
        assert_eq!(csv, expected);
    }

    #[test]
    fn json_keeps_types() {
        let records = rows();
        let refs: Vec<_> = records.iter().collect();
        let columns = [
            Column::field("score"),
            Column::new("at", "When"),
            Column::field("note"),
        ];
        let json = export_json(&refs, &columns).unwrap();
        assert_eq!(json[0]["score"], 3.0);
        assert_eq!(json[0]["When"], "2024-10-23T06:30:00Z");
        assert!(json[0]["note"].is_null());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let records = rows();
        let refs: Vec<_> = records.iter().collect();
        let err = export_csv(&refs, &[Column::field("shoe_size")]).unwrap_err();
        assert!(matches!(err, GymError::UnknownField { .. }));
    }

    #[test]
    fn default_columns_follow_schema() {
        let names: Vec<_> = default_columns(&ROW_SCHEMA)
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(names, ["id", "name", "status", "score", "at", "note"]);
    }
}

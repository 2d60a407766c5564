//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: aligned tables for humans, tab-separated rows for pipes and
//! scripts, or stable JSON.
//!
//! The mode itself is settled by `gymdesk_core::config::resolve_config`:
//! `--format`, then `--json`, then `FORMAT`, then the user config, then TTY
//! detection.

use clap::ValueEnum;
use gymdesk_core::error::GymError;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<24} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (aligned tables, sections).
    Pretty,
    /// Tab-separated rows for pipes and scripts.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a mode name settled by the config layer.
    pub fn from_resolved(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Text,
        }
    }
}

/// Rows of already-formatted cells under a header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Tab-separated header and rows. Tabs and newlines inside cells
    /// become spaces so every record stays on one line.
    pub fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        writeln!(w, "{}", self.headers.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|cell| flatten_cell(cell)).collect();
            writeln!(w, "{}", cells.join("\t"))?;
        }
        Ok(())
    }

    /// Space-aligned columns with a rule under the header.
    pub fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(flatten_cell(cell).chars().count());
                }
            }
        }

        write_aligned(w, &self.headers, &widths)?;
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(w, "{:-<total$}", "")?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|cell| flatten_cell(cell)).collect();
            write_aligned(w, &cells, &widths)?;
        }
        Ok(())
    }
}

fn write_aligned(w: &mut dyn Write, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(w, "{}", line.join("  ").trim_end())
}

fn flatten_cell(cell: &str) -> String {
    cell.replace(['\t', '\n', '\r'], " ")
}

/// Flatten a JSON object into `key: value` lines; nested objects use dotted
/// keys (`by_status.active`).
pub fn flatten_json(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(nested, path, out);
            }
        }
        Value::Number(number) => {
            let text = match number.as_f64() {
                Some(f) if number.is_f64() && f.fract() != 0.0 => format!("{f:.2}"),
                _ => number.to_string(),
            };
            out.push((prefix, text));
        }
        Value::String(text) => out.push((prefix, text.clone())),
        Value::Null => out.push((prefix, "-".to_string())),
        other => out.push((prefix, other.to_string())),
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_mode_to(&mut out, mode, value, text_fn, pretty_fn)
}

/// [`render_mode`] against an arbitrary writer.
pub fn render_mode_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, out)?,
        OutputMode::Pretty => pretty_fn(value, out)?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`, or a snake_case CLI code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMessage>,
}

#[derive(Debug, Serialize)]
pub struct FieldMessage {
    pub field: String,
    pub message: String,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
            fields: Vec::new(),
        }
    }

    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
            fields: Vec::new(),
        }
    }
}

impl From<&GymError> for CliError {
    fn from(err: &GymError) -> Self {
        let fields = err
            .validation_errors()
            .map(|errors| {
                errors
                    .iter()
                    .map(|(field, message)| FieldMessage {
                        field: field.to_string(),
                        message: message.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.error_code().to_string()),
            fields,
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}

fn render_error_to(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            for field in &error.fields {
                writeln!(out, "  {}: {}", field.field, field.message)?;
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymdesk_core::model::RecordKind;

    fn as_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn resolved_names_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("pretty"), OutputMode::Pretty);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_resolved(mode.as_str()), mode);
        }
    }

    #[test]
    fn text_table_is_tab_separated() {
        let mut table = Table::new(["id", "name"]);
        table.push(vec!["m-001".into(), "Ana\tSilva".into()]);
        let mut buf = Vec::new();
        table.write_text(&mut buf).expect("write");
        assert_eq!(as_string(buf), "id\tname\nm-001\tAna Silva\n");
    }

    #[test]
    fn empty_text_table_prints_nothing() {
        let table = Table::new(["id"]);
        let mut buf = Vec::new();
        table.write_text(&mut buf).expect("write");
        assert!(buf.is_empty());
    }

    #[test]
    fn pretty_table_aligns_columns() {
        let mut table = Table::new(["id", "n"]);
        table.push(vec!["a".into(), "1".into()]);
        table.push(vec!["long".into(), "22".into()]);
        let mut buf = Vec::new();
        table.write_pretty(&mut buf).expect("write");
        let text = as_string(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id    n");
        assert_eq!(lines[1], "--------");
        assert_eq!(lines[2], "a     1");
        assert_eq!(lines[3], "long  22");
    }

    #[test]
    fn flatten_json_uses_dotted_keys() {
        let value = serde_json::json!({
            "total": 3,
            "rate": 66.666,
            "by_status": { "active": 2, "expired": 1 },
            "none": null,
        });
        let flat = flatten_json(&value);
        assert!(flat.contains(&("total".to_string(), "3".to_string())));
        assert!(flat.contains(&("rate".to_string(), "66.67".to_string())));
        assert!(flat.contains(&("by_status.active".to_string(), "2".to_string())));
        assert!(flat.contains(&("none".to_string(), "-".to_string())));
    }

    #[test]
    fn json_mode_serializes_value() {
        let mut buf = Vec::new();
        render_mode_to(
            &mut buf,
            OutputMode::Json,
            &serde_json::json!({"total": 1}),
            |_, _| Ok(()),
            |_, _| Ok(()),
        )
        .expect("render");
        let parsed: Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(parsed["total"], 1);
    }

    #[test]
    fn gym_error_carries_code_and_fields() {
        let err = GymError::invalid("custom_start_date", "Start date is required for custom range.");
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert_eq!(cli.fields.len(), 1);
        assert_eq!(cli.fields[0].field, "custom_start_date");

        let mut buf = Vec::new();
        render_error_to(&mut buf, OutputMode::Text, &cli).expect("render");
        let text = as_string(buf);
        assert!(text.starts_with("error[E2001]: validation failed"));
        assert!(text.contains("custom_start_date: Start date is required"));
        assert!(text.contains("suggestion:"));
    }

    #[test]
    fn not_found_json_error_shape() {
        let err = GymError::not_found(RecordKind::Member, "m-999");
        let mut buf = Vec::new();
        render_error_to(&mut buf, OutputMode::Json, &CliError::from(&err)).expect("render");
        let parsed: Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(parsed["error"]["error_code"], "E2002");
        assert_eq!(parsed["error"]["message"], "member 'm-999' not found");
        assert!(parsed["error"].get("fields").is_none());
    }

    #[test]
    fn plain_error_has_no_code_prefix() {
        let mut buf = Vec::new();
        render_error_to(&mut buf, OutputMode::Pretty, &CliError::new("boom")).expect("render");
        assert_eq!(as_string(buf), "error: boom\n");
    }
}

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use gymdesk_core::aggregate::Summarize;
use gymdesk_core::export::{export_csv, export_json};
use gymdesk_core::query::{FilterState, Record, filter_and_sort};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

use super::{Collection, CollectionVisitor, Context, FilterArgs, columns_for};
use crate::output::{pretty_kv, render_mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    gd export members --status expired --columns name:Name,email,expiry_date
    gd export payments --period last_month --as json --output payments.json")]
pub struct ExportArgs {
    #[arg(value_enum)]
    pub collection: Collection,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// File format of the export.
    #[arg(id = "export_format", long = "as", value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Columns as `field` or `field:Label`, comma separated. Defaults to every field.
    #[arg(long, value_name = "FIELDS")]
    pub columns: Option<String>,

    /// Output path (defaults to stdout).
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Confirmation printed after writing an export file.
#[derive(Debug, Serialize)]
struct ExportReceipt {
    path: PathBuf,
    format: ExportFormat,
    rows: usize,
}

struct ExportVisitor<'a> {
    ctx: &'a Context,
    args: &'a ExportArgs,
    filter: FilterState,
}

impl CollectionVisitor for ExportVisitor<'_> {
    /// Rendered document and the number of records in it.
    type Output = Result<(String, usize)>;

    fn visit<T>(self, records: &[T]) -> Result<(String, usize)>
    where
        T: Record + Summarize + Serialize,
    {
        let sort = self.args.filter.to_sort(T::schema());
        let (rows, _) = filter_and_sort(records, &self.filter, sort.as_ref(), self.ctx.now)?;
        let columns = columns_for(T::schema(), self.args.columns.as_deref())?;
        let document = match self.args.format {
            ExportFormat::Csv => export_csv(&rows, &columns)?,
            ExportFormat::Json => {
                let mut text = serde_json::to_string_pretty(&export_json(&rows, &columns)?)?;
                text.push('\n');
                text
            }
        };
        Ok((document, rows.len()))
    }
}

/// Render the export document for `args`.
pub fn build_export(args: &ExportArgs, ctx: &Context) -> Result<(String, usize)> {
    let filter = args.filter.to_filter(ctx)?;
    let dataset = ctx.dataset()?;
    args.collection.visit(
        &dataset,
        ExportVisitor {
            ctx,
            args,
            filter,
        },
    )
}

/// Execute `gd export`.
pub fn run_export(args: &ExportArgs, ctx: &Context) -> Result<()> {
    let (document, rows) = build_export(args, ctx)?;

    let Some(path) = args.output.as_ref() else {
        let mut out = BufWriter::new(io::stdout().lock());
        out.write_all(document.as_bytes())?;
        out.flush()?;
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(document.as_bytes())
        .and_then(|()| out.flush())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows, "export written");

    let receipt = ExportReceipt {
        path: path.clone(),
        format: args.format,
        rows,
    };
    render_mode(
        ctx.output,
        &receipt,
        |r, w| writeln!(w, "{}\t{}", r.path.display(), r.rows),
        |r, w| {
            pretty_kv(w, "exported", format!("{} {}", r.rows, args.collection.name()))?;
            pretty_kv(w, "path", r.path.display().to_string())
        },
    )
}

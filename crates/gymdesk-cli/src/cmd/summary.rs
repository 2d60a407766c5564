//! `gd summary`: dashboard figures for the filtered set.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use gymdesk_core::aggregate::Summarize;
use gymdesk_core::query::{DateRange, FilterState, Record, filter_and_sort};
use serde::Serialize;
use serde_json::Value;

use super::{Collection, CollectionVisitor, Context, FilterArgs};
use crate::output::{flatten_json, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    gd summary attendance --period today
    gd summary payments --period this_year --json")]
pub struct SummaryArgs {
    #[arg(value_enum)]
    pub collection: Collection,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Report payload for `gd summary`.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub collection: String,
    /// Matching records.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    pub summary: Value,
}

struct SummaryVisitor<'a> {
    ctx: &'a Context,
    collection: Collection,
    filter: FilterState,
}

impl CollectionVisitor for SummaryVisitor<'_> {
    type Output = Result<SummaryReport>;

    fn visit<T>(self, records: &[T]) -> Result<SummaryReport>
    where
        T: Record + Summarize + Serialize,
    {
        let (rows, predicate) = filter_and_sort(records, &self.filter, None, self.ctx.now)?;
        Ok(SummaryReport {
            collection: self.collection.name(),
            total: rows.len(),
            range: predicate.range(),
            summary: serde_json::to_value(T::summarize(&rows))?,
        })
    }
}

/// Build the report without rendering it.
pub fn summarize(args: &SummaryArgs, ctx: &Context) -> Result<SummaryReport> {
    let filter = args.filter.to_filter(ctx)?;
    let dataset = ctx.dataset()?;
    args.collection.visit(
        &dataset,
        SummaryVisitor {
            ctx,
            collection: args.collection,
            filter,
        },
    )
}

/// Execute `gd summary`.
pub fn run_summary(args: &SummaryArgs, ctx: &Context) -> Result<()> {
    let report = summarize(args, ctx)?;
    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for (key, value) in flatten_json(&r.summary) {
                writeln!(w, "{key}\t{value}")?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("{} summary", r.collection))?;
            if let Some(range) = r.range {
                pretty_kv(w, "range", format!("{} .. {}", range.start, range.end))?;
            }
            for (key, value) in flatten_json(&r.summary) {
                pretty_kv(w, &key, value)?;
            }
            Ok(())
        },
    )
}

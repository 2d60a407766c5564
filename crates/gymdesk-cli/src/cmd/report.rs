//! `gd report`: bucketed counts or sums over a resolved period.

use std::io::Write;

use anyhow::Result;
use clap::{Args, ValueEnum};
use gymdesk_core::aggregate::{Bucket, Granularity, Summarize, bucket_records};
use gymdesk_core::error::GymError;
use gymdesk_core::query::{DateRange, FilterState, Record, filter_and_sort};
use serde::Serialize;
use tracing::debug;

use super::{Collection, CollectionVisitor, Context, FilterArgs};
use crate::output::{Table, pretty_section, render_mode};

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    gd report attendance --period this_week --by day
    gd report payments --period this_year --by month --sum amount --status paid")]
pub struct ReportArgs {
    #[arg(value_enum)]
    pub collection: Collection,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Bucket width.
    #[arg(long, value_enum, default_value_t = ReportBy::Day)]
    pub by: ReportBy,

    /// Numeric field to total per bucket.
    #[arg(long, value_name = "FIELD")]
    pub sum: Option<String>,
}

/// Bucket widths accepted by `--by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportBy {
    #[default]
    #[value(alias = "daily")]
    Day,
    #[value(alias = "weekly")]
    Week,
    #[value(alias = "monthly")]
    Month,
}

impl From<ReportBy> for Granularity {
    fn from(by: ReportBy) -> Self {
        match by {
            ReportBy::Day => Self::Day,
            ReportBy::Week => Self::Week,
            ReportBy::Month => Self::Month,
        }
    }
}

/// Report payload for `gd report`.
#[derive(Debug, Serialize)]
pub struct BucketReport {
    pub collection: String,
    pub granularity: Granularity,
    pub date_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_field: Option<String>,
    pub range: DateRange,
    /// Records counted across all buckets.
    pub total: usize,
    pub buckets: Vec<Bucket>,
}

struct ReportVisitor<'a> {
    ctx: &'a Context,
    args: &'a ReportArgs,
    filter: FilterState,
    granularity: Granularity,
}

impl CollectionVisitor for ReportVisitor<'_> {
    type Output = Result<BucketReport>;

    fn visit<T>(self, records: &[T]) -> Result<BucketReport>
    where
        T: Record + Summarize + Serialize,
    {
        let (rows, predicate) = filter_and_sort(records, &self.filter, None, self.ctx.now)?;
        let Some(range) = predicate.range() else {
            return Err(GymError::invalid(
                "period",
                "Reports need a bounded period; pass --period or --from/--to.",
            )
            .into());
        };
        let date_field = self
            .args
            .filter
            .date_field
            .clone()
            .unwrap_or_else(|| T::schema().date_field.to_string());

        let buckets = bucket_records(
            &rows,
            &date_field,
            self.args.sum.as_deref(),
            range,
            self.granularity,
            self.ctx.offset(),
        )?;
        debug!(buckets = buckets.len(), rows = rows.len(), "report bucketed");

        Ok(BucketReport {
            collection: self.args.collection.name(),
            granularity: self.granularity,
            date_field,
            sum_field: self.args.sum.clone(),
            range,
            total: buckets.iter().map(|bucket| bucket.count).sum(),
            buckets,
        })
    }
}

/// Build the report without rendering it.
pub fn build_report(args: &ReportArgs, ctx: &Context) -> Result<BucketReport> {
    let granularity = Granularity::from(args.by);
    let filter = args.filter.to_filter(ctx)?;
    let dataset = ctx.dataset()?;
    args.collection.visit(
        &dataset,
        ReportVisitor {
            ctx,
            args,
            filter,
            granularity,
        },
    )
}

fn bucket_table(report: &BucketReport, ctx: &Context) -> Table {
    let mut headers = vec!["start".to_string(), "count".to_string()];
    if let Some(sum) = &report.sum_field {
        headers.push(sum.clone());
    }
    let mut table = Table::new(headers);
    for bucket in &report.buckets {
        let local = bucket.start.with_timezone(&ctx.offset());
        let mut row = vec![local.format("%Y-%m-%d").to_string(), bucket.count.to_string()];
        if report.sum_field.is_some() {
            row.push(format!("{:.2}", bucket.total));
        }
        table.push(row);
    }
    table
}

/// Execute `gd report`.
pub fn run_report(args: &ReportArgs, ctx: &Context) -> Result<()> {
    let report = build_report(args, ctx)?;
    let table = bucket_table(&report, ctx);
    render_mode(
        ctx.output,
        &report,
        |_, w| table.write_text(w),
        |r, w| {
            pretty_section(
                w,
                &format!("{} by {} ({})", r.collection, r.granularity, r.date_field),
            )?;
            table.write_pretty(w)?;
            writeln!(w)?;
            writeln!(w, "{} records in {} buckets", r.total, r.buckets.len())
        },
    )
}

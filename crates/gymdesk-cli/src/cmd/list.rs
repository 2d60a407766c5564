//! `gd list`: one page of a filtered, sorted collection.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use gymdesk_core::aggregate::Summarize;
use gymdesk_core::query::{DateRange, PageState, Query, Record, run_query};
use serde::Serialize;

use super::{Collection, CollectionVisitor, Context, FilterArgs, columns_for, record_table};
use crate::output::{Table, render_mode};
use crate::validate::page_index;

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    gd list members --status active --sort join_date --desc
    gd list attendance --period today --page 2 --page-size 5
    gd list payments --where method=card --search silva --json")]
pub struct ListArgs {
    #[arg(value_enum)]
    pub collection: Collection,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Rows per page (defaults to `[query] page_size`).
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Columns to show, e.g. `id,name,status`. Defaults to every field.
    #[arg(long, value_name = "FIELDS")]
    pub columns: Option<String>,
}

/// JSON payload for `gd list`.
#[derive(Debug, Serialize)]
pub struct ListPage<'a, T> {
    pub collection: String,
    pub rows: Vec<&'a T>,
    /// Matching records before pagination.
    pub total: usize,
    /// One-based page number.
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    #[serde(skip)]
    table: Table,
}

struct ListVisitor<'a> {
    ctx: &'a Context,
    args: &'a ListArgs,
    query: Query,
}

impl CollectionVisitor for ListVisitor<'_> {
    type Output = Result<()>;

    fn visit<T>(self, records: &[T]) -> Result<()>
    where
        T: Record + Summarize + Serialize,
    {
        let mut query = self.query;
        if let Some(sort) = self.args.filter.to_sort(T::schema()) {
            query = query.sort(sort);
        }
        let result = run_query(records, &query, self.ctx.now)?;
        let columns = columns_for(T::schema(), self.args.columns.as_deref())?;
        let table = record_table(&result.rows, &columns);

        let payload = ListPage {
            collection: self.args.collection.name(),
            total: result.total,
            page: result.page + 1,
            page_size: result.page_size,
            page_count: result.page_count,
            range: result.range,
            rows: result.rows,
            table,
        };

        render_mode(
            self.ctx.output,
            &payload,
            |p, w| p.table.write_text(w),
            |p, w| {
                if p.rows.is_empty() {
                    writeln!(w, "No {} match.", p.collection)?;
                } else {
                    p.table.write_pretty(w)?;
                    writeln!(w)?;
                }
                writeln!(
                    w,
                    "page {}/{} ({} of {} {})",
                    p.page,
                    p.page_count.max(1),
                    p.rows.len(),
                    p.total,
                    p.collection
                )?;
                if let Some(range) = p.range {
                    writeln!(w, "range: {} .. {}", range.start, range.end)?;
                }
                Ok(())
            },
        )
    }
}

/// Execute `gd list`.
pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let page_size = args.page_size.unwrap_or(ctx.query.page_size);
    let mut query = Query::new().page(PageState::new(page_index(args.page)?, page_size));
    query = query.filter(args.filter.to_filter(ctx)?);

    let dataset = ctx.dataset()?;
    args.collection.visit(
        &dataset,
        ListVisitor {
            ctx,
            args,
            query,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ListArgs,
    }

    #[test]
    fn list_args_defaults() {
        let w = Wrapper::parse_from(["test", "members"]);
        assert_eq!(w.args.collection, Collection::Members);
        assert_eq!(w.args.page, 1);
        assert!(w.args.page_size.is_none());
        assert!(w.args.filter.status.is_none());
        assert!(w.args.filter.where_.is_empty());
        assert!(!w.args.filter.desc);
    }

    #[test]
    fn list_args_accept_repeated_where() {
        let w = Wrapper::parse_from([
            "test",
            "payments",
            "--where",
            "method=card",
            "--where",
            "status=paid",
            "--sort",
            "amount",
            "--desc",
            "--page-size",
            "3",
        ]);
        assert_eq!(w.args.collection, Collection::Payments);
        assert_eq!(w.args.filter.where_, ["method=card", "status=paid"]);
        assert_eq!(w.args.page_size, Some(3));
        assert!(w.args.filter.desc);
    }

    #[test]
    fn page_zero_is_rejected_before_loading() {
        let w = Wrapper::parse_from(["test", "members", "--page", "0"]);
        let err = run_list(&w.args, &super::super::test_support::ctx()).unwrap_err();
        assert!(err.to_string().contains("pages are numbered from 1"));
    }
}

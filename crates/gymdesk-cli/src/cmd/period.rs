//! `gd period`: show the range a period token resolves to.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use gymdesk_core::query::DateRange;
use gymdesk_core::query::period::resolve_token;
use serde::Serialize;

use super::Context;
use crate::output::{pretty_kv, render_mode};
use crate::validate::{Bound, parse_date_bound};

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    gd period this_week
    gd period last_quarter --now 2024-02-10T08:00:00Z
    gd period custom --from 2024-10-01 --to 2024-10-31")]
pub struct PeriodArgs {
    /// Period token (today, yesterday, this_week, ..., custom, all).
    pub token: String,

    /// Custom range start: YYYY-MM-DD or RFC 3339.
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Custom range end (exclusive). A bare date includes that whole day.
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
}

/// Resolved period, in UTC and in the configured offset.
#[derive(Debug, Serialize)]
pub struct ResolvedPeriod {
    pub period: String,
    /// `None` for the unconstrained `all` token.
    pub range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_end: Option<String>,
}

pub fn resolve(args: &PeriodArgs, ctx: &Context) -> Result<ResolvedPeriod> {
    let offset = ctx.offset();
    let start = args
        .from
        .as_deref()
        .map(|raw| parse_date_bound(raw, offset, Bound::Start))
        .transpose()?;
    let end = args
        .to
        .as_deref()
        .map(|raw| parse_date_bound(raw, offset, Bound::End))
        .transpose()?;

    let range = resolve_token(&args.token, start, end, ctx.now)?;
    let local = |at: chrono::DateTime<chrono::Utc>| at.with_timezone(&offset).to_rfc3339();
    Ok(ResolvedPeriod {
        period: args.token.trim().to_ascii_lowercase(),
        range,
        local_start: range.map(|r| local(r.start)),
        local_end: range.map(|r| local(r.end)),
    })
}

/// Execute `gd period`.
pub fn run_period(args: &PeriodArgs, ctx: &Context) -> Result<()> {
    let resolved = resolve(args, ctx)?;
    render_mode(
        ctx.output,
        &resolved,
        |r, w| match r.range {
            Some(range) => writeln!(w, "{}\t{}", range.start.to_rfc3339(), range.end.to_rfc3339()),
            None => writeln!(w, "-\t-"),
        },
        |r, w| {
            pretty_kv(w, "period", &r.period)?;
            match (&r.local_start, &r.local_end) {
                (Some(start), Some(end)) => {
                    pretty_kv(w, "start", start)?;
                    pretty_kv(w, "end", format!("{end} (exclusive)"))
                }
                _ => pretty_kv(w, "range", "unconstrained"),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::test_support::ctx;
    use chrono::{TimeZone, Utc};

    fn args(token: &str, from: Option<&str>, to: Option<&str>) -> PeriodArgs {
        PeriodArgs {
            token: token.into(),
            from: from.map(Into::into),
            to: to.map(Into::into),
        }
    }

    #[test]
    fn this_week_starts_monday() {
        let resolved = resolve(&args("this_week", None, None), &ctx()).expect("period");
        let range = resolved.range.expect("range");
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 10, 21, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 10, 28, 0, 0, 0).unwrap());
        assert_eq!(resolved.local_start.as_deref(), Some("2024-10-21T00:00:00+00:00"));
    }

    #[test]
    fn all_is_unconstrained() {
        let resolved = resolve(&args("all", None, None), &ctx()).expect("period");
        assert!(resolved.range.is_none());
        assert!(resolved.local_start.is_none());
    }

    #[test]
    fn custom_needs_both_bounds() {
        assert!(resolve(&args("custom", Some("2024-10-01"), None), &ctx()).is_err());
        let resolved =
            resolve(&args("custom", Some("2024-10-01"), Some("2024-10-31")), &ctx()).expect("period");
        let range = resolved.range.expect("range");
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn unknown_token_fails() {
        let err = resolve(&args("fortnight", None, None), &ctx()).unwrap_err();
        assert!(err.to_string().contains("fortnight"));
    }
}

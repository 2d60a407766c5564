pub mod completions;
pub mod export;
pub mod list;
pub mod period;
pub mod report;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Args, ValueEnum};
use gymdesk_core::aggregate::Summarize;
use gymdesk_core::config::{EffectiveConfig, QueryConfig};
use gymdesk_core::dataset::Dataset;
use gymdesk_core::export::{Column, default_columns};
use gymdesk_core::query::period::is_unconstrained;
use gymdesk_core::query::{FilterState, PeriodFilter, Record, Schema, SortState};
use serde::Serialize;
use tracing::debug;

use crate::output::{OutputMode, Table};
use crate::validate::{Bound, parse_columns, parse_date_bound, parse_where};

/// Everything a command needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub output: OutputMode,
    /// Reference instant, expressed in the configured offset.
    pub now: DateTime<FixedOffset>,
    pub query: QueryConfig,
    /// Explicit dataset file; `None` means the embedded seed.
    pub data_path: Option<PathBuf>,
}

impl Context {
    /// Combine resolved config with the global flags.
    ///
    /// `--data` wins over `[data] dataset`, which is relative to
    /// `project_root`.
    pub fn new(
        config: EffectiveConfig,
        project_root: &Path,
        data_flag: Option<PathBuf>,
        now_flag: Option<DateTime<FixedOffset>>,
    ) -> Result<Self> {
        let offset = config.project.query.offset()?;
        let now = now_flag.map_or_else(Utc::now, |now| now.to_utc());
        let data_path = data_flag.or_else(|| {
            config
                .project
                .data
                .dataset
                .as_ref()
                .map(|path| project_root.join(path))
        });
        Ok(Self {
            output: OutputMode::from_resolved(&config.resolved_output),
            now: now.with_timezone(&offset),
            query: config.project.query,
            data_path,
        })
    }

    pub const fn offset(&self) -> FixedOffset {
        *self.now.offset()
    }

    pub fn dataset(&self) -> Result<Dataset> {
        match &self.data_path {
            Some(path) => Dataset::from_path(path)
                .with_context(|| format!("while loading --data {}", path.display())),
            None => Dataset::seed(),
        }
    }
}

/// Record collections addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Members,
    Attendance,
    Equipment,
    Packages,
    DietPlans,
    DietAssignments,
    Workouts,
    Payments,
}

/// Generic work over one collection's records.
///
/// Closures cannot be generic over the record type, so commands implement
/// this instead and [`Collection::visit`] picks the concrete type.
pub trait CollectionVisitor {
    type Output;

    fn visit<T>(self, records: &[T]) -> Self::Output
    where
        T: Record + Summarize + Serialize;
}

impl Collection {
    pub fn visit<V: CollectionVisitor>(self, dataset: &Dataset, visitor: V) -> V::Output {
        match self {
            Self::Members => visitor.visit(dataset.members.records()),
            Self::Attendance => visitor.visit(dataset.attendance.records()),
            Self::Equipment => visitor.visit(dataset.equipment.records()),
            Self::Packages => visitor.visit(dataset.packages.records()),
            Self::DietPlans => visitor.visit(dataset.diet_plans.records()),
            Self::DietAssignments => visitor.visit(dataset.diet_assignments.records()),
            Self::Workouts => visitor.visit(dataset.workout_plans.records()),
            Self::Payments => visitor.visit(dataset.payments.records()),
        }
    }

    pub fn name(self) -> String {
        self.to_possible_value()
            .map_or_else(String::new, |value| value.get_name().to_string())
    }
}

/// Columns named by a `--columns` flag, or every schema field.
pub fn columns_for(schema: &Schema, raw: Option<&str>) -> Result<Vec<Column>> {
    let Some(raw) = raw else {
        return Ok(default_columns(schema));
    };
    let mut columns = Vec::new();
    for (field, label) in parse_columns(raw)? {
        schema.require(&field)?;
        columns.push(match label {
            Some(label) => Column::new(field, label),
            None => Column::field(field),
        });
    }
    Ok(columns)
}

/// One table row per record, cells rendered as plain text.
pub fn record_table<T: Record>(rows: &[&T], columns: &[Column]) -> Table {
    let mut table = Table::new(columns.iter().map(|column| column.label.as_str()));
    for row in rows {
        table.push(
            columns
                .iter()
                .map(|column| row.value(&column.field).to_text().into_owned())
                .collect(),
        );
    }
    table
}

/// Filter and sort flags shared by `list`, `summary`, `report` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Exact status match; `all` disables it.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Exact match on any field, repeatable.
    #[arg(long = "where", value_name = "FIELD=VALUE")]
    pub where_: Vec<String>,

    /// Case-insensitive substring search over the collection's search fields.
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Period token: today, this_week, last_month, custom, all, ...
    #[arg(short, long)]
    pub period: Option<String>,

    /// Date field the period applies to (defaults to the collection's date field).
    #[arg(long, value_name = "FIELD")]
    pub date_field: Option<String>,

    /// Custom range start: YYYY-MM-DD or RFC 3339. Implies `--period custom`.
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Custom range end (exclusive). A bare date includes that whole day.
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// Sort key (field name or derived key).
    #[arg(long, value_name = "KEY")]
    pub sort: Option<String>,

    /// Sort descending.
    #[arg(long)]
    pub desc: bool,
}

impl FilterArgs {
    /// Build the engine filter.
    ///
    /// The period falls back to the configured default; giving `--from` or
    /// `--to` without `--period` selects `custom`.
    pub fn to_filter(&self, ctx: &Context) -> Result<FilterState> {
        let mut filter = FilterState::new();
        if let Some(status) = &self.status {
            filter = filter.with_equals("status", status.as_str());
        }
        for raw in &self.where_ {
            let (field, value) = parse_where(raw)?;
            filter = filter.with_equals(field, value);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.as_str());
        }

        let explicit = self.from.is_some() || self.to.is_some();
        let token = self.period.clone().unwrap_or_else(|| {
            if explicit {
                "custom".to_string()
            } else {
                ctx.query.default_period.clone()
            }
        });
        if !is_unconstrained(&token) {
            let offset = ctx.offset();
            let start = self
                .from
                .as_deref()
                .map(|raw| parse_date_bound(raw, offset, Bound::Start))
                .transpose()?;
            let end = self
                .to
                .as_deref()
                .map(|raw| parse_date_bound(raw, offset, Bound::End))
                .transpose()?;
            let mut period = PeriodFilter::new(token);
            period.start = start;
            period.end = end;
            if let Some(field) = &self.date_field {
                period = period.on(field.as_str());
            }
            filter = filter.with_period(period);
        }

        debug!(?filter, "filter built from flags");
        Ok(filter)
    }

    /// `None` leaves the collection's default sort in place. `--desc`
    /// alone reverses the schema's default key.
    pub fn to_sort(&self, schema: &Schema) -> Option<SortState> {
        match (&self.sort, self.desc) {
            (Some(key), false) => Some(SortState::asc(key.as_str())),
            (Some(key), true) => Some(SortState::desc(key.as_str())),
            (None, true) => Some(SortState::desc(schema.default_sort)),
            (None, false) => None,
        }
    }
}

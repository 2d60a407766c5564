use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::aggregate::{Summarize, count_by, count_percentage, mean};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    pub enum AttendanceStatus as "attendance status" {
        CheckedIn => "checked_in",
        Completed => "completed",
    }
}

/// One gym visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub member_id: String,
    pub member_name: String,
    pub check_in_time: DateTime<Utc>,
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    /// Length of the visit in whole minutes; `None` while still checked in.
    #[must_use]
    pub fn duration(&self) -> Option<i64> {
        calculate_duration(self.check_in_time, self.check_out_time)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == AttendanceStatus::CheckedIn
    }
}

/// Whole minutes between check-in and check-out.
///
/// Returns `None` without a check-out. A check-out before the check-in
/// clamps to zero.
#[must_use]
pub fn calculate_duration(
    check_in: DateTime<Utc>,
    check_out: Option<DateTime<Utc>>,
) -> Option<i64> {
    check_out.map(|out| (out - check_in).num_minutes().max(0))
}

#[allow(clippy::cast_precision_loss)]
const fn as_f64(minutes: i64) -> f64 {
    minutes as f64
}

static ATTENDANCE_SCHEMA: Schema = Schema {
    kind: RecordKind::Attendance,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("member_id", FieldKind::Text),
        FieldSpec::new("member_name", FieldKind::Text),
        FieldSpec::new("check_in_time", FieldKind::Date),
        FieldSpec::new("check_out_time", FieldKind::Date),
        FieldSpec::new("duration", FieldKind::Number),
        FieldSpec::new("status", FieldKind::Enum),
    ],
    search: &["member_name", "member_id"],
    date_field: "check_in_time",
    default_sort: "check_in_time",
};

impl Record for AttendanceRecord {
    fn schema() -> &'static Schema {
        &ATTENDANCE_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "member_id" => FieldValue::text(&self.member_id),
            "member_name" => FieldValue::text(&self.member_name),
            "check_in_time" => FieldValue::Date(self.check_in_time),
            "check_out_time" => FieldValue::opt_date(self.check_out_time),
            "duration" => self
                .duration()
                .map_or(FieldValue::Missing, |minutes| FieldValue::Number(as_f64(minutes))),
            "status" => FieldValue::text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for AttendanceRecord {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("member_id", &self.member_id, "Member");
        errors.require_text("member_name", &self.member_name, "Member name");
        errors.require_ordered(
            "check_out_time",
            self.check_in_time,
            self.check_out_time,
            "Check-out time must be on or after check-in time.",
        );
        if self.status == AttendanceStatus::Completed && self.check_out_time.is_none() {
            errors.add(
                "check_out_time",
                "Check-out time is required for a completed visit.",
            );
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub checked_in: usize,
    pub completed: usize,
    pub unique_members: usize,
    /// Mean stay over completed visits.
    pub avg_duration_minutes: f64,
    pub completion_rate: f64,
}

impl Summarize for AttendanceRecord {
    type Summary = AttendanceSummary;

    fn summarize(records: &[&Self]) -> AttendanceSummary {
        let total = records.len();
        let checked_in = records.iter().filter(|r| r.is_open()).count();
        let completed = total - checked_in;
        let unique_members = records
            .iter()
            .map(|r| r.member_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let avg_duration_minutes = mean(
            records
                .iter()
                .filter(|r| r.status == AttendanceStatus::Completed)
                .filter_map(|r| r.duration())
                .map(as_f64),
        );

        AttendanceSummary {
            total,
            by_status: count_by(
                records.iter().copied(),
                AttendanceStatus::ALL.iter().copied(),
                |r| r.status,
            ),
            checked_in,
            completed,
            unique_members,
            avg_duration_minutes,
            completion_rate: count_percentage(completed, total),
        }
    }
}

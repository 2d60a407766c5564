use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use super::diet::PlanStatus;
use crate::aggregate::{Summarize, count_by, mean};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    pub enum WorkoutLevel as "workout level" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

/// A trainer-authored workout programme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trainer: String,
    pub level: WorkoutLevel,
    pub duration_weeks: u32,
    pub sessions_per_week: u32,
    #[serde(default)]
    pub assigned_members: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

static WORKOUT_SCHEMA: Schema = Schema {
    kind: RecordKind::WorkoutPlan,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("description", FieldKind::Text),
        FieldSpec::new("trainer", FieldKind::Text),
        FieldSpec::new("level", FieldKind::Enum),
        FieldSpec::new("duration_weeks", FieldKind::Number),
        FieldSpec::new("sessions_per_week", FieldKind::Number),
        FieldSpec::new("assigned_members", FieldKind::Number),
        FieldSpec::new("status", FieldKind::Enum),
        FieldSpec::new("created_at", FieldKind::Date),
    ],
    search: &["name", "description", "trainer"],
    date_field: "created_at",
    default_sort: "name",
};

impl Record for WorkoutPlan {
    fn schema() -> &'static Schema {
        &WORKOUT_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "name" => FieldValue::text(&self.name),
            "description" => FieldValue::text(&self.description),
            "trainer" => FieldValue::text(&self.trainer),
            "level" => FieldValue::text(self.level.as_str()),
            "duration_weeks" => FieldValue::Number(f64::from(self.duration_weeks)),
            "sessions_per_week" => FieldValue::Number(f64::from(self.sessions_per_week)),
            "assigned_members" => FieldValue::Number(f64::from(self.assigned_members)),
            "status" => FieldValue::text(self.status.as_str()),
            "created_at" => FieldValue::Date(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for WorkoutPlan {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, "Name");
        errors.require_text("trainer", &self.trainer, "Trainer");
        errors.require_positive_count("duration_weeks", self.duration_weeks, "Duration");
        errors.require_positive_count(
            "sessions_per_week",
            self.sessions_per_week,
            "Sessions per week",
        );
        if self.sessions_per_week > 7 {
            errors.add("sessions_per_week", "Sessions per week cannot exceed 7.");
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutPlanSummary {
    pub total: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub avg_duration_weeks: f64,
    pub total_assigned: u64,
}

impl Summarize for WorkoutPlan {
    type Summary = WorkoutPlanSummary;

    fn summarize(records: &[&Self]) -> WorkoutPlanSummary {
        WorkoutPlanSummary {
            total: records.len(),
            by_level: count_by(
                records.iter().copied(),
                WorkoutLevel::ALL.iter().copied(),
                |w| w.level,
            ),
            by_status: count_by(
                records.iter().copied(),
                PlanStatus::ALL.iter().copied(),
                |w| w.status,
            ),
            avg_duration_weeks: mean(records.iter().map(|w| f64::from(w.duration_weeks))),
            total_assigned: records.iter().map(|w| u64::from(w.assigned_members)).sum(),
        }
    }
}

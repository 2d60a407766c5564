//! Diet plans and their assignment to members.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::aggregate::{Summarize, count_by, count_percentage, mean};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    pub enum DietGoal as "diet goal" {
        WeightLoss => "weight_loss",
        MuscleGain => "muscle_gain",
        Maintenance => "maintenance",
        Endurance => "endurance",
    }
}

labeled_enum! {
    /// Publication state shared by diet and workout plans.
    pub enum PlanStatus as "plan status" {
        Active => "active",
        Draft => "draft",
        Archived => "archived",
    }
}

labeled_enum! {
    pub enum AssignmentStatus as "assignment status" {
        Active => "active",
        Completed => "completed",
        Paused => "paused",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub goal: DietGoal,
    pub daily_calories: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

static DIET_PLAN_SCHEMA: Schema = Schema {
    kind: RecordKind::DietPlan,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("description", FieldKind::Text),
        FieldSpec::new("goal", FieldKind::Enum),
        FieldSpec::new("daily_calories", FieldKind::Number),
        FieldSpec::new("status", FieldKind::Enum),
        FieldSpec::new("created_at", FieldKind::Date),
    ],
    search: &["name", "description"],
    date_field: "created_at",
    default_sort: "name",
};

impl Record for DietPlan {
    fn schema() -> &'static Schema {
        &DIET_PLAN_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "name" => FieldValue::text(&self.name),
            "description" => FieldValue::text(&self.description),
            "goal" => FieldValue::text(self.goal.as_str()),
            "daily_calories" => FieldValue::Number(f64::from(self.daily_calories)),
            "status" => FieldValue::text(self.status.as_str()),
            "created_at" => FieldValue::Date(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for DietPlan {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, "Name");
        errors.require_positive_count("daily_calories", self.daily_calories, "Daily calories");
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DietPlanSummary {
    pub total: usize,
    pub by_goal: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub avg_daily_calories: f64,
}

impl Summarize for DietPlan {
    type Summary = DietPlanSummary;

    fn summarize(records: &[&Self]) -> DietPlanSummary {
        DietPlanSummary {
            total: records.len(),
            by_goal: count_by(records.iter().copied(), DietGoal::ALL.iter().copied(), |p| {
                p.goal
            }),
            by_status: count_by(
                records.iter().copied(),
                PlanStatus::ALL.iter().copied(),
                |p| p.status,
            ),
            avg_daily_calories: mean(records.iter().map(|p| f64::from(p.daily_calories))),
        }
    }
}

/// A diet plan assigned to a member for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietAssignment {
    pub id: String,
    pub member_id: String,
    pub member_name: String,
    pub diet_plan_id: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Self-reported adherence, 0 to 100.
    #[serde(default)]
    pub adherence: f64,
    pub status: AssignmentStatus,
}

static DIET_ASSIGNMENT_SCHEMA: Schema = Schema {
    kind: RecordKind::DietAssignment,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("member_id", FieldKind::Text),
        FieldSpec::new("member_name", FieldKind::Text),
        FieldSpec::new("diet_plan_id", FieldKind::Text),
        FieldSpec::new("start_date", FieldKind::Date),
        FieldSpec::new("end_date", FieldKind::Date),
        FieldSpec::new("adherence", FieldKind::Number),
        FieldSpec::new("status", FieldKind::Enum),
    ],
    search: &["member_name", "diet_plan_id"],
    date_field: "start_date",
    default_sort: "start_date",
};

impl Record for DietAssignment {
    fn schema() -> &'static Schema {
        &DIET_ASSIGNMENT_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "member_id" => FieldValue::text(&self.member_id),
            "member_name" => FieldValue::text(&self.member_name),
            "diet_plan_id" => FieldValue::text(&self.diet_plan_id),
            "start_date" => FieldValue::Date(self.start_date),
            "end_date" => FieldValue::opt_date(self.end_date),
            "adherence" => FieldValue::Number(self.adherence),
            "status" => FieldValue::text(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for DietAssignment {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("member_id", &self.member_id, "Member");
        errors.require_text("diet_plan_id", &self.diet_plan_id, "Diet plan");
        errors.require_percent("adherence", self.adherence, "Adherence");
        errors.require_ordered(
            "end_date",
            self.start_date,
            self.end_date,
            "End date must be on or after start date.",
        );
        errors
    }
}

/// Diet-plan analytics over assignments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DietAssignmentSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub active: usize,
    pub completed: usize,
    pub avg_adherence: f64,
    pub completion_rate: f64,
}

impl Summarize for DietAssignment {
    type Summary = DietAssignmentSummary;

    fn summarize(records: &[&Self]) -> DietAssignmentSummary {
        let total = records.len();
        let with_status =
            |status: AssignmentStatus| records.iter().filter(|a| a.status == status).count();
        let completed = with_status(AssignmentStatus::Completed);
        DietAssignmentSummary {
            total,
            by_status: count_by(
                records.iter().copied(),
                AssignmentStatus::ALL.iter().copied(),
                |a| a.status,
            ),
            active: with_status(AssignmentStatus::Active),
            completed,
            avg_adherence: mean(records.iter().map(|a| a.adherence)),
            completion_rate: count_percentage(completed, total),
        }
    }
}

//! All feature collections together, plus the actions that span them.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GymError, LoadError};
use crate::model::{
    AssignmentStatus, AttendanceRecord, AttendanceStatus, DietAssignment, DietPlan, Equipment,
    Member, MembershipPackage, Payment, PaymentMethod, PaymentStatus, PlanStatus, RecordKind,
    WorkoutPlan,
};
use crate::query::field::Record;
use crate::store::{Action, Collection};

/// Seed data compiled into the library.
pub const SEED_JSON: &str = include_str!("../data/seed.json");

/// A change to any one collection of a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Member(Action<Member>),
    Attendance(Action<AttendanceRecord>),
    Equipment(Action<Equipment>),
    Package(Action<MembershipPackage>),
    DietPlan(Action<DietPlan>),
    DietAssignment(Action<DietAssignment>),
    WorkoutPlan(Action<WorkoutPlan>),
    Payment(Action<Payment>),
}

impl Change {
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Member(_) => RecordKind::Member,
            Self::Attendance(_) => RecordKind::Attendance,
            Self::Equipment(_) => RecordKind::Equipment,
            Self::Package(_) => RecordKind::Package,
            Self::DietPlan(_) => RecordKind::DietPlan,
            Self::DietAssignment(_) => RecordKind::DietAssignment,
            Self::WorkoutPlan(_) => RecordKind::WorkoutPlan,
            Self::Payment(_) => RecordKind::Payment,
        }
    }
}

/// An immutable snapshot of every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub members: Collection<Member>,
    #[serde(default)]
    pub attendance: Collection<AttendanceRecord>,
    #[serde(default)]
    pub equipment: Collection<Equipment>,
    #[serde(default)]
    pub packages: Collection<MembershipPackage>,
    #[serde(default)]
    pub diet_plans: Collection<DietPlan>,
    #[serde(default)]
    pub diet_assignments: Collection<DietAssignment>,
    #[serde(default)]
    pub workout_plans: Collection<WorkoutPlan>,
    #[serde(default)]
    pub payments: Collection<Payment>,
}

impl Dataset {
    /// The embedded seed dataset.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded JSON is malformed.
    pub fn seed() -> Result<Self> {
        Self::from_json(SEED_JSON).context("Failed to parse embedded seed dataset")
    }

    /// # Errors
    ///
    /// Returns an error if `json` does not have the dataset shape or a
    /// collection contains duplicate ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(json)?;
        info!(
            members = dataset.members.len(),
            attendance = dataset.attendance.len(),
            equipment = dataset.equipment.len(),
            packages = dataset.packages.len(),
            diet_plans = dataset.diet_plans.len(),
            diet_assignments = dataset.diet_assignments.len(),
            workout_plans = dataset.workout_plans.len(),
            payments = dataset.payments.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| LoadError::dataset(format!("Failed to read {}", path.display())))?;
        Self::from_json(&content)
            .with_context(|| LoadError::dataset(format!("Failed to parse {}", path.display())))
    }

    /// Apply a single-collection change, returning the new snapshot.
    ///
    /// # Errors
    ///
    /// See [`Collection::apply`].
    pub fn apply(&self, change: Change) -> Result<Self, GymError> {
        let mut next = self.clone();
        match change {
            Change::Member(action) => next.members = self.members.apply(action)?,
            Change::Attendance(action) => next.attendance = self.attendance.apply(action)?,
            Change::Equipment(action) => next.equipment = self.equipment.apply(action)?,
            Change::Package(action) => next.packages = self.packages.apply(action)?,
            Change::DietPlan(action) => next.diet_plans = self.diet_plans.apply(action)?,
            Change::DietAssignment(action) => {
                next.diet_assignments = self.diet_assignments.apply(action)?;
            }
            Change::WorkoutPlan(action) => next.workout_plans = self.workout_plans.apply(action)?,
            Change::Payment(action) => next.payments = self.payments.apply(action)?,
        }
        Ok(next)
    }

    /// Open an attendance row for an active member.
    ///
    /// # Errors
    ///
    /// - [`GymError::NotFound`] for an unknown member
    /// - [`GymError::BusinessRule`] if the member is not active or already
    ///   has an open visit
    pub fn check_in(&self, member_id: &str, at: DateTime<Utc>) -> Result<Self, GymError> {
        let member = self.members.require(member_id)?;
        if !member.is_active() {
            return Err(GymError::rule(
                "member_inactive",
                format!("member is {} and cannot check in", member.status),
            ));
        }
        if self
            .attendance
            .iter()
            .any(|row| row.member_id == member_id && row.is_open())
        {
            return Err(GymError::rule(
                "already_checked_in",
                "member already checked in",
            ));
        }

        let record = AttendanceRecord {
            id: next_id(&self.attendance, "att"),
            member_id: member.id.clone(),
            member_name: member.full_name(),
            check_in_time: at,
            check_out_time: None,
            status: AttendanceStatus::CheckedIn,
        };
        debug!(member_id, attendance_id = %record.id, "check-in");
        self.apply(Change::Attendance(Action::Create(record)))
    }

    /// Close an open attendance row.
    ///
    /// # Errors
    ///
    /// - [`GymError::NotFound`] for an unknown row
    /// - [`GymError::BusinessRule`] if the row is already closed
    /// - [`GymError::Validation`] if `at` precedes the check-in
    pub fn check_out(&self, attendance_id: &str, at: DateTime<Utc>) -> Result<Self, GymError> {
        let row = self.attendance.require(attendance_id)?;
        if !row.is_open() {
            return Err(GymError::rule(
                "already_checked_out",
                "member already checked out",
            ));
        }
        let closed = AttendanceRecord {
            check_out_time: Some(at),
            status: AttendanceStatus::Completed,
            ..row.clone()
        };
        debug!(attendance_id, duration = ?closed.duration(), "check-out");
        self.apply(Change::Attendance(Action::Update(closed)))
    }

    /// Assign an active diet plan to a member.
    ///
    /// # Errors
    ///
    /// - [`GymError::NotFound`] for an unknown member or plan
    /// - [`GymError::BusinessRule`] if the plan is not active
    pub fn assign_diet(
        &self,
        member_id: &str,
        diet_plan_id: &str,
        start: DateTime<Utc>,
    ) -> Result<Self, GymError> {
        let member = self.members.require(member_id)?;
        let plan = self.diet_plans.require(diet_plan_id)?;
        if plan.status != PlanStatus::Active {
            return Err(GymError::rule(
                "plan_inactive",
                format!("diet plan '{}' is {}", plan.name, plan.status),
            ));
        }
        let assignment = DietAssignment {
            id: next_id(&self.diet_assignments, "da"),
            member_id: member.id.clone(),
            member_name: member.full_name(),
            diet_plan_id: plan.id.clone(),
            start_date: start,
            end_date: None,
            adherence: 0.0,
            status: AssignmentStatus::Active,
        };
        self.apply(Change::DietAssignment(Action::Create(assignment)))
    }

    /// Record a paid membership payment.
    ///
    /// # Errors
    ///
    /// - [`GymError::NotFound`] for an unknown member or package
    /// - [`GymError::Validation`] for a non-positive amount
    pub fn record_payment(
        &self,
        member_id: &str,
        package_id: &str,
        amount: f64,
        method: PaymentMethod,
        at: DateTime<Utc>,
    ) -> Result<Self, GymError> {
        let member = self.members.require(member_id)?;
        let package = self.packages.require(package_id)?;
        let payment = Payment {
            id: next_id(&self.payments, "pay"),
            member_id: member.id.clone(),
            member_name: member.full_name(),
            package_id: package.id.clone(),
            amount,
            method,
            status: PaymentStatus::Paid,
            paid_at: at,
        };
        self.apply(Change::Payment(Action::Create(payment)))
    }
}

/// First `{prefix}-{n}` id not used in `collection`, counting from its length.
fn next_id<T: Record>(collection: &Collection<T>, prefix: &str) -> String {
    (collection.len() + 1..)
        .map(|n| format!("{prefix}-{n}"))
        .find(|id| !collection.contains(id))
        .unwrap_or_else(|| format!("{prefix}-{}", collection.len()))
}

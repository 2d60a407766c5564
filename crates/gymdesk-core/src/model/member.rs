use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::aggregate::{Summarize, count_by, count_percentage};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    /// Membership lifecycle state.
    pub enum MemberStatus as "member status" {
        Active => "active",
        Inactive => "inactive",
        Expired => "expired",
        Suspended => "suspended",
    }
}

/// A gym member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub package_id: Option<String>,
    pub status: MemberStatus,
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl Member {
    /// Display name: first and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

static MEMBER_SCHEMA: Schema = Schema {
    kind: RecordKind::Member,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("first_name", FieldKind::Text),
        FieldSpec::new("last_name", FieldKind::Text),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("email", FieldKind::Text),
        FieldSpec::new("phone", FieldKind::Text),
        FieldSpec::new("package_id", FieldKind::Text),
        FieldSpec::new("status", FieldKind::Enum),
        FieldSpec::new("join_date", FieldKind::Date),
        FieldSpec::new("expiry_date", FieldKind::Date),
    ],
    search: &["name", "email", "phone"],
    date_field: "join_date",
    default_sort: "name",
};

impl Record for Member {
    fn schema() -> &'static Schema {
        &MEMBER_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "first_name" => FieldValue::text(&self.first_name),
            "last_name" => FieldValue::text(&self.last_name),
            "name" => FieldValue::Text(self.full_name().into()),
            "email" => FieldValue::text(&self.email),
            "phone" => FieldValue::text(&self.phone),
            "package_id" => FieldValue::opt_text(self.package_id.as_deref()),
            "status" => FieldValue::text(self.status.as_str()),
            "join_date" => FieldValue::Date(self.join_date),
            "expiry_date" => FieldValue::opt_date(self.expiry_date),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for Member {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("first_name", &self.first_name, "First name");
        errors.require_text("last_name", &self.last_name, "Last name");
        errors.require_email("email", &self.email);
        errors.require_ordered(
            "expiry_date",
            self.join_date,
            self.expiry_date,
            "Expiry date must be on or after join date.",
        );
        errors
    }
}

/// Member counts for the members dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Keyed by package id; members without a package count under `"none"`.
    pub by_package: BTreeMap<String, usize>,
    pub active: usize,
    pub active_rate: f64,
}

impl Summarize for Member {
    type Summary = MemberSummary;

    fn summarize(records: &[&Self]) -> MemberSummary {
        let total = records.len();
        let active = records.iter().filter(|m| m.is_active()).count();
        MemberSummary {
            total,
            by_status: count_by(records.iter().copied(), MemberStatus::ALL.iter().copied(), |m| {
                m.status
            }),
            by_package: count_by(records.iter().copied(), std::iter::empty::<String>(), |m| {
                m.package_id.clone().unwrap_or_else(|| "none".to_string())
            }),
            active,
            active_rate: count_percentage(active, total),
        }
    }
}

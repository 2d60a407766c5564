use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::aggregate::{Summarize, count_by, mean};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    pub enum PackageStatus as "package status" {
        Active => "active",
        Inactive => "inactive",
    }
}

/// A membership package members can buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipPackage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_months: u32,
    pub price: f64,
    #[serde(default)]
    pub max_freezes: u32,
    pub status: PackageStatus,
    pub created_at: DateTime<Utc>,
}

static PACKAGE_SCHEMA: Schema = Schema {
    kind: RecordKind::Package,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("description", FieldKind::Text),
        FieldSpec::new("duration_months", FieldKind::Number),
        FieldSpec::new("price", FieldKind::Number),
        FieldSpec::new("max_freezes", FieldKind::Number),
        FieldSpec::new("status", FieldKind::Enum),
        FieldSpec::new("created_at", FieldKind::Date),
    ],
    search: &["name", "description"],
    date_field: "created_at",
    default_sort: "price",
};

impl Record for MembershipPackage {
    fn schema() -> &'static Schema {
        &PACKAGE_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "name" => FieldValue::text(&self.name),
            "description" => FieldValue::text(&self.description),
            "duration_months" => FieldValue::Number(f64::from(self.duration_months)),
            "price" => FieldValue::Number(self.price),
            "max_freezes" => FieldValue::Number(f64::from(self.max_freezes)),
            "status" => FieldValue::text(self.status.as_str()),
            "created_at" => FieldValue::Date(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for MembershipPackage {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, "Name");
        errors.require_positive("price", self.price, "Price");
        errors.require_positive_count("duration_months", self.duration_months, "Duration");
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub active: usize,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

impl Summarize for MembershipPackage {
    type Summary = PackageSummary;

    fn summarize(records: &[&Self]) -> PackageSummary {
        let prices = records.iter().map(|p| p.price);
        let min_price = prices.clone().reduce(f64::min).unwrap_or(0.0);
        let max_price = prices.clone().reduce(f64::max).unwrap_or(0.0);
        PackageSummary {
            total: records.len(),
            by_status: count_by(
                records.iter().copied(),
                PackageStatus::ALL.iter().copied(),
                |p| p.status,
            ),
            active: records
                .iter()
                .filter(|p| p.status == PackageStatus::Active)
                .count(),
            avg_price: mean(prices),
            min_price,
            max_price,
        }
    }
}

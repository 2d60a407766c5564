use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::aggregate::{Summarize, count_by, count_percentage, total};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    pub enum EquipmentStatus as "equipment status" {
        Operational => "operational",
        Maintenance => "maintenance",
        OutOfOrder => "out_of_order",
        Retired => "retired",
    }
}

/// A piece of gym equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub serial_number: String,
    pub status: EquipmentStatus,
    pub purchase_date: DateTime<Utc>,
    #[serde(default)]
    pub last_maintenance: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_maintenance: Option<DateTime<Utc>>,
    pub purchase_price: f64,
}

impl Equipment {
    /// Whether scheduled maintenance is due at `now`.
    #[must_use]
    pub fn maintenance_due(&self, now: DateTime<Utc>) -> bool {
        self.status != EquipmentStatus::Retired
            && self.next_maintenance.is_some_and(|due| due <= now)
    }
}

static EQUIPMENT_SCHEMA: Schema = Schema {
    kind: RecordKind::Equipment,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("category", FieldKind::Text),
        FieldSpec::new("location", FieldKind::Text),
        FieldSpec::new("serial_number", FieldKind::Text),
        FieldSpec::new("status", FieldKind::Enum),
        FieldSpec::new("purchase_date", FieldKind::Date),
        FieldSpec::new("last_maintenance", FieldKind::Date),
        FieldSpec::new("next_maintenance", FieldKind::Date),
        FieldSpec::new("purchase_price", FieldKind::Number),
    ],
    search: &["name", "category", "location", "serial_number"],
    date_field: "purchase_date",
    default_sort: "name",
};

impl Record for Equipment {
    fn schema() -> &'static Schema {
        &EQUIPMENT_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "name" => FieldValue::text(&self.name),
            "category" => FieldValue::text(&self.category),
            "location" => FieldValue::text(&self.location),
            "serial_number" => FieldValue::text(&self.serial_number),
            "status" => FieldValue::text(self.status.as_str()),
            "purchase_date" => FieldValue::Date(self.purchase_date),
            "last_maintenance" => FieldValue::opt_date(self.last_maintenance),
            "next_maintenance" => FieldValue::opt_date(self.next_maintenance),
            "purchase_price" => FieldValue::Number(self.purchase_price),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for Equipment {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, "Name");
        errors.require_text("category", &self.category, "Category");
        errors.require_positive("purchase_price", self.purchase_price, "Purchase price");
        if let Some(last) = self.last_maintenance {
            errors.require_ordered(
                "next_maintenance",
                last,
                self.next_maintenance,
                "Next maintenance must be on or after the last maintenance.",
            );
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub operational: usize,
    pub operational_rate: f64,
    /// Sum of purchase prices.
    pub total_value: f64,
}

impl Summarize for Equipment {
    type Summary = EquipmentSummary;

    fn summarize(records: &[&Self]) -> EquipmentSummary {
        let count = records.len();
        let operational = records
            .iter()
            .filter(|e| e.status == EquipmentStatus::Operational)
            .count();
        EquipmentSummary {
            total: count,
            by_status: count_by(
                records.iter().copied(),
                EquipmentStatus::ALL.iter().copied(),
                |e| e.status,
            ),
            by_category: count_by(records.iter().copied(), std::iter::empty::<String>(), |e| {
                e.category.clone()
            }),
            operational,
            operational_rate: count_percentage(operational, count),
            total_value: total(records.iter().map(|e| e.purchase_price)),
        }
    }
}

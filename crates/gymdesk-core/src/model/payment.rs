use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::aggregate::{Summarize, count_by, percentage, total};
use crate::query::field::{FieldKind, FieldSpec, FieldValue, Record, Schema};
use crate::validate::{Validate, ValidationErrors};

labeled_enum! {
    pub enum PaymentMethod as "payment method" {
        Cash => "cash",
        Card => "card",
        Transfer => "transfer",
    }
}

labeled_enum! {
    pub enum PaymentStatus as "payment status" {
        Paid => "paid",
        Pending => "pending",
        Refunded => "refunded",
    }
}

/// A membership payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub member_id: String,
    pub member_name: String,
    pub package_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}

static PAYMENT_SCHEMA: Schema = Schema {
    kind: RecordKind::Payment,
    fields: &[
        FieldSpec::new("id", FieldKind::Text),
        FieldSpec::new("member_id", FieldKind::Text),
        FieldSpec::new("member_name", FieldKind::Text),
        FieldSpec::new("package_id", FieldKind::Text),
        FieldSpec::new("amount", FieldKind::Number),
        FieldSpec::new("method", FieldKind::Enum),
        FieldSpec::new("status", FieldKind::Enum),
        FieldSpec::new("paid_at", FieldKind::Date),
    ],
    search: &["member_name", "member_id"],
    date_field: "paid_at",
    default_sort: "paid_at",
};

impl Record for Payment {
    fn schema() -> &'static Schema {
        &PAYMENT_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::text(&self.id),
            "member_id" => FieldValue::text(&self.member_id),
            "member_name" => FieldValue::text(&self.member_name),
            "package_id" => FieldValue::text(&self.package_id),
            "amount" => FieldValue::Number(self.amount),
            "method" => FieldValue::text(self.method.as_str()),
            "status" => FieldValue::text(self.status.as_str()),
            "paid_at" => FieldValue::Date(self.paid_at),
            _ => FieldValue::Missing,
        }
    }
}

impl Validate for Payment {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_text("member_id", &self.member_id, "Member");
        errors.require_text("package_id", &self.package_id, "Package");
        errors.require_positive("amount", self.amount, "Amount");
        errors
    }
}

/// Revenue reporting over payments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub count: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_method: BTreeMap<String, usize>,
    /// Sum of paid amounts.
    pub total_revenue: f64,
    /// Sum of pending amounts.
    pub outstanding: f64,
    pub refunded: f64,
    /// Paid amount as a share of paid plus pending.
    pub collection_rate: f64,
}

impl Summarize for Payment {
    type Summary = PaymentSummary;

    fn summarize(records: &[&Self]) -> PaymentSummary {
        let amount_with = |status: PaymentStatus| {
            total(
                records
                    .iter()
                    .filter(|p| p.status == status)
                    .map(|p| p.amount),
            )
        };
        let total_revenue = amount_with(PaymentStatus::Paid);
        let outstanding = amount_with(PaymentStatus::Pending);
        PaymentSummary {
            count: records.len(),
            by_status: count_by(
                records.iter().copied(),
                PaymentStatus::ALL.iter().copied(),
                |p| p.status,
            ),
            by_method: count_by(
                records.iter().copied(),
                PaymentMethod::ALL.iter().copied(),
                |p| p.method,
            ),
            total_revenue,
            outstanding,
            refunded: amount_with(PaymentStatus::Refunded),
            collection_rate: percentage(total_revenue, total_revenue + outstanding),
        }
    }
}

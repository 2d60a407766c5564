use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use gymdesk_core::model::{
    AttendanceRecord, AttendanceStatus, DietAssignment, AssignmentStatus, Payment, PaymentMethod,
    PaymentStatus,
};
use proptest::prelude::*;

/// Instants between 2020-01-01 and 2030-01-01.
pub fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> + Clone {
    (1_577_836_800_i64..1_893_456_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

/// Whole-hour and half-hour offsets between -12:00 and +14:00.
pub fn arb_offset() -> impl Strategy<Value = FixedOffset> + Clone {
    (-24_i32..=28).prop_map(|halves| FixedOffset::east_opt(halves * 1800).unwrap())
}

pub fn arb_now() -> impl Strategy<Value = DateTime<FixedOffset>> + Clone {
    (arb_instant(), arb_offset()).prop_map(|(at, offset)| at.with_timezone(&offset))
}

pub fn arb_payment_method() -> impl Strategy<Value = PaymentMethod> + Clone {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Transfer),
    ]
}

pub fn arb_payment_status() -> impl Strategy<Value = PaymentStatus> + Clone {
    prop_oneof![
        Just(PaymentStatus::Paid),
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Refunded),
    ]
}

const NAMES: [&str; 6] = [
    "Ana Silva",
    "ben okafor",
    "Carla Diaz",
    "Dmitri Volkov",
    "Eve Moss",
    "Ana Moss",
];

/// Payments whose `amount` and `paid_at` values are all distinct.
pub fn arb_payments_with_unique_keys(max: usize) -> impl Strategy<Value = Vec<Payment>> {
    (0..max)
        .prop_flat_map(|n| {
            (
                prop::collection::btree_set(1_u32..100_000, n)
                    .prop_map(|set| set.into_iter().collect::<Vec<_>>())
                    .prop_shuffle(),
                prop::collection::btree_set(1_577_836_800_i64..1_893_456_000, n)
                    .prop_map(|set| set.into_iter().collect::<Vec<_>>())
                    .prop_shuffle(),
                prop::collection::vec(
                    (0..NAMES.len(), arb_payment_method(), arb_payment_status()),
                    n,
                ),
            )
        })
        .prop_map(|(cents, secs, rest)| {
            cents
                .into_iter()
                .zip(secs)
                .zip(rest)
                .enumerate()
                .map(|(i, ((cents, secs), (name, method, status)))| Payment {
                    id: format!("pay-{i:03}"),
                    member_id: format!("m-{name:03}"),
                    member_name: NAMES[name].to_string(),
                    package_id: "pkg-001".to_string(),
                    amount: f64::from(cents) / 100.0,
                    method,
                    status,
                    paid_at: Utc.timestamp_opt(secs, 0).unwrap(),
                })
                .collect()
        })
}

/// Payments with unique ids `pay-000`, `pay-001`, ...
pub fn arb_payments(max: usize) -> impl Strategy<Value = Vec<Payment>> + Clone {
    prop::collection::vec(
        (
            0..NAMES.len(),
            1_u32..100_000,
            arb_payment_method(),
            arb_payment_status(),
            arb_instant(),
        ),
        0..max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, cents, method, status, paid_at))| Payment {
                id: format!("pay-{i:03}"),
                member_id: format!("m-{name:03}"),
                member_name: NAMES[name].to_string(),
                package_id: "pkg-001".to_string(),
                amount: f64::from(cents) / 100.0,
                method,
                status,
                paid_at,
            })
            .collect()
    })
}

pub fn arb_attendance(max: usize) -> impl Strategy<Value = Vec<AttendanceRecord>> + Clone {
    prop::collection::vec(
        (0..NAMES.len(), arb_instant(), prop::option::of(0_i64..600)),
        0..max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, check_in_time, minutes))| {
                let check_out_time = minutes.map(|m| check_in_time + chrono::Duration::minutes(m));
                AttendanceRecord {
                    id: format!("att-{i:03}"),
                    member_id: format!("m-{name:03}"),
                    member_name: NAMES[name].to_string(),
                    check_in_time,
                    check_out_time,
                    status: if check_out_time.is_some() {
                        AttendanceStatus::Completed
                    } else {
                        AttendanceStatus::CheckedIn
                    },
                }
            })
            .collect()
    })
}

pub fn arb_assignments(max: usize) -> impl Strategy<Value = Vec<DietAssignment>> + Clone {
    prop::collection::vec(
        (
            0..NAMES.len(),
            0_u32..=100,
            prop_oneof![
                Just(AssignmentStatus::Active),
                Just(AssignmentStatus::Completed),
                Just(AssignmentStatus::Paused),
                Just(AssignmentStatus::Cancelled),
            ],
            arb_instant(),
        ),
        0..max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, adherence, status, start_date))| DietAssignment {
                id: format!("da-{i:03}"),
                member_id: format!("m-{name:03}"),
                member_name: NAMES[name].to_string(),
                diet_plan_id: "dp-001".to_string(),
                start_date,
                end_date: None,
                adherence: f64::from(adherence),
                status,
            })
            .collect()
    })
}

//! Feature record types.
//!
//! Each record declares a static [`Schema`](crate::query::Schema) and
//! implements [`Record`](crate::query::Record),
//! [`Validate`](crate::validate::Validate) and
//! [`Summarize`](crate::aggregate::Summarize).

use std::fmt;

/// Declares a string-labelled enum with `as_str`, `ALL`, `Display`,
/// `FromStr` and serde support. Labels double as the serialized form.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $expected:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::model::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = $crate::model::normalize(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == normalized)
                    .ok_or_else(|| $crate::model::ParseEnumError {
                        expected: $expected,
                        got: s.to_string(),
                    })
            }
        }
    };
}

mod attendance;
mod diet;
mod equipment;
mod member;
mod package;
mod payment;
mod workout;

pub use attendance::{AttendanceRecord, AttendanceStatus, AttendanceSummary, calculate_duration};
pub use diet::{
    AssignmentStatus, DietAssignment, DietAssignmentSummary, DietGoal, DietPlan, DietPlanSummary,
    PlanStatus,
};
pub use equipment::{Equipment, EquipmentStatus, EquipmentSummary};
pub use member::{Member, MemberStatus, MemberSummary};
pub use package::{MembershipPackage, PackageStatus, PackageSummary};
pub use payment::{Payment, PaymentMethod, PaymentStatus, PaymentSummary};
pub use workout::{WorkoutLevel, WorkoutPlan, WorkoutPlanSummary};

labeled_enum! {
    /// The feature record types the engine knows about.
    pub enum RecordKind as "record kind" {
        Member => "member",
        Attendance => "attendance",
        Equipment => "equipment",
        Package => "package",
        DietPlan => "diet_plan",
        DietAssignment => "diet_assignment",
        WorkoutPlan => "workout_plan",
        Payment => "payment",
    }
}

/// Error returned when parsing a labelled enum from an unknown string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Trim, lowercase and accept kebab-case for snake_case labels.
pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::{MemberStatus, PaymentMethod, RecordKind};
    use std::str::FromStr;

    #[test]
    fn enum_json_roundtrips() {
        assert_eq!(
            serde_json::to_string(&RecordKind::DietPlan).unwrap(),
            "\"diet_plan\""
        );
        assert_eq!(
            serde_json::from_str::<MemberStatus>("\"suspended\"").unwrap(),
            MemberStatus::Suspended
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_str(&kind.to_string()).unwrap(), *kind);
        }
        for method in PaymentMethod::ALL {
            assert_eq!(PaymentMethod::from_str(method.as_str()).unwrap(), *method);
        }
    }

    #[test]
    fn parse_accepts_case_and_kebab() {
        assert_eq!(
            RecordKind::from_str(" Diet-Assignment ").unwrap(),
            RecordKind::DietAssignment
        );
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = MemberStatus::from_str("frozen").unwrap_err();
        assert_eq!(err.to_string(), "invalid member status: 'frozen'");
    }
}

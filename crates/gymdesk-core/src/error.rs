use std::fmt;

use crate::model::RecordKind;
use crate::validate::ValidationErrors;

/// Machine-readable error codes for dashboards and scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    DatasetLoadFailed,
    ValidationFailed,
    RecordNotFound,
    BusinessRuleViolated,
    UnknownPeriod,
    UnknownField,
    InvalidDate,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::DatasetLoadFailed => "E1002",
            Self::ValidationFailed => "E2001",
            Self::RecordNotFound => "E2002",
            Self::BusinessRuleViolated => "E2003",
            Self::UnknownPeriod => "E3001",
            Self::UnknownField => "E3002",
            Self::InvalidDate => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file could not be loaded",
            Self::DatasetLoadFailed => "Dataset could not be loaded",
            Self::ValidationFailed => "Validation failed",
            Self::RecordNotFound => "Record not found",
            Self::BusinessRuleViolated => "Business rule violated",
            Self::UnknownPeriod => "Unknown time period",
            Self::UnknownField => "Unknown field",
            Self::InvalidDate => "Date out of range",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .gymdesk/config.toml and retry."),
            Self::DatasetLoadFailed => {
                Some("Check that the dataset file is valid JSON with the expected collections.")
            }
            Self::ValidationFailed => Some("Correct the highlighted fields and submit again."),
            Self::RecordNotFound => {
                Some("The record may have been removed by another action; refresh the list.")
            }
            Self::BusinessRuleViolated => None,
            Self::UnknownPeriod => Some(
                "Use one of today, yesterday, this_week, last_week, this_month, last_month, \
                 this_quarter, last_quarter, this_year, last_year, custom.",
            ),
            Self::UnknownField => Some("Use a field name listed for this collection."),
            Self::InvalidDate => Some("Pick a date closer to the present."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A config or dataset file that could not be read or parsed.
///
/// Attached as `anyhow` context so the underlying cause stays in the chain
/// while callers can still recover the code with `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoadError {
    code: ErrorCode,
    message: String,
}

impl LoadError {
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ConfigParseError,
            message: message.into(),
        }
    }

    pub fn dataset(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::DatasetLoadFailed,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }
}

/// Every recoverable failure the engine and its actions can report.
///
/// None of these are fatal: callers catch them at the action boundary and
/// turn them into visible state (see [`crate::session::Session`]).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GymError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },

    #[error("{message}")]
    BusinessRule { rule: &'static str, message: String },

    #[error("unknown time period '{token}'")]
    UnknownPeriod { token: String },

    #[error("unknown field '{field}' for {kind}")]
    UnknownField { kind: RecordKind, field: String },

    #[error("date arithmetic out of range: {0}")]
    InvalidDate(String),
}

impl GymError {
    /// Single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn rule(rule: &'static str, message: impl Into<String>) -> Self {
        Self::BusinessRule {
            rule,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::NotFound { .. } => ErrorCode::RecordNotFound,
            Self::BusinessRule { .. } => ErrorCode::BusinessRuleViolated,
            Self::UnknownPeriod { .. } => ErrorCode::UnknownPeriod,
            Self::UnknownField { .. } => ErrorCode::UnknownField,
            Self::InvalidDate(_) => ErrorCode::InvalidDate,
        }
    }

    /// Remediation text; falls back to the code's summary when no hint exists.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }

    /// Field-keyed messages, if this is a validation failure.
    #[must_use]
    pub const fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for GymError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, GymError};
    use crate::model::RecordKind;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::DatasetLoadFailed,
            ErrorCode::ValidationFailed,
            ErrorCode::RecordNotFound,
            ErrorCode::BusinessRuleViolated,
            ErrorCode::UnknownPeriod,
            ErrorCode::UnknownField,
            ErrorCode::InvalidDate,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::UnknownPeriod.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = GymError::not_found(RecordKind::Member, "m-404");
        assert_eq!(err.to_string(), "member 'm-404' not found");
        assert_eq!(err.error_code(), ErrorCode::RecordNotFound);
        assert!(err.suggestion().contains("refresh"));
    }

    #[test]
    fn business_rule_suggestion_falls_back_to_summary() {
        let err = GymError::rule("already_checked_in", "member already checked in");
        assert_eq!(err.to_string(), "member already checked in");
        assert_eq!(err.suggestion(), "Business rule violated");
    }

    #[test]
    fn invalid_builds_single_field_map() {
        let err = GymError::invalid("price", "Price must be greater than 0.");
        let errors = err.validation_errors().expect("validation variant");
        assert_eq!(errors.get("price"), Some("Price must be greater than 0."));
        assert!(err.to_string().contains("price: Price must be greater than 0."));
    }
}

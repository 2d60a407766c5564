//! Field-keyed validation results for candidate records.
//!
//! Validation runs before any mutation. A non-empty [`ValidationErrors`]
//! aborts the action, so a snapshot is never partially updated.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Map from field name to a human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when valid, otherwise the collected errors.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }

    pub fn require_text(&mut self, field: &str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{label} is required."));
        }
    }

    pub fn require_email(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, "Email is required.");
            return;
        }
        let valid = value
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && !domain.is_empty());
        if !valid {
            self.add(field, "Email must contain '@'.");
        }
    }

    pub fn require_positive(&mut self, field: &str, value: f64, label: &str) {
        if !(value.is_finite() && value > 0.0) {
            self.add(field, format!("{label} must be greater than 0."));
        }
    }

    pub fn require_positive_count(&mut self, field: &str, value: u32, label: &str) {
        if value == 0 {
            self.add(field, format!("{label} must be at least 1."));
        }
    }

    pub fn require_percent(&mut self, field: &str, value: f64, label: &str) {
        if !(0.0..=100.0).contains(&value) {
            self.add(field, format!("{label} must be between 0 and 100."));
        }
    }

    /// `end` must not precede `start`. Absent `end` passes.
    pub fn require_ordered(
        &mut self,
        field: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        message: &str,
    ) {
        if end.is_some_and(|end| end < start) {
            self.add(field, message);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// Implemented by every record that can be created or updated through an action.
pub trait Validate {
    fn validate(&self) -> ValidationErrors;
}

//! The action boundary: dialogs, banners, and the current snapshot.
//!
//! Errors from dataset actions stop here. They become a [`Banner`] and a
//! `warn!` log line, and the previous snapshot stays current.

use serde::Serialize;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::GymError;
use crate::model::RecordKind;

/// Which modal is open. At most one is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "dialog", rename_all = "snake_case")]
pub enum Dialog {
    #[default]
    Closed,
    Create {
        kind: RecordKind,
    },
    Edit {
        kind: RecordKind,
        id: String,
    },
    ConfirmDelete {
        kind: RecordKind,
        id: String,
    },
    Details {
        kind: RecordKind,
        id: String,
    },
}

impl Dialog {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerLevel {
    Success,
    Error,
}

/// Feedback shown after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub level: BannerLevel,
    pub message: String,
    /// Machine code for errors, e.g. `E2003`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Outcome of [`Session::perform`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Rejected(GymError),
}

impl Outcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Holds the current dataset snapshot and UI-facing state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    dataset: Dataset,
    dialog: Dialog,
    banner: Option<Banner>,
}

impl Session {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            dialog: Dialog::Closed,
            banner: None,
        }
    }

    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub const fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    #[must_use]
    pub const fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Open `dialog`, replacing any dialog already open.
    pub fn open(&mut self, dialog: Dialog) {
        self.dialog = dialog;
    }

    pub fn close(&mut self) {
        self.dialog = Dialog::Closed;
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Run `action` against the current snapshot.
    ///
    /// On success the new snapshot replaces the old one, the dialog closes,
    /// and a success banner is set. On failure the snapshot is kept, the
    /// dialog stays open only for validation errors, and an error banner
    /// carries the code and message.
    pub fn perform<F>(&mut self, name: &str, action: F) -> Outcome
    where
        F: FnOnce(&Dataset) -> Result<Dataset, GymError>,
    {
        match action(&self.dataset) {
            Ok(next) => {
                self.dataset = next;
                self.dialog = Dialog::Closed;
                self.banner = Some(Banner {
                    level: BannerLevel::Success,
                    message: format!("{name} succeeded"),
                    code: None,
                });
                info!(action = name, "action applied");
                Outcome::Applied
            }
            Err(err) => {
                let code = err.error_code();
                warn!(action = name, code = code.code(), error = %err, "action failed");
                if err.validation_errors().is_none() {
                    self.dialog = Dialog::Closed;
                }
                self.banner = Some(Banner {
                    level: BannerLevel::Error,
                    message: format!("{name} failed: {err}"),
                    code: Some(code.code()),
                });
                Outcome::Rejected(err)
            }
        }
    }
}

//! Interaction controllers, one per dashboard.
//!
//! A controller owns an in-memory snapshot of the collections it shows. Each
//! typed action mutates the snapshot, persists the touched collections and
//! re-renders the page. Recoverable failures come back as notices or field
//! markers with the store left as it was.

pub mod admin;
pub mod forms;
pub mod incharge;
pub mod student;

pub use admin::{AdminAction, AdminDashboard};
pub use forms::{BusForm, ComplaintForm, FieldError, StatusUpdateForm, StudentForm};
pub use incharge::{InchargeAction, InchargeDashboard};
pub use student::{StudentAction, StudentDashboard};

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{error, info, warn};

use crate::error::{DeskError, Result};
use crate::metrics::MetricsCollector;
use crate::models::Role;
use crate::seed;
use crate::session::{Access, SessionGuard};
use crate::storage::Store;

/// Transient message shown to the user (a toast in the browser)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
}

impl Notice {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Info(s) | Self::Success(s) | Self::Warning(s) => s,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Where a form currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Creating,
    Editing { id: String },
}

impl FormPhase {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// What an action produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    /// Inline markers of a failed form validation
    pub field_errors: Vec<FieldError>,
    /// Whether the page was redrawn
    pub rerendered: bool,
}

impl Outcome {
    pub(crate) fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Self::default()
        }
    }

    pub(crate) fn invalid(field_errors: Vec<FieldError>) -> Self {
        Self {
            field_errors,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for tests and reproducible renders
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Guard the dashboard for `role` and make sure demo data exists.
///
/// A redirect comes back as [`DeskError::AccessDenied`].
pub(crate) fn enter(guard: &SessionGuard, store: &Store, role: Role, now: DateTime<Utc>) -> Result<Vec<Notice>> {
    let mut notices = Vec::new();
    match guard.protect(role, now)? {
        Access::Granted(_) => {}
        Access::DemoSession(_) => notices.push(Notice::Info(format!(
            "Demo mode: {role} session created (frontend-only)."
        ))),
        Access::Redirect(page) => return Err(DeskError::AccessDenied(role.to_string(), page)),
    }
    let report = seed::ensure_seeded(store, now)?;
    if !report.is_noop() {
        info!(role = %role, seeded = ?report.seeded, "demo data seeded");
    }
    Ok(notices)
}

/// Turn recoverable failures into notices; storage and config errors pass through.
///
/// Every failure is counted under `action`.
pub(crate) fn recover(result: Result<Outcome>, metrics: &MetricsCollector, action: &'static str) -> Result<Outcome> {
    let err = match result {
        Ok(outcome) => return Ok(outcome),
        Err(e) => e,
    };
    metrics.record_error(err.kind(), action);
    match err {
        DeskError::Validation { field, message } => Ok(Outcome::invalid(vec![FieldError { field, message }])),
        e if e.is_recoverable() => {
            warn!(error = %e, action, "action rejected");
            Ok(Outcome::notice(Notice::Warning(e.to_string())))
        }
        e => {
            error!(error = %e, action, "action failed");
            Err(e)
        }
    }
}

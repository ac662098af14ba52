use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use super::forms::StatusUpdateForm;
use super::{enter, recover, Clock, Notice, Outcome};
use crate::config::ViewConfig;
use crate::error::{DeskError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{AttendanceEntry, Complaint, Role};
use crate::session::SessionGuard;
use crate::storage::Store;
use crate::validation::InputValidator;
use crate::view::filter::StatusFilter;
use crate::view::incharge::{self as render, InchargeFilters};
use crate::view::{Page, ViewBindings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InchargeAction {
    FilterStatus(StatusFilter),
    /// `None` clears the date filter
    FilterAttendanceDate(Option<NaiveDate>),
    SearchAttendance(String),
    /// Open the status dialog of one complaint
    OpenComplaint(String),
    SaveComplaintStatus(StatusUpdateForm),
    CloseComplaint,
    /// Re-read the store and redraw
    Refresh,
}

impl InchargeAction {
    const fn name(&self) -> &'static str {
        match self {
            Self::FilterStatus(_) => "filter_status",
            Self::FilterAttendanceDate(_) => "filter_attendance_date",
            Self::SearchAttendance(_) => "search_attendance",
            Self::OpenComplaint(_) => "open_complaint",
            Self::SaveComplaintStatus(_) => "save_complaint_status",
            Self::CloseComplaint => "close_complaint",
            Self::Refresh => "refresh",
        }
    }
}

/// Bus in-charge dashboard: complaint handling and the attendance roster.
pub struct InchargeDashboard {
    store: Store,
    page: Page,
    bindings: ViewBindings,
    settings: ViewConfig,
    clock: Arc<dyn Clock>,
    metrics: MetricsCollector,
    complaints: Vec<Complaint>,
    attendance: Vec<AttendanceEntry>,
    filters: InchargeFilters,
    open_complaint: Option<String>,
}

impl InchargeDashboard {
    pub fn open(
        guard: &SessionGuard,
        store: Store,
        page: Page,
        settings: ViewConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, Outcome)> {
        let bindings = ViewBindings::resolve(Role::Incharge, &page)?;
        let now = clock.now();
        let notices = enter(guard, &store, Role::Incharge, now)?;

        let mut dashboard = Self {
            store,
            page,
            bindings,
            settings,
            clock,
            metrics: MetricsCollector::default(),
            complaints: Vec::new(),
            attendance: Vec::new(),
            filters: InchargeFilters::for_today(now),
            open_complaint: None,
        };
        dashboard.reload()?;
        dashboard.render_all();
        info!(complaints = dashboard.complaints.len(), "incharge dashboard opened");

        Ok((
            dashboard,
            Outcome {
                notices,
                rerendered: true,
                ..Outcome::default()
            },
        ))
    }

    fn reload(&mut self) -> Result<()> {
        self.complaints = self.store.load()?;
        self.attendance = self.store.load()?;
        Ok(())
    }

    fn render_all(&mut self) {
        render::render(
            &mut self.page,
            &self.bindings,
            &self.complaints,
            &self.attendance,
            &self.filters,
            &self.settings,
            self.clock.now(),
        );
    }

    pub fn dispatch(&mut self, action: InchargeAction) -> Result<Outcome> {
        let name = action.name();
        self.metrics.record_action("incharge", name);
        debug!(action = name, "incharge action");
        let mut outcome = recover(self.apply(action), &self.metrics, name)?;
        if outcome.is_valid() {
            self.render_all();
            outcome.rerendered = true;
        }
        Ok(outcome)
    }

    fn apply(&mut self, action: InchargeAction) -> Result<Outcome> {
        match action {
            InchargeAction::FilterStatus(status) => self.filters.status = status,
            InchargeAction::FilterAttendanceDate(date) => self.filters.date = date,
            InchargeAction::SearchAttendance(term) => self.filters.search = term.trim().to_lowercase(),
            InchargeAction::OpenComplaint(id) => {
                if !self.complaints.iter().any(|c| c.id == id) {
                    return Err(DeskError::not_found("Complaint", id));
                }
                self.open_complaint = Some(id);
            }
            InchargeAction::SaveComplaintStatus(form) => return self.save_status(&form),
            InchargeAction::CloseComplaint => self.open_complaint = None,
            InchargeAction::Refresh => {
                self.reload()?;
                return Ok(Outcome::notice(Notice::Info("Dashboard updated".to_string())));
            }
        }
        Ok(Outcome::default())
    }

    fn save_status(&mut self, form: &StatusUpdateForm) -> Result<Outcome> {
        let Some(id) = self.open_complaint.clone() else {
            return Ok(Outcome::notice(Notice::Warning("No complaint is open".to_string())));
        };
        let now = self.clock.now();
        let mut complaints = self.complaints.clone();
        let Some(complaint) = complaints.iter_mut().find(|c| c.id == id) else {
            self.open_complaint = None;
            return Err(DeskError::not_found("Complaint", id));
        };
        let notes = InputValidator::sanitize_text(&form.notes);
        complaint.status = form.status;
        complaint.notes = (!notes.is_empty()).then_some(notes);
        complaint.updated_at = Some(now);

        // The dialog stays open until the write lands.
        self.store.save(&complaints)?;
        self.complaints = complaints;
        self.open_complaint = None;
        info!(id = %id, status = form.status.label(), "complaint status updated");
        Ok(Outcome::notice(Notice::Success(
            "Complaint status updated successfully".to_string(),
        )))
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }

    #[must_use]
    pub const fn filters(&self) -> &InchargeFilters {
        &self.filters
    }

    /// Complaint currently open in the status dialog
    #[must_use]
    pub fn open_complaint(&self) -> Option<&Complaint> {
        let id = self.open_complaint.as_ref()?;
        self.complaints.iter().find(|c| &c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FixedClock;
    use crate::models::ComplaintStatus;
    use crate::session::SessionPolicy;
    use crate::view::Region;
    use chrono::Utc;

    fn open() -> InchargeDashboard {
        let store = Store::in_memory();
        let guard = SessionGuard::new(store.clone(), SessionPolicy::PermissiveDemo, "index.html", "demo-token");
        InchargeDashboard::open(
            &guard,
            store,
            Page::for_dashboard(Role::Incharge),
            ViewConfig::default(),
            Arc::new(FixedClock(Utc::now())),
        )
        .unwrap()
        .0
    }

    #[test]
    fn test_status_update_stamps_updated_at() {
        let mut d = open();
        let id = d.complaints()[0].id.clone();
        d.dispatch(InchargeAction::OpenComplaint(id.clone())).unwrap();
        let outcome = d
            .dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm {
                status: ComplaintStatus::InProgress,
                notes: "Driver spoken to".to_string(),
            }))
            .unwrap();
        assert!(matches!(outcome.notices[0], Notice::Success(_)));

        let saved: Vec<Complaint> = d.store.load().unwrap();
        let c = saved.iter().find(|c| c.id == id).unwrap();
        assert_eq!(c.status, ComplaintStatus::InProgress);
        assert_eq!(c.notes.as_deref(), Some("Driver spoken to"));
        assert!(c.updated_at.is_some());
        assert_eq!(d.page().get(Region::InProgressCount), Some("1"));
        assert!(d.open_complaint().is_none());
    }

    #[test]
    fn test_save_without_open_complaint_changes_nothing() {
        let mut d = open();
        let before = d.complaints().to_vec();
        let outcome = d
            .dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm {
                status: ComplaintStatus::Resolved,
                notes: String::new(),
            }))
            .unwrap();
        assert!(matches!(outcome.notices[0], Notice::Warning(_)));
        assert_eq!(d.complaints(), before.as_slice());
    }

    #[test]
    fn test_filters_open_on_today() {
        let d = open();
        assert!(d.filters().date.is_some());
        assert_eq!(d.filters().status, StatusFilter::All);
    }
}

use std::sync::Arc;
use tracing::{debug, info};

use super::forms::ComplaintForm;
use super::{enter, recover, Clock, Notice, Outcome};
use crate::config::ViewConfig;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::{AttendanceEntry, AttendanceStatus, CaptureMode, Complaint, ComplaintStatus, Role};
use crate::session::SessionGuard;
use crate::storage::Store;
use crate::utils::uid;
use crate::validation::InputValidator;
use crate::view::student as render;
use crate::view::{Page, ViewBindings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentAction {
    SubmitComplaint(ComplaintForm),
    /// A decoded QR payload, kept verbatim
    MarkAttendanceQr(String),
    /// A code typed by hand
    MarkAttendanceManual(String),
    Refresh,
}

impl StudentAction {
    const fn name(&self) -> &'static str {
        match self {
            Self::SubmitComplaint(_) => "submit_complaint",
            Self::MarkAttendanceQr(_) => "mark_attendance_qr",
            Self::MarkAttendanceManual(_) => "mark_attendance_manual",
            Self::Refresh => "refresh",
        }
    }
}

pub struct StudentDashboard {
    store: Store,
    page: Page,
    bindings: ViewBindings,
    settings: ViewConfig,
    clock: Arc<dyn Clock>,
    metrics: MetricsCollector,
    attendance: Vec<AttendanceEntry>,
    complaints: Vec<Complaint>,
}

impl StudentDashboard {
    pub fn open(
        guard: &SessionGuard,
        store: Store,
        page: Page,
        settings: ViewConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, Outcome)> {
        let bindings = ViewBindings::resolve(Role::Student, &page)?;
        let notices = enter(guard, &store, Role::Student, clock.now())?;

        let mut dashboard = Self {
            store,
            page,
            bindings,
            settings,
            clock,
            metrics: MetricsCollector::default(),
            attendance: Vec::new(),
            complaints: Vec::new(),
        };
        dashboard.reload()?;
        dashboard.render_all();
        info!(attendance = dashboard.attendance.len(), "student dashboard opened");

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
        self.attendance = self.store.load()?;
        self.complaints = self.store.load()?;
        Ok(())
    }

    fn render_all(&mut self) {
        render::render(
            &mut self.page,
            &self.bindings,
            &self.attendance,
            &self.complaints,
            &self.settings,
            self.clock.now(),
        );
    }

    pub fn dispatch(&mut self, action: StudentAction) -> Result<Outcome> {
        let name = action.name();
        self.metrics.record_action("student", name);
        debug!(action = name, "student action");
        let mut outcome = recover(self.apply(action), &self.metrics, name)?;
        if outcome.is_valid() {
            self.render_all();
            outcome.rerendered = true;
        }
        Ok(outcome)
    }

    fn apply(&mut self, action: StudentAction) -> Result<Outcome> {
        match action {
            StudentAction::SubmitComplaint(form) => self.submit_complaint(&form),
            StudentAction::MarkAttendanceQr(payload) => self.mark(CaptureMode::Qr, payload),
            StudentAction::MarkAttendanceManual(code) => {
                InputValidator::validate_attendance_code(&code)?;
                self.mark(CaptureMode::Manual, code.trim().to_string())
            }
            StudentAction::Refresh => {
                self.reload()?;
                Ok(Outcome::notice(Notice::Info("Dashboard updated".to_string())))
            }
        }
    }

    fn submit_complaint(&mut self, form: &ComplaintForm) -> Result<Outcome> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(Outcome::invalid(errors));
        }
        let mut complaints = self.complaints.clone();
        complaints.insert(
            0,
            Complaint {
                id: uid("c_"),
                subject: InputValidator::sanitize_text(&form.subject),
                description: InputValidator::sanitize_text(&form.description),
                status: ComplaintStatus::Submitted,
                created_at: self.clock.now(),
                notes: None,
                updated_at: None,
            },
        );
        self.store.save(&complaints)?;
        self.complaints = complaints;
        info!(complaints = self.complaints.len(), "complaint submitted");
        Ok(Outcome::notice(Notice::Success("Complaint submitted".to_string())))
    }

    fn mark(&mut self, mode: CaptureMode, raw: String) -> Result<Outcome> {
        let mut attendance = self.attendance.clone();
        attendance.insert(
            0,
            AttendanceEntry {
                ts: self.clock.now(),
                status: AttendanceStatus::Present,
                mode,
                raw: Some(raw),
            },
        );
        attendance.truncate(self.store.attendance_cap());
        self.store.save(&attendance)?;
        self.attendance = attendance;
        info!(mode = mode.label(), "attendance marked");
        Ok(Outcome::notice(Notice::Success(format!(
            "Attendance marked ({})",
            match mode {
                CaptureMode::Qr => "QR",
                CaptureMode::Manual | CaptureMode::Demo => "manual",
            }
        ))))
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn attendance(&self) -> &[AttendanceEntry] {
        &self.attendance
    }

    #[must_use]
    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }
}

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::forms::{BusForm, StudentForm};
use super::{enter, recover, Clock, FormPhase, Notice, Outcome};
use crate::config::ViewConfig;
use crate::error::{DeskError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{Bus, Complaint, FeeStatus, Notification, Role, Student, NO_BUS};
use crate::session::SessionGuard;
use crate::storage::Store;
use crate::utils::{next_student_code, uid};
use crate::validation::InputValidator;
use crate::view::admin::{self as render, AdminSnapshot, StudentListState};
use crate::view::paginate::PageWindow;
use crate::view::{Page, ViewBindings};

/// Message prefilled when composing to defaulters
pub const FEE_REMINDER: &str = "Reminder: your bus fees are pending. Please pay soon.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    OpenCreateStudent,
    EditStudent(String),
    SubmitStudent(StudentForm),
    OpenCreateBus,
    EditBus(String),
    SubmitBus(BusForm),
    /// Abandon whichever form is open
    CloseForm,
    RequestDeleteStudent(String),
    RequestDeleteBus(String),
    ConfirmDelete,
    CancelDelete,
    /// Open the compose dialog preselecting one student
    NotifyStudent(String),
    /// Open the compose dialog preselecting every defaulter
    NotifyDefaulters,
    /// Queue one notification per recipient; no recipients means everyone
    SendNotification { recipients: Vec<String>, message: String },
    Search(String),
    GoToPage(usize),
    /// Clock tick; refreshes the last-updated label
    Tick,
}

impl AdminAction {
    const fn name(&self) -> &'static str {
        match self {
            Self::OpenCreateStudent => "open_create_student",
            Self::EditStudent(_) => "edit_student",
            Self::SubmitStudent(_) => "submit_student",
            Self::OpenCreateBus => "open_create_bus",
            Self::EditBus(_) => "edit_bus",
            Self::SubmitBus(_) => "submit_bus",
            Self::CloseForm => "close_form",
            Self::RequestDeleteStudent(_) => "request_delete_student",
            Self::RequestDeleteBus(_) => "request_delete_bus",
            Self::ConfirmDelete => "confirm_delete",
            Self::CancelDelete => "cancel_delete",
            Self::NotifyStudent(_) => "notify_student",
            Self::NotifyDefaulters => "notify_defaulters",
            Self::SendNotification { .. } => "send_notification",
            Self::Search(_) => "search",
            Self::GoToPage(_) => "go_to_page",
            Self::Tick => "tick",
        }
    }
}

/// Delete awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    Student(String),
    Bus(String),
}

/// Compose dialog state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compose {
    pub recipients: Vec<String>,
    pub message: String,
}

/// Admin dashboard: students, buses and notifications.
pub struct AdminDashboard {
    store: Store,
    page: Page,
    bindings: ViewBindings,
    settings: ViewConfig,
    clock: Arc<dyn Clock>,
    metrics: MetricsCollector,
    students: Vec<Student>,
    buses: Vec<Bus>,
    complaints: Vec<Complaint>,
    notifications: Vec<Notification>,
    list: StudentListState,
    window: Option<PageWindow>,
    student_form: FormPhase,
    bus_form: FormPhase,
    pending_delete: Option<PendingDelete>,
    compose: Compose,
}

impl AdminDashboard {
    /// Guard, seed, load and draw the dashboard.
    pub fn open(
        guard: &SessionGuard,
        store: Store,
        page: Page,
        settings: ViewConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, Outcome)> {
        let bindings = ViewBindings::resolve(Role::Admin, &page)?;
        let notices = enter(guard, &store, Role::Admin, clock.now())?;

        let mut dashboard = Self {
            store,
            page,
            bindings,
            settings,
            clock,
            metrics: MetricsCollector::default(),
            students: Vec::new(),
            buses: Vec::new(),
            complaints: Vec::new(),
            notifications: Vec::new(),
            list: StudentListState::default(),
            window: None,
            student_form: FormPhase::Idle,
            bus_form: FormPhase::Idle,
            pending_delete: None,
            compose: Compose::default(),
        };
        dashboard.reload()?;
        dashboard.render_all();
        info!(students = dashboard.students.len(), buses = dashboard.buses.len(), "admin dashboard opened");

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
        self.students = self.store.load()?;
        self.buses = self.store.load()?;
        self.complaints = self.store.load()?;
        self.notifications = self.store.load()?;
        Ok(())
    }

    fn render_all(&mut self) {
        let snapshot = AdminSnapshot {
            students: &self.students,
            buses: &self.buses,
            complaints: &self.complaints,
        };
        let window = render::render(
            &mut self.page,
            &self.bindings,
            snapshot,
            &self.list,
            &self.compose.recipients,
            &self.settings,
            self.clock.now(),
        );
        self.list.page = window.page;
        self.window = Some(window);
    }

    /// Apply one action. Only storage failures are returned as errors.
    pub fn dispatch(&mut self, action: AdminAction) -> Result<Outcome> {
        let name = action.name();
        self.metrics.record_action("admin", name);
        debug!(action = name, "admin action");
        let mut outcome = recover(self.apply(action), &self.metrics, name)?;
        if outcome.is_valid() {
            self.render_all();
            outcome.rerendered = true;
        }
        Ok(outcome)
    }

    fn apply(&mut self, action: AdminAction) -> Result<Outcome> {
        match action {
            AdminAction::OpenCreateStudent => {
                self.student_form = FormPhase::Creating;
                Ok(Outcome::default())
            }
            AdminAction::EditStudent(id) => {
                if !self.students.iter().any(|s| s.id == id) {
                    return Err(DeskError::not_found("Student", id));
                }
                self.student_form = FormPhase::Editing { id };
                Ok(Outcome::default())
            }
            AdminAction::SubmitStudent(form) => self.submit_student(&form),
            AdminAction::OpenCreateBus => {
                self.bus_form = FormPhase::Creating;
                Ok(Outcome::default())
            }
            AdminAction::EditBus(id) => {
                if !self.buses.iter().any(|b| b.id == id) {
                    return Err(DeskError::not_found("Bus", id));
                }
                self.bus_form = FormPhase::Editing { id };
                Ok(Outcome::default())
            }
            AdminAction::SubmitBus(form) => self.submit_bus(&form),
            AdminAction::CloseForm => {
                self.student_form = FormPhase::Idle;
                self.bus_form = FormPhase::Idle;
                Ok(Outcome::default())
            }
            AdminAction::RequestDeleteStudent(id) => self.request_delete("student", PendingDelete::Student(id)),
            AdminAction::RequestDeleteBus(id) => self.request_delete("bus", PendingDelete::Bus(id)),
            AdminAction::ConfirmDelete => self.confirm_delete(),
            AdminAction::CancelDelete => {
                self.pending_delete = None;
                Ok(Outcome::default())
            }
            AdminAction::NotifyStudent(id) => {
                if !self.students.iter().any(|s| s.id == id) {
                    return Err(DeskError::not_found("Student", id));
                }
                self.open_compose(vec![id]);
                Ok(Outcome::default())
            }
            AdminAction::NotifyDefaulters => {
                let defaulters: Vec<String> = self
                    .students
                    .iter()
                    .filter(|s| s.is_defaulter())
                    .map(|s| s.id.clone())
                    .collect();
                self.open_compose(defaulters);
                Ok(Outcome::default())
            }
            AdminAction::SendNotification { recipients, message } => self.send_notification(recipients, &message),
            AdminAction::Search(term) => {
                self.list.search = term.trim().to_string();
                self.list.page = 1;
                Ok(Outcome::default())
            }
            AdminAction::GoToPage(page) => {
                self.list.page = page;
                Ok(Outcome::default())
            }
            AdminAction::Tick => Ok(Outcome::default()),
        }
    }

    fn bus_number_of(&self, bus_id: Option<&str>) -> Result<(Option<String>, String)> {
        match bus_id.filter(|id| !id.is_empty()) {
            None => Ok((None, NO_BUS.to_string())),
            Some(id) => self
                .buses
                .iter()
                .find(|b| b.id == id)
                .map(|b| (Some(b.id.clone()), b.bus_number.clone()))
                .ok_or_else(|| DeskError::validation("bus_id", format!("Unknown bus {id}"))),
        }
    }

    fn submit_student(&mut self, form: &StudentForm) -> Result<Outcome> {
        if !self.student_form.is_open() {
            return Ok(Outcome::notice(Notice::Warning("No student form is open".to_string())));
        }
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(Outcome::invalid(errors));
        }
        let (bus_id, bus_number) = self.bus_number_of(form.bus_id.as_deref())?;
        let name = InputValidator::sanitize_text(&form.name);
        let email = form.email.trim().to_string();
        let phone = form.phone.trim().to_string();

        let mut students = self.students.clone();
        let notice = match &self.student_form {
            FormPhase::Editing { id } => {
                let Some(student) = students.iter_mut().find(|s| &s.id == id) else {
                    return Err(DeskError::not_found("Student", id.clone()));
                };
                student.name = name;
                student.email = email;
                student.phone = phone;
                student.bus_id = bus_id;
                student.bus_number = bus_number;
                if let Some(fee) = form.fee_status {
                    student.fee_status = fee;
                }
                "Student updated"
            }
            FormPhase::Creating | FormPhase::Idle => {
                let student_id = next_student_code(students.iter().map(|s| s.student_id.as_str()));
                students.insert(
                    0,
                    Student {
                        id: uid("s_"),
                        student_id,
                        name,
                        email,
                        phone,
                        bus_id,
                        bus_number,
                        fee_status: form.fee_status.unwrap_or(FeeStatus::Paid),
                    },
                );
                "Student added"
            }
        };
        self.store.save(&students)?;
        self.students = students;
        self.student_form = FormPhase::Idle;
        info!(students = self.students.len(), "{notice}");
        Ok(Outcome::notice(Notice::Success(notice.to_string())))
    }

    fn submit_bus(&mut self, form: &BusForm) -> Result<Outcome> {
        if !self.bus_form.is_open() {
            return Ok(Outcome::notice(Notice::Warning("No bus form is open".to_string())));
        }
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(Outcome::invalid(errors));
        }
        let capacity = InputValidator::parse_capacity(&form.capacity)?;
        let bus_number = form.bus_number.trim().to_string();
        let route = form.route.trim().to_string();
        let incharge_name = form
            .incharge_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        // Student bus numbers are a cached copy and are not refreshed here.
        let mut buses = self.buses.clone();
        let notice = match &self.bus_form {
            FormPhase::Editing { id } => {
                let Some(bus) = buses.iter_mut().find(|b| &b.id == id) else {
                    return Err(DeskError::not_found("Bus", id.clone()));
                };
                bus.bus_number = bus_number;
                bus.route = route;
                bus.capacity = capacity;
                if incharge_name.is_some() {
                    bus.incharge_name = incharge_name;
                }
                "Bus updated"
            }
            FormPhase::Creating | FormPhase::Idle => {
                buses.insert(
                    0,
                    Bus {
                        id: uid("b_"),
                        bus_number,
                        route,
                        capacity,
                        incharge_name,
                    },
                );
                "Bus added"
            }
        };
        self.store.save(&buses)?;
        self.buses = buses;
        self.bus_form = FormPhase::Idle;
        info!(buses = self.buses.len(), "{notice}");
        Ok(Outcome::notice(Notice::Success(notice.to_string())))
    }

    fn request_delete(&mut self, kind: &'static str, target: PendingDelete) -> Result<Outcome> {
        let exists = match &target {
            PendingDelete::Student(id) => self.students.iter().any(|s| &s.id == id),
            PendingDelete::Bus(id) => self.buses.iter().any(|b| &b.id == id),
        };
        if !exists {
            let (entity, id) = match target {
                PendingDelete::Student(id) => ("Student", id),
                PendingDelete::Bus(id) => ("Bus", id),
            };
            return Err(DeskError::not_found(entity, id));
        }
        self.pending_delete = Some(target);
        Ok(Outcome::notice(Notice::Info(format!(
            "Are you sure you want to delete this {kind}? This action cannot be undone."
        ))))
    }

    fn confirm_delete(&mut self) -> Result<Outcome> {
        let Some(target) = self.pending_delete.take() else {
            return Ok(Outcome::notice(Notice::Warning("Nothing to delete".to_string())));
        };
        match target {
            PendingDelete::Student(id) => {
                let mut students = self.students.clone();
                students.retain(|s| s.id != id);
                if students.len() == self.students.len() {
                    return Err(DeskError::not_found("Student", id));
                }
                self.store.save(&students)?;
                self.students = students;
                info!(id = %id, "student deleted");
                Ok(Outcome::notice(Notice::Success("Student deleted".to_string())))
            }
            PendingDelete::Bus(id) => {
                if !self.buses.iter().any(|b| b.id == id) {
                    return Err(DeskError::not_found("Bus", id));
                }
                let mut students = self.students.clone();
                let mut detached = 0;
                for student in students.iter_mut().filter(|s| s.bus_id.as_deref() == Some(id.as_str())) {
                    student.bus_id = None;
                    student.bus_number = NO_BUS.to_string();
                    detached += 1;
                }
                let mut buses = self.buses.clone();
                buses.retain(|b| b.id != id);
                // Two separate writes; a failure between them leaves students detached from a bus that still exists.
                self.store.save(&students)?;
                self.students = students;
                self.store.save(&buses)?;
                self.buses = buses;
                info!(id = %id, detached, "bus deleted");
                Ok(Outcome::notice(Notice::Success("Bus deleted".to_string())))
            }
        }
    }

    fn open_compose(&mut self, recipients: Vec<String>) {
        let message = if recipients.is_empty() {
            String::new()
        } else {
            FEE_REMINDER.to_string()
        };
        self.compose = Compose { recipients, message };
    }

    fn send_notification(&mut self, recipients: Vec<String>, message: &str) -> Result<Outcome> {
        InputValidator::validate_message(message)?;
        let message = message.trim();
        let to_all = recipients.is_empty();
        let recipients = if to_all {
            self.students.iter().map(|s| s.id.clone()).collect()
        } else {
            recipients
        };

        let now = self.clock.now();
        let mut notifications = self.notifications.clone();
        for student_ref in &recipients {
            let student = self.students.iter().find(|s| &s.id == student_ref);
            if student.is_none() {
                warn!(student_ref = %student_ref, "notification queued for unknown student");
            }
            notifications.insert(
                0,
                Notification {
                    id: uid("n_"),
                    student_ref: student_ref.clone(),
                    student_name: student.map(|s| s.name.clone()),
                    student_email: student.map(|s| s.email.clone()),
                    message: message.to_string(),
                    created_at: now,
                },
            );
        }
        self.store.save(&notifications)?;
        self.notifications = notifications;
        self.metrics.record_notifications(recipients.len());
        self.compose = Compose::default();

        let text = if to_all {
            "Notification sent to all students".to_string()
        } else {
            format!("Notification sent to {} student(s)", recipients.len())
        };
        info!(count = recipients.len(), "notifications queued");
        Ok(Outcome::notice(Notice::Success(text)))
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    #[must_use]
    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    #[must_use]
    pub const fn student_form(&self) -> &FormPhase {
        &self.student_form
    }

    #[must_use]
    pub const fn bus_form(&self) -> &FormPhase {
        &self.bus_form
    }

    /// Prefill of the student form while editing
    #[must_use]
    pub fn student_prefill(&self) -> Option<StudentForm> {
        match &self.student_form {
            FormPhase::Editing { id } => self.students.iter().find(|s| &s.id == id).map(StudentForm::from_student),
            _ => None,
        }
    }

    #[must_use]
    pub fn bus_prefill(&self) -> Option<BusForm> {
        match &self.bus_form {
            FormPhase::Editing { id } => self.buses.iter().find(|b| &b.id == id).map(BusForm::from_bus),
            _ => None,
        }
    }

    #[must_use]
    pub const fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    #[must_use]
    pub const fn compose(&self) -> &Compose {
        &self.compose
    }

    #[must_use]
    pub const fn list_state(&self) -> &StudentListState {
        &self.list
    }

    /// Window of the students table as last rendered
    #[must_use]
    pub const fn window(&self) -> Option<&PageWindow> {
        self.window.as_ref()
    }
}

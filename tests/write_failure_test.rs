//! A failed write must leave both the store and the dashboard's copy untouched

use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use schoolbus_desk::config::ViewConfig;
use schoolbus_desk::controller::{
    AdminAction, AdminDashboard, FixedClock, InchargeAction, InchargeDashboard, StatusUpdateForm, StudentAction,
    StudentDashboard, StudentForm,
};
use schoolbus_desk::error::{DeskError, Result};
use schoolbus_desk::models::{AttendanceEntry, Complaint, ComplaintStatus, Role, Student};
use schoolbus_desk::session::{SessionGuard, SessionPolicy};
use schoolbus_desk::storage::{MemoryBackend, StorageBackend, Store};
use schoolbus_desk::view::Page;

/// Memory backend whose writes can be switched off
#[derive(Default)]
struct FlakyBackend {
    inner: MemoryBackend,
    failing: AtomicBool,
}

impl FlakyBackend {
    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeskError::Storage("quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for FlakyBackend {
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check()?;
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.remove_item(key)
    }
}

fn flaky_store() -> (Arc<FlakyBackend>, Store) {
    let backend = Arc::new(FlakyBackend::default());
    let store = Store::new(backend.clone());
    (backend, store)
}

fn guard(store: &Store) -> SessionGuard {
    SessionGuard::new(store.clone(), SessionPolicy::PermissiveDemo, "index.html", "demo-token")
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()))
}

#[test]
fn test_failed_student_save_leaves_no_phantom() {
    let (backend, store) = flaky_store();
    let (mut admin, _) = AdminDashboard::open(
        &guard(&store),
        store.clone(),
        Page::for_dashboard(Role::Admin),
        ViewConfig::default(),
        clock(),
    )
    .expect("Failed to open admin dashboard");

    admin.dispatch(AdminAction::OpenCreateStudent).unwrap();
    backend.set_failing(true);
    let result = admin.dispatch(AdminAction::SubmitStudent(StudentForm {
        name: "Ghost Rider".to_string(),
        email: "ghost@example.com".to_string(),
        phone: "9876500001".to_string(),
        bus_id: None,
        fee_status: None,
    }));
    assert!(matches!(result, Err(DeskError::Storage(_))));
    assert_eq!(admin.students().len(), 3);
    assert!(admin.student_form().is_open());

    // A later unrelated write must not carry the rejected record along.
    backend.set_failing(false);
    let victim = admin.students()[2].id.clone();
    admin.dispatch(AdminAction::RequestDeleteStudent(victim)).unwrap();
    admin.dispatch(AdminAction::ConfirmDelete).unwrap();

    let stored: Vec<Student> = store.load().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|s| s.name != "Ghost Rider"));
    assert_eq!(admin.students(), stored.as_slice());
}

#[test]
fn test_failed_bus_delete_keeps_riders_attached() {
    let (backend, store) = flaky_store();
    let (mut admin, _) = AdminDashboard::open(
        &guard(&store),
        store.clone(),
        Page::for_dashboard(Role::Admin),
        ViewConfig::default(),
        clock(),
    )
    .expect("Failed to open admin dashboard");
    let bus_id = admin.buses()[0].id.clone();

    admin.dispatch(AdminAction::RequestDeleteBus(bus_id.clone())).unwrap();
    backend.set_failing(true);
    assert!(admin.dispatch(AdminAction::ConfirmDelete).is_err());

    assert_eq!(admin.buses().len(), 3);
    assert!(admin
        .students()
        .iter()
        .any(|s| s.bus_id.as_deref() == Some(bus_id.as_str())));
}

#[test]
fn test_failed_status_update_keeps_dialog_open() {
    let (backend, store) = flaky_store();
    let (mut incharge, _) = InchargeDashboard::open(
        &guard(&store),
        store.clone(),
        Page::for_dashboard(Role::Incharge),
        ViewConfig::default(),
        clock(),
    )
    .expect("Failed to open in-charge dashboard");
    let id = incharge.complaints()[0].id.clone();
    let before = incharge.complaints()[0].status;
    let target = if before == ComplaintStatus::Resolved {
        ComplaintStatus::Submitted
    } else {
        ComplaintStatus::Resolved
    };

    incharge.dispatch(InchargeAction::OpenComplaint(id.clone())).unwrap();
    backend.set_failing(true);
    let result = incharge.dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm {
        status: target,
        notes: "Fixed".to_string(),
    }));
    assert!(result.is_err());
    assert_eq!(incharge.complaints()[0].status, before);
    assert_eq!(incharge.open_complaint().map(|c| c.id.as_str()), Some(id.as_str()));

    let stored: Vec<Complaint> = store.load().unwrap();
    assert_eq!(stored.iter().find(|c| c.id == id).unwrap().status, before);
}

#[test]
fn test_failed_attendance_mark_is_not_remembered() {
    let (backend, store) = flaky_store();
    let (mut student, _) = StudentDashboard::open(
        &guard(&store),
        store.clone(),
        Page::for_dashboard(Role::Student),
        ViewConfig::default(),
        clock(),
    )
    .expect("Failed to open student dashboard");
    let before = student.attendance().len();

    backend.set_failing(true);
    assert!(student
        .dispatch(StudentAction::MarkAttendanceQr("BUS-101".to_string()))
        .is_err());
    assert_eq!(student.attendance().len(), before);

    backend.set_failing(false);
    student
        .dispatch(StudentAction::MarkAttendanceQr("BUS-102".to_string()))
        .unwrap();
    let stored: Vec<AttendanceEntry> = store.load().unwrap();
    assert_eq!(stored.len(), before + 1);
    assert_eq!(stored[0].raw.as_deref(), Some("BUS-102"));
}

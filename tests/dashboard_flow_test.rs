//! End-to-end flows across the student and bus in-charge dashboards

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use schoolbus_desk::config::ViewConfig;
use schoolbus_desk::controller::{
    ComplaintForm, FixedClock, InchargeAction, InchargeDashboard, Notice, StatusUpdateForm, StudentAction,
    StudentDashboard,
};
use schoolbus_desk::models::{AttendanceEntry, CaptureMode, Complaint, ComplaintStatus, Role, SessionRole};
use schoolbus_desk::session::{SessionGuard, SessionPolicy};
use schoolbus_desk::storage::Store;
use schoolbus_desk::view::filter::StatusFilter;
use schoolbus_desk::view::{Page, Region};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()))
}

fn guard(store: &Store, policy: SessionPolicy) -> SessionGuard {
    SessionGuard::new(store.clone(), policy, "index.html", "demo-token")
}

fn open_student(store: &Store) -> StudentDashboard {
    StudentDashboard::open(
        &guard(store, SessionPolicy::PermissiveDemo),
        store.clone(),
        Page::for_dashboard(Role::Student),
        ViewConfig::default(),
        clock(),
    )
    .expect("Failed to open student dashboard")
    .0
}

fn open_incharge(store: &Store) -> InchargeDashboard {
    InchargeDashboard::open(
        &guard(store, SessionPolicy::PermissiveDemo),
        store.clone(),
        Page::for_dashboard(Role::Incharge),
        ViewConfig::default(),
        clock(),
    )
    .expect("Failed to open in-charge dashboard")
    .0
}

#[test]
fn test_student_complaint_reaches_incharge() {
    let store = Store::in_memory();
    let mut student = open_student(&store);

    let outcome = student
        .dispatch(StudentAction::SubmitComplaint(ComplaintForm {
            subject: "AC not working".to_string(),
            description: "Bus 102 has no cooling".to_string(),
        }))
        .unwrap();
    assert_eq!(outcome.notices, vec![Notice::Success("Complaint submitted".to_string())]);
    assert_eq!(student.page().get(Region::TotalComplaintsSubmitted), Some("3"));

    let mut incharge = open_incharge(&store);
    assert_eq!(incharge.page().get(Region::PendingCount), Some("3"));
    let id = incharge.complaints()[0].id.clone();

    incharge.dispatch(InchargeAction::OpenComplaint(id.clone())).unwrap();
    let outcome = incharge
        .dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm {
            status: ComplaintStatus::InProgress,
            notes: "Mechanic booked".to_string(),
        }))
        .unwrap();
    assert_eq!(
        outcome.notices,
        vec![Notice::Success("Complaint status updated successfully".to_string())]
    );
    assert!(incharge.open_complaint().is_none());

    let stored: Vec<Complaint> = store.load().unwrap();
    let updated = stored.iter().find(|c| c.id == id).unwrap();
    assert_eq!(updated.status, ComplaintStatus::InProgress);
    assert_eq!(updated.notes.as_deref(), Some("Mechanic booked"));
    assert!(updated.updated_at.is_some());
    assert_eq!(incharge.page().get(Region::PendingCount), Some("2"));
    assert_eq!(incharge.page().get(Region::InProgressCount), Some("1"));
}

#[test]
fn test_status_filter_leaves_counts_alone() {
    let store = Store::in_memory();
    let mut incharge = open_incharge(&store);

    incharge
        .dispatch(InchargeAction::FilterStatus(StatusFilter::Only(ComplaintStatus::Resolved)))
        .unwrap();

    assert_eq!(incharge.page().get(Region::PendingCount), Some("2"));
    let list = incharge.page().get(Region::ComplaintsList).unwrap_or_default();
    assert!(!list.contains("Late Arrival"));
}

#[test]
fn test_empty_status_notes_are_cleared() {
    let store = Store::in_memory();
    let mut incharge = open_incharge(&store);
    let id = incharge.complaints()[1].id.clone();

    incharge.dispatch(InchargeAction::OpenComplaint(id.clone())).unwrap();
    incharge
        .dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm {
            status: ComplaintStatus::Resolved,
            notes: "   ".to_string(),
        }))
        .unwrap();

    let stored: Vec<Complaint> = store.load().unwrap();
    assert_eq!(stored.iter().find(|c| c.id == id).unwrap().notes, None);
}

#[test]
fn test_saving_without_open_complaint_warns() {
    let store = Store::in_memory();
    let mut incharge = open_incharge(&store);

    let outcome = incharge
        .dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm {
            status: ComplaintStatus::Resolved,
            notes: String::new(),
        }))
        .unwrap();
    assert!(matches!(outcome.notices.as_slice(), [Notice::Warning(_)]));
}

#[test]
fn test_attendance_marks_update_rate_and_respect_cap() {
    let store = Store::in_memory().with_attendance_cap(3);
    let mut student = open_student(&store);
    assert_eq!(student.page().get(Region::AttendanceRate), Some("50%"));

    let outcome = student
        .dispatch(StudentAction::MarkAttendanceQr("BUS-101|S1001".to_string()))
        .unwrap();
    assert_eq!(outcome.notices, vec![Notice::Success("Attendance marked (QR)".to_string())]);
    assert_eq!(student.page().get(Region::AttendanceRate), Some("67%"));

    student
        .dispatch(StudentAction::MarkAttendanceManual(" S1001 ".to_string()))
        .unwrap();

    let stored: Vec<AttendanceEntry> = store.load().unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].mode, CaptureMode::Manual);
    assert_eq!(stored[0].raw.as_deref(), Some("S1001"));
    assert_eq!(stored[1].mode, CaptureMode::Qr);
}

#[test]
fn test_blank_manual_code_is_a_field_error() {
    let store = Store::in_memory();
    let mut student = open_student(&store);

    let outcome = student
        .dispatch(StudentAction::MarkAttendanceManual("  ".to_string()))
        .unwrap();
    assert!(outcome.field_errors.iter().any(|e| e.field == "code"));
    assert_eq!(store.load::<AttendanceEntry>().unwrap().len(), 2);
}

#[test]
fn test_existing_session_skips_demo_notice() {
    let store = Store::in_memory();
    let guard = guard(&store, SessionPolicy::StrictRedirect);
    guard
        .persist(&SessionRole {
            role: Role::Student,
            token: "real-token".to_string(),
            user: None,
        })
        .unwrap();

    let (_, outcome) = StudentDashboard::open(
        &guard,
        store.clone(),
        Page::for_dashboard(Role::Student),
        ViewConfig::default(),
        clock(),
    )
    .unwrap();
    assert!(outcome.notices.is_empty());
    assert_eq!(guard.resume().unwrap(), Some(Role::Student.dashboard_page()));

    assert_eq!(guard.logout().unwrap(), "index.html");
    assert!(guard.current().unwrap().is_none());
}

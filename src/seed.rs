//! Demo dataset written on first run so the dashboards are never empty.
//!
//! Each collection is checked independently and only seeded when its key is
//! absent. Buses go first so the seeded students can reference them.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::Result;
use crate::models::{
    AttendanceEntry, AttendanceStatus, Bus, CaptureMode, Complaint, ComplaintStatus, FeeStatus, Notification, Student,
    NO_BUS,
};
use crate::storage::{Collection, Store};
use crate::utils::uid;

/// Collections written by one `ensure_seeded` call, in write order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: Vec<Collection>,
}

impl SeedReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.seeded.is_empty()
    }
}

/// Write the demo dataset into every absent collection.
pub fn ensure_seeded(store: &Store, now: DateTime<Utc>) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if !store.contains(Collection::Buses)? {
        store.save(&demo_buses())?;
        report.seeded.push(Collection::Buses);
    }

    if !store.contains(Collection::Students)? {
        let buses: Vec<Bus> = store.load()?;
        store.save(&demo_students(&buses))?;
        report.seeded.push(Collection::Students);
    }

    if !store.contains(Collection::Complaints)? {
        store.save(&demo_complaints(now))?;
        report.seeded.push(Collection::Complaints);
    }

    if !store.contains(Collection::Notifications)? {
        store.save::<Notification>(&[])?;
        report.seeded.push(Collection::Notifications);
    }

    if !store.contains(Collection::Attendance)? {
        store.save(&demo_attendance(now))?;
        report.seeded.push(Collection::Attendance);
    }

    if !report.is_noop() {
        info!(collections = ?report.seeded, "seeded demo data");
    }
    Ok(report)
}

fn demo_buses() -> Vec<Bus> {
    [
        ("BUS-101", "North — Central", 40, Some("Mr. Ramesh")),
        ("BUS-102", "East — West", 35, Some("Ms. Priya")),
        ("BUS-103", "South — North", 45, None),
    ]
    .into_iter()
    .map(|(number, route, capacity, incharge)| Bus {
        id: uid("b_"),
        bus_number: number.to_string(),
        route: route.to_string(),
        capacity,
        incharge_name: incharge.map(str::to_string),
    })
    .collect()
}

/// Student `i` rides bus `i` when that bus exists.
fn demo_students(buses: &[Bus]) -> Vec<Student> {
    [
        ("S1001", "Aishwarya Kumar", "aish@example.com", "9876543210", FeeStatus::Paid),
        ("S1002", "Vikram Singh", "vikram@example.com", "9876501234", FeeStatus::Due),
        ("S1003", "Neha Patel", "neha@example.com", "9876512345", FeeStatus::Overdue),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (code, name, email, phone, fee_status))| {
        let bus = buses.get(i);
        Student {
            id: uid("s_"),
            student_id: code.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            bus_id: bus.map(|b| b.id.clone()),
            bus_number: bus.map_or_else(|| NO_BUS.to_string(), |b| b.bus_number.clone()),
            fee_status,
        }
    })
    .collect()
}

fn demo_complaints(now: DateTime<Utc>) -> Vec<Complaint> {
    [
        ("Late Arrival", "Bus arrived late on Monday"),
        ("Driver Behavior", "Rash driving reported"),
    ]
    .into_iter()
    .map(|(subject, description)| Complaint {
        id: uid("c_"),
        subject: subject.to_string(),
        description: description.to_string(),
        status: ComplaintStatus::Submitted,
        created_at: now,
        notes: None,
        updated_at: None,
    })
    .collect()
}

fn demo_attendance(now: DateTime<Utc>) -> Vec<AttendanceEntry> {
    // newest first
    vec![
        AttendanceEntry {
            ts: now - Duration::days(1),
            status: AttendanceStatus::Absent,
            mode: CaptureMode::Demo,
            raw: None,
        },
        AttendanceEntry {
            ts: now - Duration::days(2),
            status: AttendanceStatus::Present,
            mode: CaptureMode::Demo,
            raw: None,
        },
    ]
}

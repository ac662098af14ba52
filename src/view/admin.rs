//! Admin dashboard sections.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use tracing::debug;

use super::filter::filter_students;
use super::html::{escape_html, fee_badge};
use super::paginate::{paginate, PageWindow};
use super::time::{last_updated_label, relative_time};
use super::{Page, Region, ViewBindings};
use crate::config::ViewConfig;
use crate::models::{Bus, Complaint, Student};

/// Header counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub students: usize,
    pub buses: usize,
    pub complaints: usize,
    pub defaulters: usize,
}

impl AdminStats {
    #[must_use]
    pub fn compute(students: &[Student], buses: &[Bus], complaints: &[Complaint]) -> Self {
        Self {
            students: students.len(),
            buses: buses.len(),
            complaints: complaints.len(),
            defaulters: students.iter().filter(|s| s.is_defaulter()).count(),
        }
    }
}

/// Snapshot of the collections the admin dashboard shows
#[derive(Debug, Clone, Copy)]
pub struct AdminSnapshot<'a> {
    pub students: &'a [Student],
    pub buses: &'a [Bus],
    pub complaints: &'a [Complaint],
}

/// Transient list state of the students table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentListState {
    pub search: String,
    pub page: usize,
}

impl Default for StudentListState {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
        }
    }
}

#[must_use]
pub fn notify_defaulters_button(defaulters: usize) -> String {
    let disabled = if defaulters == 0 { " disabled" } else { "" };
    format!(
        "<button class=\"btn btn-warning\" data-action=\"notify-defaulters\"{disabled}>Notify Defaulters ({defaulters})</button>"
    )
}

#[must_use]
pub fn recent_complaints(complaints: &[Complaint], limit: usize, now: DateTime<Utc>) -> String {
    if complaints.is_empty() {
        return "<div class=\"text-muted small\">No recent complaints</div>".to_string();
    }
    let mut out = String::new();
    for c in complaints.iter().take(limit) {
        let _ = write!(
            out,
            "<div class=\"list-group-item\"><div class=\"fw-semibold\">{}</div><div class=\"small text-muted\">{}</div><div class=\"text-end small text-muted\">{}</div></div>",
            escape_html(&c.subject),
            escape_html(&c.description),
            relative_time(c.created_at, now)
        );
    }
    out
}

/// One table row per student on the current page; defaulters get a notify button.
#[must_use]
pub fn student_rows(students: &[&Student]) -> String {
    if students.is_empty() {
        return "<tr><td colspan=\"6\" class=\"text-center text-muted\">No students found</td></tr>".to_string();
    }
    let mut out = String::new();
    for s in students {
        let id = escape_html(&s.id);
        let notify = if s.is_defaulter() {
            format!("<button class=\"btn btn-sm btn-warning\" data-action=\"notify-student\" data-id=\"{id}\">Notify</button>")
        } else {
            String::new()
        };
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"text-end\">{notify}\
             <button class=\"btn btn-sm btn-outline-primary\" data-action=\"edit-student\" data-id=\"{id}\">Edit</button>\
             <button class=\"btn btn-sm btn-outline-danger\" data-action=\"delete-student\" data-id=\"{id}\">Delete</button></td></tr>",
            escape_html(&s.student_id),
            escape_html(&s.name),
            escape_html(&s.email),
            escape_html(&s.bus_number),
            fee_badge(s.fee_status),
        );
    }
    out
}

#[must_use]
pub fn pagination_controls(window: &PageWindow) -> String {
    let mut out = String::new();
    for p in 1..=window.pages {
        let active = if p == window.page { " active" } else { "" };
        let _ = write!(
            out,
            "<li class=\"page-item{active}\"><a class=\"page-link\" href=\"#\" data-page=\"{p}\">{p}</a></li>"
        );
    }
    out
}

#[must_use]
pub fn bus_rows(buses: &[Bus]) -> String {
    if buses.is_empty() {
        return "<tr><td colspan=\"6\" class=\"text-center text-muted\">No buses configured</td></tr>".to_string();
    }
    let mut out = String::new();
    for b in buses {
        let id = escape_html(&b.id);
        let capacity = if b.capacity == 0 {
            crate::models::NO_BUS.to_string()
        } else {
            b.capacity.to_string()
        };
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><span class=\"badge bg-success\">Active</span></td><td class=\"text-end\">\
             <button class=\"btn btn-sm btn-outline-primary\" data-action=\"edit-bus\" data-id=\"{id}\">Edit</button>\
             <button class=\"btn btn-sm btn-outline-danger\" data-action=\"delete-bus\" data-id=\"{id}\">Delete</button></td></tr>",
            escape_html(&b.bus_number),
            escape_html(&b.route),
            escape_html(&capacity),
            escape_html(b.incharge_name.as_deref().unwrap_or("Not Assigned")),
        );
    }
    out
}

/// Options of the bus select in the student form; `selected` marks the current bus.
#[must_use]
pub fn bus_options(buses: &[Bus], selected: Option<&str>) -> String {
    let mut out = String::from("<option value=\"\">Select Bus</option>");
    for b in buses {
        let sel = if selected == Some(b.id.as_str()) { " selected" } else { "" };
        let _ = write!(
            out,
            "<option value=\"{}\"{sel}>{} — {}</option>",
            escape_html(&b.id),
            escape_html(&b.bus_number),
            escape_html(&b.route)
        );
    }
    out
}

/// Recipient options of the compose dialog
#[must_use]
pub fn compose_recipients(students: &[Student], preselected: &[String]) -> String {
    let mut out = String::new();
    for s in students {
        let sel = if preselected.contains(&s.id) { " selected" } else { "" };
        let _ = write!(
            out,
            "<option value=\"{}\"{sel}>{} ({})</option>",
            escape_html(&s.id),
            escape_html(&s.name),
            escape_html(&s.student_id)
        );
    }
    out
}

/// Draw every admin section into `page`. Returns the page window actually shown.
pub fn render(
    page: &mut Page,
    bindings: &ViewBindings,
    snapshot: AdminSnapshot<'_>,
    list: &StudentListState,
    preselected: &[String],
    settings: &ViewConfig,
    now: DateTime<Utc>,
) -> PageWindow {
    let stats = AdminStats::compute(snapshot.students, snapshot.buses, snapshot.complaints);
    let mut put = |region: Region, markup: String| {
        if bindings.is_bound(region) {
            page.fill(region, markup);
        }
    };

    put(Region::TotalStudents, stats.students.to_string());
    put(Region::TotalBuses, stats.buses.to_string());
    put(Region::TotalComplaints, stats.complaints.to_string());
    put(Region::FeeDefaulters, stats.defaulters.to_string());
    put(Region::NotifyDefaultersButton, notify_defaulters_button(stats.defaulters));
    put(
        Region::RecentComplaints,
        recent_complaints(snapshot.complaints, settings.recent_complaints_limit, now),
    );

    let filtered = filter_students(snapshot.students, &list.search);
    let window = paginate(filtered.len(), list.page, settings.student_page_size);
    put(Region::StudentsTable, student_rows(window.slice(&filtered)));
    put(Region::StudentsPagination, pagination_controls(&window));
    put(Region::StudentsInfo, window.info_label("No students"));

    put(Region::BusesTable, bus_rows(snapshot.buses));
    put(Region::BusSelect, bus_options(snapshot.buses, None));
    put(Region::ComposeRecipients, compose_recipients(snapshot.students, preselected));
    put(Region::LastUpdated, last_updated_label(now));

    debug!(
        students = stats.students,
        shown = window.shown(),
        page = window.page,
        "rendered admin dashboard"
    );
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComplaintStatus, FeeStatus, Role};
    use chrono::Duration;

    fn student(n: usize, fee: FeeStatus) -> Student {
        Student {
            id: format!("s_{n}"),
            student_id: format!("S{}", 1000 + n),
            name: format!("Student {n}"),
            email: format!("s{n}@example.com"),
            phone: String::new(),
            bus_id: None,
            bus_number: crate::models::NO_BUS.to_string(),
            fee_status: fee,
        }
    }

    #[test]
    fn test_notify_button_disabled_without_defaulters() {
        assert!(notify_defaulters_button(0).contains("disabled"));
        let label = notify_defaulters_button(2);
        assert!(label.contains("Notify Defaulters (2)"));
        assert!(!label.contains("disabled"));
    }

    #[test]
    fn test_student_rows_escape_and_notify_only_defaulters() {
        let mut evil = student(1, FeeStatus::Paid);
        evil.name = "<script>x</script>".to_string();
        let due = student(2, FeeStatus::Due);
        let rows = student_rows(&[&evil, &due]);
        assert!(!rows.contains("<script>"));
        assert!(rows.contains("&lt;script&gt;"));
        assert_eq!(rows.matches("notify-student").count(), 1);
    }

    #[test]
    fn test_render_fills_bound_regions_and_clamps_page() {
        let students: Vec<Student> = (1..=12).map(|n| student(n, FeeStatus::Paid)).collect();
        let complaints = vec![Complaint {
            id: "c_1".to_string(),
            subject: "Late Arrival".to_string(),
            description: "Bus arrived late".to_string(),
            status: ComplaintStatus::Submitted,
            created_at: Utc::now() - Duration::minutes(5),
            notes: None,
            updated_at: None,
        }];
        let mut page = Page::for_dashboard(Role::Admin);
        let bindings = ViewBindings::resolve(Role::Admin, &page).unwrap();
        let list = StudentListState {
            search: String::new(),
            page: 7,
        };
        let snapshot = AdminSnapshot {
            students: &students,
            buses: &[],
            complaints: &complaints,
        };
        let window = render(&mut page, &bindings, snapshot, &list, &[], &ViewConfig::default(), Utc::now());
        assert_eq!(window.page, 2);
        assert_eq!(page.get(Region::StudentsInfo), Some("Showing 9-12 of 12"));
        assert_eq!(page.get(Region::TotalStudents), Some("12"));
        assert!(page.get(Region::RecentComplaints).unwrap().contains("5m"));
        assert!(page.get(Region::BusesTable).unwrap().contains("No buses configured"));
    }
}

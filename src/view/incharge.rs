//! Bus in-charge dashboard sections.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::fmt::Write as _;
use tracing::debug;

use super::filter::{attendance_code, attendance_name, filter_attendance, filter_complaints, StatusFilter};
use super::html::{attendance_badge, complaint_badge, escape_html};
use super::time::{last_sync_label, local_date, local_time};
use super::{Page, Region, ViewBindings};
use crate::config::ViewConfig;
use crate::models::{AttendanceEntry, AttendanceStatus, Complaint, ComplaintStatus};

/// Complaint counters over the whole collection, ignoring the status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub submitted: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn compute(complaints: &[Complaint]) -> Self {
        complaints.iter().fold(Self::default(), |mut acc, c| {
            match c.status {
                ComplaintStatus::Submitted => acc.submitted += 1,
                ComplaintStatus::InProgress => acc.in_progress += 1,
                ComplaintStatus::Resolved => acc.resolved += 1,
            }
            acc
        })
    }
}

/// Filters of the in-charge dashboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InchargeFilters {
    pub status: StatusFilter,
    /// Local calendar date; `None` shows every day
    pub date: Option<NaiveDate>,
    pub search: String,
}

impl InchargeFilters {
    /// Filters as the dashboard opens: all statuses, today's attendance
    #[must_use]
    pub fn for_today(now: DateTime<Utc>) -> Self {
        Self {
            date: Some(now.with_timezone(&Local).date_naive()),
            ..Self::default()
        }
    }
}

#[must_use]
pub fn complaint_cards(complaints: &[&Complaint]) -> String {
    if complaints.is_empty() {
        return "<div class=\"text-center text-muted py-4\">No complaints found</div>".to_string();
    }
    let mut out = String::new();
    for c in complaints {
        let notes = c
            .notes
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(|n| format!("<div class=\"mt-2 small\"><strong>Notes:</strong> {}</div>", escape_html(n)))
            .unwrap_or_default();
        let _ = write!(
            out,
            "<div class=\"complaint-card\"><div class=\"complaint-header\"><div><h6 class=\"mb-1 fw-semibold\">{}</h6>\
             <p class=\"mb-0 text-muted small\">{}</p></div>{}</div><div class=\"complaint-meta\"><span>{}</span>\
             <span class=\"ms-3\">{}</span><span class=\"ms-3\">#{}</span></div>{notes}\
             <div class=\"mt-3\"><button class=\"btn btn-sm btn-outline-primary\" data-action=\"open-complaint\" data-id=\"{}\">Update Status</button></div></div>",
            escape_html(&c.subject),
            escape_html(&c.description),
            complaint_badge(c.status),
            local_date(c.created_at),
            local_time(c.created_at),
            escape_html(&c.id),
            escape_html(&c.id),
        );
    }
    out
}

/// Present and absent totals of the filtered attendance, before truncation
#[must_use]
pub fn presence_counts(entries: &[&AttendanceEntry]) -> (usize, usize) {
    let present = entries
        .iter()
        .filter(|e| e.status == AttendanceStatus::Present)
        .count();
    (present, entries.len() - present)
}

#[must_use]
pub fn attendance_rows(entries: &[&AttendanceEntry], limit: usize) -> String {
    if entries.is_empty() {
        return "<tr><td colspan=\"6\" class=\"text-center text-muted py-4\">No attendance records found</td></tr>"
            .to_string();
    }
    let mut out = String::new();
    for e in entries.iter().take(limit) {
        let _ = write!(
            out,
            "<tr><td><strong>{}</strong></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><span class=\"badge bg-info\">{}</span></td></tr>",
            attendance_code(e),
            attendance_name(e),
            local_date(e.ts),
            local_time(e.ts),
            attendance_badge(e.status),
            e.mode.label(),
        );
    }
    out
}

/// Present marks captured on the local calendar day of `now`
#[must_use]
pub fn present_today(entries: &[AttendanceEntry], now: DateTime<Utc>) -> usize {
    let today = now.with_timezone(&Local).date_naive();
    entries
        .iter()
        .filter(|e| e.status == AttendanceStatus::Present && e.ts.with_timezone(&Local).date_naive() == today)
        .count()
}

pub fn render(
    page: &mut Page,
    bindings: &ViewBindings,
    complaints: &[Complaint],
    attendance: &[AttendanceEntry],
    filters: &InchargeFilters,
    settings: &ViewConfig,
    now: DateTime<Utc>,
) {
    let mut put = |region: Region, markup: String| {
        if bindings.is_bound(region) {
            page.fill(region, markup);
        }
    };

    let counts = StatusCounts::compute(complaints);
    put(Region::PendingCount, counts.submitted.to_string());
    put(Region::InProgressCount, counts.in_progress.to_string());
    put(Region::ResolvedCount, counts.resolved.to_string());
    put(Region::PendingComplaints, counts.submitted.to_string());

    let shown = filter_complaints(complaints, filters.status);
    put(Region::ComplaintsList, complaint_cards(&shown));

    let marks = filter_attendance(attendance, filters.date, &filters.search);
    let (present, absent) = presence_counts(&marks);
    put(Region::PresentCount, present.to_string());
    put(Region::AbsentCount, absent.to_string());
    put(Region::AttendanceTable, attendance_rows(&marks, settings.incharge_attendance_limit));
    put(Region::PresentToday, present_today(attendance, now).to_string());
    put(Region::LastSync, last_sync_label(now));

    debug!(complaints = shown.len(), attendance = marks.len(), "rendered incharge dashboard");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaptureMode, Role};
    use chrono::Duration;

    fn complaint(id: &str, status: ComplaintStatus) -> Complaint {
        Complaint {
            id: id.to_string(),
            subject: format!("Subject {id}"),
            description: "desc".to_string(),
            status,
            created_at: Utc::now(),
            notes: None,
            updated_at: None,
        }
    }

    fn mark(ts: DateTime<Utc>, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry {
            ts,
            status,
            mode: CaptureMode::Manual,
            raw: None,
        }
    }

    #[test]
    fn test_counts_ignore_status_filter() {
        let complaints = vec![
            complaint("c_1", ComplaintStatus::Submitted),
            complaint("c_2", ComplaintStatus::Resolved),
            complaint("c_3", ComplaintStatus::Submitted),
        ];
        let mut page = Page::for_dashboard(Role::Incharge);
        let bindings = ViewBindings::resolve(Role::Incharge, &page).unwrap();
        let filters = InchargeFilters {
            status: StatusFilter::Only(ComplaintStatus::Resolved),
            ..InchargeFilters::default()
        };
        render(&mut page, &bindings, &complaints, &[], &filters, &ViewConfig::default(), Utc::now());
        assert_eq!(page.get(Region::PendingCount), Some("2"));
        assert_eq!(page.get(Region::ResolvedCount), Some("1"));
        let list = page.get(Region::ComplaintsList).unwrap();
        assert!(list.contains("Subject c_2"));
        assert!(!list.contains("Subject c_1"));
    }

    #[test]
    fn test_attendance_rows_truncate_after_counting() {
        let now = Utc::now();
        let entries: Vec<AttendanceEntry> = (0..60)
            .map(|i| mark(now - Duration::seconds(i), AttendanceStatus::Present))
            .collect();
        let refs: Vec<&AttendanceEntry> = entries.iter().collect();
        assert_eq!(presence_counts(&refs), (60, 0));
        assert_eq!(attendance_rows(&refs, 50).matches("<tr>").count(), 50);
    }

    #[test]
    fn test_present_today_counts_only_present_marks_of_today() {
        let now = Utc::now();
        let entries = vec![
            mark(now, AttendanceStatus::Present),
            mark(now, AttendanceStatus::Absent),
            mark(now - Duration::days(3), AttendanceStatus::Present),
        ];
        assert_eq!(present_today(&entries, now), 1);
    }

    #[test]
    fn test_notes_are_escaped() {
        let mut c = complaint("c_9", ComplaintStatus::InProgress);
        c.notes = Some("<b>called driver</b>".to_string());
        let html = complaint_cards(&[&c]);
        assert!(html.contains("&lt;b&gt;called driver"));
        assert!(html.contains("bg-info"));
    }
}

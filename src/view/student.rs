//! Student dashboard sections.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;
use tracing::debug;

use super::html::{attendance_badge, complaint_badge, escape_html};
use super::time::{last_sync_label, local_date, local_time};
use super::{Page, Region, ViewBindings};
use crate::config::ViewConfig;
use crate::models::{AttendanceEntry, AttendanceStatus, Complaint};

/// Rounded share of Present marks; 0 when there are none.
#[must_use]
pub fn attendance_rate(entries: &[AttendanceEntry]) -> u32 {
    if entries.is_empty() {
        return 0;
    }
    let present = entries
        .iter()
        .filter(|e| e.status == AttendanceStatus::Present)
        .count();
    let pct = (present * 100 + entries.len() / 2) / entries.len();
    u32::try_from(pct).unwrap_or(100)
}

#[must_use]
pub fn attendance_history(entries: &[AttendanceEntry], limit: usize) -> String {
    if entries.is_empty() {
        return "<tr><td colspan=\"4\" class=\"text-muted\">No attendance recorded yet.</td></tr>".to_string();
    }
    let mut out = String::new();
    for e in entries.iter().take(limit) {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            local_date(e.ts),
            local_time(e.ts),
            attendance_badge(e.status),
            e.mode.label()
        );
    }
    out
}

#[must_use]
pub fn complaint_items(complaints: &[Complaint]) -> String {
    if complaints.is_empty() {
        return "<div class=\"text-muted\">You have not submitted any complaints.</div>".to_string();
    }
    let mut out = String::new();
    for c in complaints {
        let _ = write!(
            out,
            "<div class=\"list-group-item\"><div class=\"fw-semibold\">{}</div><small class=\"text-muted\">{}</small>\
             <div class=\"mt-1\"><small class=\"text-muted\">{}</small></div><div class=\"text-end\">{}</div></div>",
            escape_html(&c.subject),
            escape_html(&c.description),
            c.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            complaint_badge(c.status)
        );
    }
    out
}

pub fn render(
    page: &mut Page,
    bindings: &ViewBindings,
    attendance: &[AttendanceEntry],
    complaints: &[Complaint],
    settings: &ViewConfig,
    now: DateTime<Utc>,
) {
    let mut put = |region: Region, markup: String| {
        if bindings.is_bound(region) {
            page.fill(region, markup);
        }
    };

    put(Region::AttendanceHistory, attendance_history(attendance, settings.history_limit));
    put(Region::AttendanceRate, format!("{}%", attendance_rate(attendance)));
    put(Region::ComplaintsList, complaint_items(complaints));
    put(Region::TotalComplaintsSubmitted, complaints.len().to_string());
    put(Region::LastSync, last_sync_label(now));

    debug!(attendance = attendance.len(), complaints = complaints.len(), "rendered student dashboard");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CaptureMode;
    use chrono::Duration;

    fn mark(status: AttendanceStatus, age_days: i64) -> AttendanceEntry {
        AttendanceEntry {
            ts: Utc::now() - Duration::days(age_days),
            status,
            mode: CaptureMode::Demo,
            raw: None,
        }
    }

    #[test]
    fn test_rate_is_zero_when_empty() {
        assert_eq!(attendance_rate(&[]), 0);
    }

    #[test]
    fn test_rate_rounds_half_up() {
        let entries = vec![
            mark(AttendanceStatus::Present, 1),
            mark(AttendanceStatus::Absent, 2),
        ];
        assert_eq!(attendance_rate(&entries), 50);
        let thirds = vec![
            mark(AttendanceStatus::Present, 1),
            mark(AttendanceStatus::Present, 2),
            mark(AttendanceStatus::Absent, 3),
        ];
        assert_eq!(attendance_rate(&thirds), 67);
    }

    #[test]
    fn test_history_is_truncated() {
        let entries: Vec<AttendanceEntry> = (0..30).map(|i| mark(AttendanceStatus::Present, i)).collect();
        assert_eq!(attendance_history(&entries, 20).matches("<tr>").count(), 20);
    }
}

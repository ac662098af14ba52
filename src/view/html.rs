//! Markup helpers: escaping and status badges.

use crate::models::{AttendanceStatus, ComplaintStatus, FeeStatus};

/// Escape text for embedding in element content or quoted attributes.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub const fn fee_badge_class(status: FeeStatus) -> &'static str {
    match status {
        FeeStatus::Paid => "badge-paid",
        FeeStatus::Due => "badge-due",
        FeeStatus::Overdue => "badge-overdue",
    }
}

#[must_use]
pub fn fee_badge(status: FeeStatus) -> String {
    format!("<span class=\"badge {}\">{}</span>", fee_badge_class(status), status.label())
}

#[must_use]
pub const fn complaint_badge_class(status: ComplaintStatus) -> &'static str {
    match status {
        ComplaintStatus::Submitted => "bg-warning",
        ComplaintStatus::InProgress => "bg-info",
        ComplaintStatus::Resolved => "bg-success",
    }
}

#[must_use]
pub fn complaint_badge(status: ComplaintStatus) -> String {
    format!(
        "<span class=\"badge {}\">{}</span>",
        complaint_badge_class(status),
        status.label()
    )
}

#[must_use]
pub fn attendance_badge(status: AttendanceStatus) -> String {
    let class = match status {
        AttendanceStatus::Present => "bg-success",
        AttendanceStatus::Absent => "bg-secondary",
    };
    format!("<span class=\"badge {class}\">{}</span>", status.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<img src=x onerror='a()'>"),
            "&lt;img src&#x3D;x onerror&#x3D;&#39;a()&#39;&gt;"
        );
        assert_eq!(escape_html("Tom & \"Jerry\" / `x`"), "Tom &amp; &quot;Jerry&quot; &#x2F; &#x60;x&#x60;");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(escape_html("North — Central"), "North — Central");
    }

    #[test]
    fn test_three_way_colour_coding() {
        assert_ne!(fee_badge_class(FeeStatus::Due), fee_badge_class(FeeStatus::Overdue));
        assert_eq!(complaint_badge(ComplaintStatus::InProgress), "<span class=\"badge bg-info\">In Progress</span>");
    }
}

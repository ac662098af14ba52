//! List filters applied before pagination. All of them preserve order.

use chrono::{Local, NaiveDate};
use std::str::FromStr;

use crate::models::{AttendanceEntry, Complaint, ComplaintStatus, Student};

/// Case-insensitive substring match; an empty term matches everything.
#[must_use]
pub fn matches_search(text: &str, term: &str) -> bool {
    let term = term.trim();
    term.is_empty() || text.to_lowercase().contains(&term.to_lowercase())
}

#[must_use]
pub fn filter_students<'a>(students: &'a [Student], term: &str) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|s| matches_search(&s.search_text(), term))
        .collect()
}

/// Complaint status filter; `All` disables filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ComplaintStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn accepts(self, status: ComplaintStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

#[must_use]
pub fn filter_complaints(complaints: &[Complaint], filter: StatusFilter) -> Vec<&Complaint> {
    complaints.iter().filter(|c| filter.accepts(c.status)).collect()
}

/// Display code the in-charge roster derives from an entry's timestamp.
///
/// Entries carry no student reference, so the roster labels them from the
/// trailing digits of the capture time in milliseconds.
#[must_use]
pub fn attendance_code(entry: &AttendanceEntry) -> String {
    let ms = entry.ts.timestamp_millis().unsigned_abs();
    format!("STU-{:04}", ms % 10_000)
}

#[must_use]
pub fn attendance_name(entry: &AttendanceEntry) -> String {
    let ms = entry.ts.timestamp_millis().unsigned_abs();
    format!("Student {:03}", ms % 1_000)
}

/// Entries captured on `date` (local calendar) and matching `term` against
/// their roster code or name.
#[must_use]
pub fn filter_attendance<'a>(
    entries: &'a [AttendanceEntry],
    date: Option<NaiveDate>,
    term: &str,
) -> Vec<&'a AttendanceEntry> {
    entries
        .iter()
        .filter(|e| date.map_or(true, |d| e.ts.with_timezone(&Local).date_naive() == d))
        .filter(|e| {
            matches_search(&attendance_code(e), term) || matches_search(&attendance_name(e), term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::models::{AttendanceStatus, CaptureMode};

    #[test]
    fn test_search_is_case_insensitive() {
        assert!(matches_search("S1002 Vikram Singh vikram@example.com BUS-102", "vIkRaM"));
        assert!(matches_search("anything", ""));
        assert!(matches_search("anything", "   "));
        assert!(!matches_search("Neha", "raj"));
    }

    #[test]
    fn test_status_filter_parses_all() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "In Progress".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(ComplaintStatus::InProgress))
        );
    }

    #[test]
    fn test_attendance_roster_labels() {
        let entry = AttendanceEntry {
            ts: Utc.timestamp_millis_opt(1_700_000_012_345).unwrap(),
            status: AttendanceStatus::Present,
            mode: CaptureMode::Qr,
            raw: None,
        };
        assert_eq!(attendance_code(&entry), "STU-2345");
        assert_eq!(attendance_name(&entry), "Student 345");
        assert_eq!(filter_attendance(std::slice::from_ref(&entry), None, "stu-2345").len(), 1);
        assert!(filter_attendance(std::slice::from_ref(&entry), None, "stu-9").is_empty());
    }
}

//! View rendering.
//!
//! Renderers are pure: they take snapshots of collections plus transient UI
//! state and return markup. Output lands in a [`Page`], which holds one slot
//! per [`Region`] the host actually provides. Bindings are resolved once per
//! dashboard: a missing required region is an error, a missing optional one
//! is skipped on every render.

pub mod admin;
pub mod filter;
pub mod html;
pub mod incharge;
pub mod paginate;
pub mod student;
pub mod time;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::error::{DeskError, Result};
use crate::models::Role;

/// Addressable fragments of the dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    // admin
    TotalStudents,
    TotalBuses,
    TotalComplaints,
    FeeDefaulters,
    NotifyDefaultersButton,
    RecentComplaints,
    StudentsTable,
    StudentsPagination,
    StudentsInfo,
    BusesTable,
    BusSelect,
    ComposeRecipients,
    LastUpdated,
    // incharge
    PendingCount,
    InProgressCount,
    ResolvedCount,
    ComplaintsList,
    AttendanceTable,
    PresentCount,
    AbsentCount,
    PresentToday,
    PendingComplaints,
    // student
    AttendanceHistory,
    AttendanceRate,
    TotalComplaintsSubmitted,
    // shared
    LastSync,
}

impl Region {
    /// Element id used when the page is serialized as HTML
    #[must_use]
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::TotalStudents => "totalStudents",
            Self::TotalBuses => "totalBuses",
            Self::TotalComplaints => "pendingComplaints",
            Self::FeeDefaulters => "feeDefaulters",
            Self::NotifyDefaultersButton => "notifyDefaultersBtn",
            Self::RecentComplaints => "recentComplaints",
            Self::StudentsTable => "studentsTableBody",
            Self::StudentsPagination => "studentsPagination",
            Self::StudentsInfo => "studentsInfo",
            Self::BusesTable => "busesTableBody",
            Self::BusSelect => "studentBusSelect",
            Self::ComposeRecipients => "composeRecipients",
            Self::LastUpdated => "lastUpdated",
            Self::PendingCount => "pendingCount",
            Self::InProgressCount => "inProgressCount",
            Self::ResolvedCount => "resolvedCount",
            Self::ComplaintsList => "complaintsList",
            Self::AttendanceTable => "attendanceTableBody",
            Self::PresentCount => "presentCount",
            Self::AbsentCount => "absentCount",
            Self::PresentToday => "presentToday",
            Self::PendingComplaints => "pendingComplaintsStat",
            Self::AttendanceHistory => "attendanceHistory",
            Self::AttendanceRate => "attendanceRate",
            Self::TotalComplaintsSubmitted => "totalComplaints",
            Self::LastSync => "lastSync",
        }
    }
}

/// Regions a dashboard cannot work without, and those it fills when present.
#[must_use]
pub const fn regions_for(role: Role) -> (&'static [Region], &'static [Region]) {
    match role {
        Role::Admin => (
            &[Region::StudentsTable, Region::BusesTable],
            &[
                Region::TotalStudents,
                Region::TotalBuses,
                Region::TotalComplaints,
                Region::FeeDefaulters,
                Region::NotifyDefaultersButton,
                Region::RecentComplaints,
                Region::StudentsPagination,
                Region::StudentsInfo,
                Region::BusSelect,
                Region::ComposeRecipients,
                Region::LastUpdated,
            ],
        ),
        Role::Incharge => (
            &[Region::ComplaintsList, Region::AttendanceTable],
            &[
                Region::PendingCount,
                Region::InProgressCount,
                Region::ResolvedCount,
                Region::PresentCount,
                Region::AbsentCount,
                Region::PresentToday,
                Region::PendingComplaints,
                Region::LastSync,
            ],
        ),
        Role::Student => (
            &[Region::AttendanceHistory, Region::ComplaintsList],
            &[Region::AttendanceRate, Region::TotalComplaintsSubmitted, Region::LastSync],
        ),
    }
}

/// Rendered output, one slot per provided region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    slots: BTreeMap<Region, Option<String>>,
}

impl Page {
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        Self {
            slots: regions.into_iter().map(|r| (r, None)).collect(),
        }
    }

    /// A page providing every region the dashboard knows about
    #[must_use]
    pub fn for_dashboard(role: Role) -> Self {
        let (required, optional) = regions_for(role);
        Self::new(required.iter().chain(optional).copied())
    }

    #[must_use]
    pub fn provides(&self, region: Region) -> bool {
        self.slots.contains_key(&region)
    }

    /// Rendered content of a region, if provided and rendered
    #[must_use]
    pub fn get(&self, region: Region) -> Option<&str> {
        self.slots.get(&region).and_then(|s| s.as_deref())
    }

    /// Write into a region; silently ignored if the page does not provide it.
    pub fn fill(&mut self, region: Region, markup: String) {
        if let Some(slot) = self.slots.get_mut(&region) {
            *slot = Some(markup);
        }
    }

    /// Serialize every rendered region as a standalone HTML document.
    #[must_use]
    pub fn to_document(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<!doctype html>");
        let _ = writeln!(
            out,
            "<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
            html::escape_html(title)
        );
        for (region, markup) in &self.slots {
            if let Some(markup) = markup {
                let _ = writeln!(out, "<div id=\"{}\">{markup}</div>", region.element_id());
            }
        }
        out.push_str("</body></html>\n");
        out
    }
}

/// Regions of a page resolved against a dashboard's needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewBindings {
    role: Role,
    bound: BTreeSet<Region>,
}

impl ViewBindings {
    /// Fails with the first required region the page lacks.
    pub fn resolve(role: Role, page: &Page) -> Result<Self> {
        let (required, optional) = regions_for(role);
        if let Some(missing) = required.iter().find(|r| !page.provides(**r)) {
            return Err(DeskError::MissingBinding(*missing, role.as_str()));
        }
        let bound = required
            .iter()
            .chain(optional)
            .copied()
            .filter(|r| page.provides(*r))
            .collect();
        Ok(Self { role, bound })
    }

    #[must_use]
    pub fn is_bound(&self, region: Region) -> bool {
        self.bound.contains(&region)
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fails_fast_on_missing_required_region() {
        let page = Page::new([Region::StudentsTable]);
        let err = ViewBindings::resolve(Role::Admin, &page).unwrap_err();
        assert!(matches!(err, DeskError::MissingBinding(Region::BusesTable, "admin")));
    }

    #[test]
    fn test_optional_regions_are_skipped() {
        let mut page = Page::new([Region::StudentsTable, Region::BusesTable]);
        let bindings = ViewBindings::resolve(Role::Admin, &page).unwrap();
        assert!(!bindings.is_bound(Region::StudentsInfo));
        page.fill(Region::StudentsInfo, "x".to_string());
        assert_eq!(page.get(Region::StudentsInfo), None);
    }

    #[test]
    fn test_document_contains_rendered_regions_only() {
        let mut page = Page::for_dashboard(Role::Student);
        page.fill(Region::AttendanceRate, "50%".to_string());
        let doc = page.to_document("Student <Dashboard>");
        assert!(doc.contains("<div id=\"attendanceRate\">50%</div>"));
        assert!(!doc.contains("attendanceHistory"));
        assert!(doc.contains("Student &lt;Dashboard&gt;"));
    }
}

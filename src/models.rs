//! Data models for the school-bus desk
//!
//! Flat records stored as JSON in the persistent store. There is no foreign
//! key enforcement: `Student::bus_number` is a cached copy of the referenced
//! bus and is not re-synced when the bus changes.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder shown where a student has no bus
pub const NO_BUS: &str = "—";

/// A student enrolled for bus transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Internal identifier (`s_…`)
    pub id: String,
    /// User-facing code such as `S1001`
    #[serde(default)]
    pub student_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Referenced bus, if any
    #[serde(default, deserialize_with = "empty_as_none")]
    pub bus_id: Option<String>,
    /// Cached display number of the referenced bus
    #[serde(default = "no_bus")]
    pub bus_number: String,
    /// Unknown, blank or missing values read as Due
    #[serde(default = "unpaid", deserialize_with = "lenient_fee_status")]
    pub fee_status: FeeStatus,
}

fn no_bus() -> String {
    NO_BUS.to_string()
}

const fn unpaid() -> FeeStatus {
    FeeStatus::Due
}

fn lenient_fee_status<'de, D>(deserializer: D) -> Result<FeeStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse().ok()).unwrap_or(FeeStatus::Due))
}

impl Student {
    /// Any fee status other than Paid
    #[must_use]
    pub const fn is_defaulter(&self) -> bool {
        !matches!(self.fee_status, FeeStatus::Paid)
    }

    /// Text matched by the student search box
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {} {} {}", self.student_id, self.name, self.email, self.bus_number)
    }
}

/// A school bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    pub id: String,
    pub bus_number: String,
    pub route: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub incharge_name: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Ids written by older builds may be bare numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// Timestamps are RFC 3339 strings or epoch milliseconds
fn millis_or_rfc3339<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stamp {
        Millis(i64),
        Float(f64),
        Text(DateTime<Utc>),
    }

    #[allow(clippy::cast_possible_truncation)]
    let millis = match Stamp::deserialize(deserializer)? {
        Stamp::Text(ts) => return Ok(ts),
        Stamp::Millis(ms) => ms,
        Stamp::Float(ms) => ms as i64,
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
}

/// A complaint raised by a student and handled by the bus in-charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "submitted")]
    pub status: ComplaintStatus,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn submitted() -> ComplaintStatus {
    ComplaintStatus::Submitted
}

/// A message queued for one student; append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// Internal id of the target student
    #[serde(alias = "student_id")]
    pub student_ref: String,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_email: Option<String>,
    pub message: String,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// One attendance mark; append-only, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(deserialize_with = "millis_or_rfc3339")]
    pub ts: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub mode: CaptureMode,
    /// Scanned or typed payload, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Fee status of a student. Parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FeeStatus {
    Paid,
    Due,
    Overdue,
}

impl FeeStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Due => "Due",
            Self::Overdue => "Overdue",
        }
    }
}

impl FromStr for FeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paid" => Ok(Self::Paid),
            "due" => Ok(Self::Due),
            "overdue" => Ok(Self::Overdue),
            other => Err(format!("unknown fee status: {other:?}")),
        }
    }
}

impl TryFrom<String> for FeeStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Complaint lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ComplaintStatus {
    Submitted,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub const ALL: [Self; 3] = [Self::Submitted, Self::InProgress, Self::Resolved];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "submitted" => Ok(Self::Submitted),
            "in progress" | "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown complaint status: {other:?}")),
        }
    }
}

impl TryFrom<String> for ComplaintStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }
}

/// How an attendance entry was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    #[serde(rename = "QR")]
    Qr,
    Manual,
    Demo,
}

impl CaptureMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Qr => "QR",
            Self::Manual => "Manual",
            Self::Demo => "Demo",
        }
    }
}

/// Dashboard role carried by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
    Incharge,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
            Self::Incharge => "incharge",
        }
    }

    /// Page a logged-in user of this role is sent to
    #[must_use]
    pub const fn dashboard_page(self) -> &'static str {
        match self {
            Self::Admin => "admin-dashboard.html",
            Self::Student => "student-dashboard.html",
            Self::Incharge => "bus-incharge.html",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "student" => Ok(Self::Student),
            "incharge" | "bus-incharge" => Ok(Self::Incharge),
            other => Err(format!("unknown role: {other:?}")),
        }
    }
}

/// Role flag plus opaque token; its presence gates dashboard access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRole {
    pub role: Role,
    pub token: String,
    /// User snapshot returned by the login endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

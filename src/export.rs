//! Store export.
//!
//! A JSON snapshot of every collection, or the student roster as CSV.

use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::Result;
use crate::models::{AttendanceEntry, Bus, Complaint, Notification, Student};
use crate::storage::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// All collections in one document
    Json,
    /// Student roster
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format: {other:?}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

/// Everything the dashboards keep, as one document
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub exported_at: DateTime<Utc>,
    pub students: Vec<Student>,
    pub buses: Vec<Bus>,
    pub complaints: Vec<Complaint>,
    pub notifications: Vec<Notification>,
    pub attendance: Vec<AttendanceEntry>,
}

impl Snapshot {
    pub fn capture(store: &Store, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            exported_at: now,
            students: store.load()?,
            buses: store.load()?,
            complaints: store.load()?,
            notifications: store.load()?,
            attendance: store.load()?,
        })
    }
}

/// Write the export to `file_path`, creating parent directories.
pub fn export_to_file(store: &Store, format: OutputFormat, file_path: &Path, now: DateTime<Utc>) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = File::create(file_path)?;
    write_export(store, format, file, now)?;
    info!(path = %file_path.display(), %format, "export written");
    Ok(())
}

/// Write the export to any writer (stdout included).
pub fn write_export<W: Write>(store: &Store, format: OutputFormat, out: W, now: DateTime<Utc>) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(&Snapshot::capture(store, now)?, out),
        OutputFormat::Csv => write_roster_csv(&store.load::<Student>()?, out),
    }
}

fn write_json<W: Write>(snapshot: &Snapshot, out: W) -> Result<()> {
    let mut writer = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Roster with header `Student ID, Name, Email, Phone, Bus, Fee Status`
fn write_roster_csv<W: Write>(students: &[Student], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["Student ID", "Name", "Email", "Phone", "Bus", "Fee Status"])?;
    for s in students {
        writer.write_record([
            s.student_id.as_str(),
            s.name.as_str(),
            s.email.as_str(),
            s.phone.as_str(),
            s.bus_number.as_str(),
            s.fee_status.label(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

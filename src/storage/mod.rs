//! Persistent store of named collections.
//!
//! Every collection lives under one fixed key as a JSON document
//! `{"version": 1, "records": [...]}`. A save replaces the whole collection in
//! a single write; there are no transactions spanning collections. Anything
//! that fails to deserialize is read back as an empty collection.
//!
//! The store assumes a single writer. Two processes sharing one data
//! directory are not coordinated.

mod memory;
mod sled_backend;

pub use memory::MemoryBackend;
pub use sled_backend::SledBackend;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{AttendanceEntry, Bus, Complaint, Notification, Student};

/// Layout version written with every collection
pub const STORE_VERSION: u32 = 1;

/// Default number of attendance entries kept
pub const DEFAULT_ATTENDANCE_CAP: usize = 200;

/// Raw byte storage scoped to one origin (one data directory).
///
/// Values are raw bytes; decoding them is the store's job.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set_item(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Named collections held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Students,
    Buses,
    Complaints,
    Notifications,
    Attendance,
}

impl Collection {
    pub const ALL: [Self; 5] = [
        Self::Students,
        Self::Buses,
        Self::Complaints,
        Self::Notifications,
        Self::Attendance,
    ];

    /// Storage key of the collection
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Students => "sb_students_v1",
            Self::Buses => "sb_buses_v1",
            Self::Complaints => "sb_complaints_v1",
            Self::Notifications => "sb_notifications_v1",
            Self::Attendance => "sb_attendance_v1",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Buses => "buses",
            Self::Complaints => "complaints",
            Self::Notifications => "notifications",
            Self::Attendance => "attendance",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type stored in exactly one collection
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;
}

impl Record for Student {
    const COLLECTION: Collection = Collection::Students;
}

impl Record for Bus {
    const COLLECTION: Collection = Collection::Buses;
}

impl Record for Complaint {
    const COLLECTION: Collection = Collection::Complaints;
}

impl Record for Notification {
    const COLLECTION: Collection = Collection::Notifications;
}

impl Record for AttendanceEntry {
    const COLLECTION: Collection = Collection::Attendance;
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    version: u32,
    records: &'a [T],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Versioned { version: u32, records: Vec<T> },
    // Versionless arrays written before the envelope existed
    Legacy(Vec<T>),
}

/// Typed access to the collections of one backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StorageBackend>,
    attendance_cap: usize,
    metrics: MetricsCollector,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("attendance_cap", &self.attendance_cap)
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            attendance_cap: DEFAULT_ATTENDANCE_CAP,
            metrics: MetricsCollector::default(),
        }
    }

    /// Open a sled-backed store in `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(SledBackend::open(data_dir)?)))
    }

    /// Store over a fresh in-memory backend
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    #[must_use]
    pub fn with_attendance_cap(mut self, cap: usize) -> Self {
        self.attendance_cap = cap.max(1);
        self
    }

    #[must_use]
    pub const fn attendance_cap(&self) -> usize {
        self.attendance_cap
    }

    /// Load a collection; absent or malformed data reads as empty.
    pub fn load<T: Record>(&self) -> Result<Vec<T>> {
        let collection = T::COLLECTION;
        self.metrics.record_store_read(collection.name());
        let Some(bytes) = self.backend.get_item(collection.key())? else {
            return Ok(Vec::new());
        };
        let raw = match String::from_utf8(bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%collection, error = %e, "collection is not UTF-8, reading as empty");
                self.metrics.record_malformed(collection.name());
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Stored<T>>(&raw) {
            Ok(Stored::Versioned { version, records }) if version <= STORE_VERSION => Ok(records),
            Ok(Stored::Versioned { version, .. }) => {
                warn!(%collection, version, "stored collection has a newer layout version, reading as empty");
                self.metrics.record_malformed(collection.name());
                Ok(Vec::new())
            }
            Ok(Stored::Legacy(records)) => {
                debug!(%collection, "read versionless collection");
                Ok(records)
            }
            Err(e) => {
                warn!(%collection, error = %e, "malformed collection, reading as empty");
                self.metrics.record_malformed(collection.name());
                Ok(Vec::new())
            }
        }
    }

    /// Replace a collection with `records` in one write.
    ///
    /// Attendance is truncated to the most recent `attendance_cap` entries
    /// (the front of the list).
    pub fn save<T: Record>(&self, records: &[T]) -> Result<()> {
        let collection = T::COLLECTION;
        let records = if collection == Collection::Attendance && records.len() > self.attendance_cap {
            &records[..self.attendance_cap]
        } else {
            records
        };

        let timer = OperationTimer::new("store.save");
        let json = serde_json::to_string(&Envelope {
            version: STORE_VERSION,
            records,
        })?;
        self.backend.set_item(collection.key(), json.as_bytes())?;
        let elapsed = timer.finish();

        self.metrics.record_store_write(collection.name(), records.len(), elapsed);
        debug!(%collection, records = records.len(), "collection saved");
        Ok(())
    }

    /// Whether the collection key is present at all
    pub fn contains(&self, collection: Collection) -> Result<bool> {
        Ok(self.backend.get_item(collection.key())?.is_some())
    }

    /// Remove one collection
    pub fn remove(&self, collection: Collection) -> Result<()> {
        self.backend.remove_item(collection.key())
    }

    /// Remove every collection and the session keys
    pub fn clear_all(&self) -> Result<()> {
        for collection in Collection::ALL {
            self.remove(collection)?;
        }
        for key in crate::session::SESSION_KEYS {
            self.backend.remove_item(key)?;
        }
        Ok(())
    }

    /// Raw string under `key`; a non UTF-8 value reads as absent.
    pub(crate) fn read_key(&self, key: &str) -> Result<Option<String>> {
        Ok(self.backend.get_item(key)?.and_then(|bytes| match String::from_utf8(bytes) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key, "ignoring non UTF-8 value");
                None
            }
        }))
    }

    pub(crate) fn write_key(&self, key: &str, value: &str) -> Result<()> {
        self.backend.set_item(key, value.as_bytes())
    }

    pub(crate) fn remove_key(&self, key: &str) -> Result<()> {
        self.backend.remove_item(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, CaptureMode, FeeStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn student(id: &str) -> Student {
        Student {
            id: id.to_string(),
            student_id: "S1001".to_string(),
            name: "Test".to_string(),
            email: "t@example.com".to_string(),
            phone: String::new(),
            bus_id: None,
            bus_number: "—".to_string(),
            fee_status: FeeStatus::Paid,
        }
    }

    #[test]
    fn test_absent_collection_is_empty() {
        let store = Store::in_memory();
        assert!(store.load::<Student>().unwrap().is_empty());
        assert!(!store.contains(Collection::Students).unwrap());
    }

    #[test]
    fn test_save_writes_versioned_envelope() {
        let backend = Arc::new(MemoryBackend::default());
        let store = Store::new(backend.clone());
        store.save(&[student("s_1")]).unwrap();

        let raw = backend.get_item("sb_students_v1").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["records"][0]["id"], "s_1");
    }

    #[test]
    fn test_legacy_array_is_read() {
        let backend = Arc::new(MemoryBackend::default());
        backend
            .set_item(
                "sb_buses_v1",
                br#"[{"id":"b_1","bus_number":"BUS-1","route":"R","capacity":10,"incharge_name":""}]"#,
            )
            .unwrap();
        let store = Store::new(backend);
        let buses: Vec<Bus> = store.load().unwrap();
        assert_eq!(buses.len(), 1);
        assert_eq!(buses[0].bus_number, "BUS-1");
    }

    #[test]
    fn test_malformed_reads_as_empty() {
        let backend = Arc::new(MemoryBackend::default());
        backend.set_item("sb_students_v1", b"{not json").unwrap();
        let store = Store::new(backend);
        assert!(store.load::<Student>().unwrap().is_empty());
    }

    #[test]
    fn test_newer_version_reads_as_empty() {
        let backend = Arc::new(MemoryBackend::default());
        backend
            .set_item("sb_notifications_v1", br#"{"version":99,"records":[]}"#)
            .unwrap();
        let store = Store::new(backend);
        assert!(store.load::<Notification>().unwrap().is_empty());
    }

    #[test]
    fn test_attendance_is_capped_keeping_newest() {
        let store = Store::in_memory().with_attendance_cap(3);
        let base = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let entries: Vec<AttendanceEntry> = (0..5)
            .map(|i| AttendanceEntry {
                ts: base - Duration::hours(i),
                status: AttendanceStatus::Present,
                mode: CaptureMode::Manual,
                raw: None,
            })
            .collect();
        store.save(&entries).unwrap();

        let loaded: Vec<AttendanceEntry> = store.load().unwrap();
        assert_eq!(loaded, entries[..3].to_vec());
    }

    #[test]
    fn test_clear_all_removes_collections() {
        let store = Store::in_memory();
        store.save(&[student("s_1")]).unwrap();
        store.clear_all().unwrap();
        assert!(!store.contains(Collection::Students).unwrap());
    }
}

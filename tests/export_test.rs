//! Integration tests for store export

use chrono::Utc;
use tempfile::tempdir;

use schoolbus_desk::export::{export_to_file, write_export, OutputFormat};
use schoolbus_desk::models::{FeeStatus, Student};
use schoolbus_desk::seed::ensure_seeded;
use schoolbus_desk::storage::Store;

fn seeded_store() -> Store {
    let store = Store::in_memory();
    ensure_seeded(&store, Utc::now()).expect("Failed to seed store");
    store
}

#[test]
fn test_csv_roster_has_header_and_one_row_per_student() {
    let store = seeded_store();
    let mut out = Vec::new();
    write_export(&store, OutputFormat::Csv, &mut out, Utc::now()).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Student ID,Name,Email,Phone,Bus,Fee Status");
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "S1001,Aishwarya Kumar,aish@example.com,9876543210,BUS-101,Paid");
    assert!(lines[3].ends_with(",Overdue"));
}

#[test]
fn test_csv_quotes_fields_with_commas() {
    let store = Store::in_memory();
    let students = vec![Student {
        id: "s_1".to_string(),
        student_id: "S1001".to_string(),
        name: "Kumar, Aishwarya".to_string(),
        email: "aish@example.com".to_string(),
        phone: String::new(),
        bus_id: None,
        bus_number: "BUS-101".to_string(),
        fee_status: FeeStatus::Due,
    }];
    store.save(&students).unwrap();

    let mut out = Vec::new();
    write_export(&store, OutputFormat::Csv, &mut out, Utc::now()).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("\"Kumar, Aishwarya\""));
}

#[test]
fn test_json_snapshot_written_to_file() {
    let store = seeded_store();
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("nested").join("snapshot.json");

    export_to_file(&store, OutputFormat::Json, &path, Utc::now()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["students"].as_array().map(Vec::len), Some(3));
    assert_eq!(value["buses"].as_array().map(Vec::len), Some(3));
    assert_eq!(value["notifications"].as_array().map(Vec::len), Some(0));
    assert!(value["exported_at"].is_string());
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
    assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
    assert!("xml".parse::<OutputFormat>().is_err());
}

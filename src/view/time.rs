use chrono::{DateTime, Local, Utc};

/// Compact age of `ts` relative to `now`: "just now", "5m", "3h", "2d".
///
/// Floor division throughout. Timestamps in the future read as "just now".
#[must_use]
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - ts).num_minutes();
    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{mins}m");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    format!("{}d", hours / 24)
}

/// Calendar date in local time, as shown in tables
#[must_use]
pub fn local_date(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// Wall clock time in local time
#[must_use]
pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[must_use]
pub fn last_updated_label(now: DateTime<Utc>) -> String {
    format!(
        "Last updated: {}",
        now.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}

#[must_use]
pub fn last_sync_label(now: DateTime<Utc>) -> String {
    format!("Last sync: {}", local_time(now))
}

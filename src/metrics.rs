use metrics::{counter, histogram};
use std::time::Duration;

/// Metric names and recording helpers.
///
/// Recording goes through the `metrics` facade; without an installed recorder
/// every call is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    pub store_reads_total: &'static str,
    pub store_writes_total: &'static str,
    pub store_write_duration: &'static str,
    pub store_malformed_total: &'static str,
    pub actions_total: &'static str,
    pub notifications_queued_total: &'static str,
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            store_reads_total: "schoolbus_store_reads_total",
            store_writes_total: "schoolbus_store_writes_total",
            store_write_duration: "schoolbus_store_write_duration_seconds",
            store_malformed_total: "schoolbus_store_malformed_total",
            actions_total: "schoolbus_actions_total",
            notifications_queued_total: "schoolbus_notifications_queued_total",
            errors_total: "schoolbus_errors_total",
        }
    }
}

impl MetricsCollector {
    pub fn record_store_read(&self, collection: &'static str) {
        counter!(self.store_reads_total, "collection" => collection).increment(1);
    }

    pub fn record_store_write(&self, collection: &'static str, records: usize, duration: Duration) {
        counter!(self.store_writes_total, "collection" => collection).increment(1);
        histogram!(self.store_write_duration, "collection" => collection).record(duration.as_secs_f64());
        tracing::trace!(collection, records, "store write recorded");
    }

    pub fn record_malformed(&self, collection: &'static str) {
        counter!(self.store_malformed_total, "collection" => collection).increment(1);
    }

    pub fn record_action(&self, dashboard: &'static str, action: &'static str) {
        counter!(self.actions_total, "dashboard" => dashboard, "action" => action).increment(1);
    }

    pub fn record_notifications(&self, count: usize) {
        counter!(self.notifications_queued_total).increment(count as u64);
    }

    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.store_writes_total, "schoolbus_store_writes_total");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let collector = MetricsCollector::default();
        collector.record_store_read("students");
        collector.record_store_write("students", 3, Duration::from_millis(2));
        collector.record_action("admin", "delete-bus");
        collector.record_notifications(2);
    }
}

use std::time::Duration;

use metrics::{counter, histogram};

/// Metrics collection and management.
///
/// Emits through the `metrics` facade; without an installed recorder every call is a
/// no-op, so the service runs the same with or without an exporter.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    // Store metrics
    pub db_operations_total: &'static str,
    pub db_operation_duration: &'static str,

    // Intake metrics
    pub submissions_accepted_total: &'static str,
    pub submissions_rejected_total: &'static str,

    // Admin metrics
    pub logins_total: &'static str,
    pub rate_limited_total: &'static str,

    // Export metrics
    pub export_operations_total: &'static str,
    pub export_duration: &'static str,
    pub export_file_size_bytes: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            db_operations_total: "contact_intake_db_operations_total",
            db_operation_duration: "contact_intake_db_operation_duration_seconds",

            submissions_accepted_total: "contact_intake_submissions_accepted_total",
            submissions_rejected_total: "contact_intake_submissions_rejected_total",

            logins_total: "contact_intake_logins_total",
            rate_limited_total: "contact_intake_rate_limited_total",

            export_operations_total: "contact_intake_export_operations_total",
            export_duration: "contact_intake_export_duration_seconds",
            export_file_size_bytes: "contact_intake_export_file_size_bytes",

            errors_total: "contact_intake_errors_total",
        }
    }
}

const fn status(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

impl MetricsCollector {
    /// Record database operation metrics
    pub fn record_db_operation(&self, operation: &'static str, duration: Duration, success: bool) {
        counter!(self.db_operations_total, "operation" => operation, "status" => status(success)).increment(1);
        histogram!(self.db_operation_duration, "operation" => operation).record(duration.as_secs_f64());

        if !success {
            counter!(self.errors_total, "type" => "database", "operation" => operation).increment(1);
        }
    }

    /// Record an accepted submission
    pub fn record_submission_accepted(&self, project_type: &str) {
        counter!(self.submissions_accepted_total, "project_type" => project_type.to_string()).increment(1);
    }

    /// Record a submission rejected by validation
    pub fn record_submission_rejected(&self, violations: usize) {
        counter!(self.submissions_rejected_total).increment(1);
        histogram!("contact_intake_validation_violations").record(violations as f64);
    }

    /// Record a login attempt by outcome
    pub fn record_login(&self, success: bool) {
        counter!(self.logins_total, "status" => status(success)).increment(1);
    }

    /// Record a request turned away by a rate-limit policy
    pub fn record_rate_limited(&self, policy: &'static str) {
        counter!(self.rate_limited_total, "policy" => policy).increment(1);
    }

    /// Record export operation metrics
    pub fn record_export_operation(&self, record_count: usize, total_size_bytes: usize, duration: Duration) {
        counter!(self.export_operations_total).increment(1);
        histogram!(self.export_duration).record(duration.as_secs_f64());
        histogram!(self.export_file_size_bytes).record(total_size_bytes as f64);
        histogram!("contact_intake_export_record_count").record(record_count as f64);
    }
}

/// Performance timing wrapper for store metrics
pub struct MetricsTimer {
    collector: MetricsCollector,
    operation: &'static str,
    start: std::time::Instant,
}

impl MetricsTimer {
    pub fn new(collector: MetricsCollector, operation: &'static str) -> Self {
        Self {
            collector,
            operation,
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector.record_db_operation(self.operation, duration, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.db_operations_total, "contact_intake_db_operations_total");
        assert!(collector.errors_total.starts_with("contact_intake_"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let collector = MetricsCollector::default();
        collector.record_db_operation("insert", Duration::from_millis(3), false);
        collector.record_submission_accepted("Web Development");
        collector.record_login(true);
        MetricsTimer::new(collector, "count").finish(true);
    }
}

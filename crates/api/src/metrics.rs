//! Prometheus metrics for the scheduling engine
//!
//! This module defines and records metrics for observability of the booking
//! lifecycle, check-ins, and the event worker.

use metrics::{counter, histogram};
use std::time::Instant;

/// Metric names for scheduling operations
pub mod names {
    pub const BOOKINGS_CREATED: &str = "scheduling_bookings_created_total";
    pub const BOOKINGS_CANCELLED: &str = "scheduling_bookings_cancelled_total";
    pub const CAPACITY_REJECTIONS: &str = "scheduling_capacity_rejections_total";
    pub const IDEMPOTENCY_HITS: &str = "scheduling_booking_idempotency_hits_total";
    pub const CHECK_INS: &str = "scheduling_check_ins_total";
    pub const EVENTS_PROCESSED: &str = "scheduling_events_processed_total";
    pub const SESSION_QUERY_DURATION: &str = "scheduling_session_query_duration_seconds";
}

/// Record a successful booking creation
pub fn record_booking_created(tenant_id: &str, source: &str) {
    counter!(names::BOOKINGS_CREATED, "tenant_id" => tenant_id.to_string(), "source" => source.to_string())
        .increment(1);
}

/// Record a booking cancellation
pub fn record_booking_cancelled(tenant_id: &str) {
    counter!(names::BOOKINGS_CANCELLED, "tenant_id" => tenant_id.to_string()).increment(1);
}

/// Record a reservation rejected by the capacity bound
pub fn record_capacity_rejection(tenant_id: &str) {
    counter!(names::CAPACITY_REJECTIONS, "tenant_id" => tenant_id.to_string()).increment(1);
}

/// Record an idempotent short-circuit (duplicate booking request)
pub fn record_idempotency_hit(tenant_id: &str) {
    counter!(names::IDEMPOTENCY_HITS, "tenant_id" => tenant_id.to_string()).increment(1);
}

/// Record a recorded check-in with its outcome status
pub fn record_check_in(tenant_id: &str, status: &str) {
    counter!(names::CHECK_INS, "tenant_id" => tenant_id.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a processed inbound event and its result kind
pub fn record_event_processed(detail_type: &str, outcome: &str) {
    counter!(names::EVENTS_PROCESSED, "detail_type" => detail_type.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

/// Record the duration of a session query
pub fn record_session_query_duration(tenant_id: &str, duration_secs: f64) {
    histogram!(names::SESSION_QUERY_DURATION, "tenant_id" => tenant_id.to_string())
        .record(duration_secs);
}

/// Helper struct for timing session queries
pub struct Timer {
    start: Instant,
    tenant_id: String,
}

impl Timer {
    pub fn start(tenant_id: &str) -> Self {
        Self {
            start: Instant::now(),
            tenant_id: tenant_id.to_string(),
        }
    }

    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_session_query_duration(&self.tenant_id, duration);
    }
}

/// Initialize the Prometheus metrics exporter
/// Returns a handle to the PrometheusBuilder that can be used to render metrics
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder")
}

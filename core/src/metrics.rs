//! Business metrics for the marketplace.
//!
//! Recording is a no-op until a recorder is installed (the server binary
//! installs the Prometheus exporter).

use crate::error::ConflictReason;
use crate::types::OrderStatus;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "dogworld_adoption_requests_total",
        "Adoption requests accepted (orders created)"
    );
    describe_counter!(
        "dogworld_adoption_conflicts_total",
        "Adoption requests rejected by arbitration, labelled by reason"
    );
    describe_counter!(
        "dogworld_order_transitions_total",
        "Order status transitions committed, labelled by target status"
    );
    describe_counter!(
        "dogworld_order_cancellations_total",
        "Orders cancelled by sellers"
    );
    describe_counter!("dogworld_listings_created_total", "Listings created");
    describe_gauge!(
        "dogworld_observers_connected",
        "Notification observers currently connected"
    );
    describe_histogram!(
        "dogworld_operation_duration_seconds",
        "Time taken by lifecycle operations"
    );
}

/// Records a created order.
pub fn record_adoption_request() {
    counter!("dogworld_adoption_requests_total").increment(1);
}

/// Records an arbitration rejection.
pub fn record_conflict(reason: ConflictReason) {
    counter!("dogworld_adoption_conflicts_total", "reason" => reason.code()).increment(1);
}

/// Records a committed transition.
pub fn record_transition(status: OrderStatus) {
    counter!("dogworld_order_transitions_total", "status" => status.as_str()).increment(1);
}

/// Records a cancellation.
pub fn record_cancellation() {
    counter!("dogworld_order_cancellations_total").increment(1);
}

/// Records a new listing.
pub fn record_listing_created() {
    counter!("dogworld_listings_created_total").increment(1);
}

/// Records the current observer count.
#[allow(clippy::cast_precision_loss)]
pub fn record_observers(count: usize) {
    gauge!("dogworld_observers_connected").set(count as f64);
}

/// Records how long an operation took.
pub fn record_duration(operation: &'static str, elapsed: Duration) {
    histogram!("dogworld_operation_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

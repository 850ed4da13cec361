//! Business metrics for the desk booking service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `deskbook_bookings_total{status}` - Booking requests by outcome
//!   (`created`, `proxy_created`, or the rejection reason)
//! - `deskbook_cancellations_total{status}` - Cancellation requests by outcome
//!   (`cancelled`, `admin_cancelled`, or the rejection reason)
//! - `deskbook_availability_scans_total{result}` - Availability scans
//!   (`found`, `exhausted`)
//!
//! ## Histograms
//! - `deskbook_availability_offset_days` - How far ahead the nearest free
//!   date was found

use metrics::{describe_counter, describe_histogram};

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "deskbook_bookings_total",
        "Total number of booking requests by status (created, proxy_created, or rejection reason)"
    );
    describe_counter!(
        "deskbook_cancellations_total",
        "Total number of cancellation requests by status (cancelled, admin_cancelled, or rejection reason)"
    );
    describe_counter!(
        "deskbook_availability_scans_total",
        "Total number of nearest-availability scans by result (found, exhausted)"
    );
    describe_histogram!(
        "deskbook_availability_offset_days",
        "Days between the scan start and the nearest date with a free seat"
    );

    tracing::info!("Business metrics registered");
}

/// Record a successful booking.
pub fn record_booking_created(is_proxy: bool) {
    let status = if is_proxy { "proxy_created" } else { "created" };
    metrics::counter!("deskbook_bookings_total", "status" => status).increment(1);
    tracing::debug!(status, "Recorded booking_created metric");
}

/// Record a rejected booking.
///
/// # Arguments
///
/// * `reason` - Stable rejection label, e.g. `"seat_taken"`
pub fn record_booking_rejected(reason: &'static str) {
    metrics::counter!("deskbook_bookings_total", "status" => reason).increment(1);
    tracing::debug!(reason, "Recorded booking_rejected metric");
}

/// Record a successful cancellation.
pub fn record_booking_cancelled(administrative: bool) {
    let status = if administrative { "admin_cancelled" } else { "cancelled" };
    metrics::counter!("deskbook_cancellations_total", "status" => status).increment(1);
    tracing::debug!(status, "Recorded booking_cancelled metric");
}

/// Record a rejected cancellation.
pub fn record_cancellation_rejected(reason: &'static str) {
    metrics::counter!("deskbook_cancellations_total", "status" => reason).increment(1);
    tracing::debug!(reason, "Recorded cancellation_rejected metric");
}

/// Record the outcome of a nearest-availability scan.
///
/// # Arguments
///
/// * `offset_days` - Offset of the date found, or `None` if the horizon was exhausted
pub fn record_availability_scan(offset_days: Option<u32>) {
    match offset_days {
        Some(offset) => {
            metrics::counter!("deskbook_availability_scans_total", "result" => "found").increment(1);
            metrics::histogram!("deskbook_availability_offset_days").record(f64::from(offset));
        }
        None => {
            metrics::counter!("deskbook_availability_scans_total", "result" => "exhausted").increment(1);
        }
    }
    tracing::debug!(?offset_days, "Recorded availability_scan metric");
}

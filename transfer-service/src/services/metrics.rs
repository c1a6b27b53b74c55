//! Prometheus metrics for transfer-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Transfer counter by outcome.
pub static TRANSFERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "transfer_transfers_total",
        "Total number of transfer attempts",
        &["status"] // ok, or the rejection kind
    )
    .expect("Failed to register transfers_total")
});

/// Deposit counter by outcome.
pub static DEPOSITS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "transfer_deposits_total",
        "Total number of deposit attempts",
        &["status"]
    )
    .expect("Failed to register deposits_total")
});

/// Account counter by outcome.
pub static ACCOUNTS_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "transfer_accounts_created_total",
        "Total number of account creation attempts",
        &["status"]
    )
    .expect("Failed to register accounts_created")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "transfer_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&TRANSFERS_TOTAL);
    Lazy::force(&DEPOSITS_TOTAL);
    Lazy::force(&ACCOUNTS_CREATED);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

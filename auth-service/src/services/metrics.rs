use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static TOKENS_ISSUED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static AUTH_REJECTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let tokens_issued = match IntCounterVec::new(
        Opts::new("auth_tokens_issued_total", "Token pairs issued"),
        &["reason"], // login, refresh
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create auth_tokens_issued_total metric: {}", e);
            return;
        }
    };

    let rejections = match IntCounterVec::new(
        Opts::new(
            "auth_rejections_total",
            "Rejected logins, token validations and rotations",
        ),
        &["reason"],
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create auth_rejections_total metric: {}", e);
            return;
        }
    };

    for collector in [tokens_issued.clone(), rejections.clone()] {
        if let Err(e) = registry.register(Box::new(collector)) {
            tracing::error!("Failed to register auth collector: {}", e);
            return;
        }
    }

    let _ = REGISTRY.set(registry);
    let _ = TOKENS_ISSUED_TOTAL.set(tokens_issued);
    let _ = AUTH_REJECTIONS_TOTAL.set(rejections);
}

pub fn record_issued(reason: &str) {
    if let Some(counter) = TOKENS_ISSUED_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

pub fn record_rejection(reason: &str) {
    if let Some(counter) = AUTH_REJECTIONS_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

pub fn get_metrics() -> String {
    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    match TextEncoder::new().encode_to_string(&registry.gather()) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            format!("# Failed to encode metrics: {}\n", e)
        }
    }
}

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Registry, TextEncoder};
use std::sync::OnceLock;
use tracing::warn;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();
static GENERATION_SECONDS: OnceLock<Histogram> = OnceLock::new();

/// Registers the collectors. Safe to call more than once.
pub fn init_metrics() {
    if REQ_COUNTER.get().is_none() {
        match IntCounterVec::new(
            prometheus::opts!("requests_total", "Total requests per route"),
            &["route", "status"],
        ) {
            Ok(counter) => register(&REQ_COUNTER, counter),
            Err(e) => warn!("requests_total metric unavailable: {}", e),
        }
    }

    if ACTIVE_SESSIONS.get().is_none() {
        match IntGauge::new("active_sessions", "Sessions with history in this process") {
            Ok(gauge) => register(&ACTIVE_SESSIONS, gauge),
            Err(e) => warn!("active_sessions metric unavailable: {}", e),
        }
    }

    if GENERATION_SECONDS.get().is_none() {
        match Histogram::with_opts(HistogramOpts::new(
            "generation_seconds",
            "Time spent waiting for the generation backend",
        )) {
            Ok(histogram) => register(&GENERATION_SECONDS, histogram),
            Err(e) => warn!("generation_seconds metric unavailable: {}", e),
        }
    }
}

fn register<C>(slot: &OnceLock<C>, collector: C)
where
    C: prometheus::core::Collector + Clone + 'static,
{
    if slot.set(collector.clone()).is_ok() {
        REGISTRY.register(Box::new(collector)).ok();
    }
}

pub fn inc_request(route: &str, status: u16) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, &status.to_string()]).inc();
    }
}

pub fn set_active_sessions(count: usize) {
    if let Some(gauge) = ACTIVE_SESSIONS.get() {
        gauge.set(count as i64);
    }
}

pub fn observe_generation(seconds: f64) {
    if let Some(histogram) = GENERATION_SECONDS.get() {
        histogram.observe(seconds);
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        buffer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        init_metrics();
        init_metrics();
        inc_request("/run_prompt", 200);
        set_active_sessions(3);
        observe_generation(0.25);

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("requests_total{route=\"/run_prompt\",status=\"200\"}"));
        assert!(text.contains("active_sessions"));
        assert!(text.contains("generation_seconds_count"));
    }
}

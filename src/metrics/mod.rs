#[cfg(test)]
mod metrics_test;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;

lazy_static! {
    pub static ref EVICTED_KEYS: IntCounterVec = IntCounterVec::new(
        Opts::new("evicted_keys", "Keys removed by eviction"),
        &["policy"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_EVENTS_DISPATCHED: IntCounter =
        IntCounter::new("watch_events_dispatched", "Key-change events processed by the dispatcher")
            .expect("metric can not be created");

    pub static ref WATCH_PUSHES_DELIVERED: IntCounter =
        IntCounter::new("watch_pushes_delivered", "Push frames written to clients")
            .expect("metric can not be created");

    pub static ref WATCH_DELIVERY_FAILURES: IntCounter = IntCounter::new(
        "watch_delivery_failures",
        "Push writes that failed and unsubscribed the client"
    )
    .expect("metric can not be created");

    pub static ref WATCH_QUERY_ERRORS: IntCounter =
        IntCounter::new("watch_query_errors", "Watched query re-executions that failed")
            .expect("metric can not be created");

    pub static ref WATCHED_QUERIES: IntGauge =
        IntGauge::new("watched_queries", "Distinct queries with at least one watcher")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry =
        Registry::new_custom(Some("dstore".to_string()), None).expect("registry can be created");
}

pub fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(EVICTED_KEYS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_EVENTS_DISPATCHED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_PUSHES_DELIVERED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_DELIVERY_FAILURES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_QUERY_ERRORS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCHED_QUERIES.clone()))
        .expect("collector can be registered");
}

/// Renders `registry` in the Prometheus text exposition format.
pub fn gather_metrics(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        error!("could not encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

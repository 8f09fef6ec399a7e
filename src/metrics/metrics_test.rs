use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("dstore".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    EVICTED_KEYS.with_label_values(&["allkeys-lru"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"dstore_evicted_keys"),
        "Missing dstore_evicted_keys"
    );
    assert!(metric_names.contains(&"dstore_watched_queries"));
}

#[test]
fn test_counter_increment() {
    EVICTED_KEYS.with_label_values(&["metrics-test"]).inc_by(2);
    EVICTED_KEYS.with_label_values(&["metrics-test"]).inc();

    let value = EVICTED_KEYS.with_label_values(&["metrics-test"]).get();
    assert_eq!(value, 3, "Counter should increment correctly");
}

#[test]
fn test_gather_metrics_text_format() {
    let registry = create_test_registry();
    WATCH_PUSHES_DELIVERED.inc();

    let text = gather_metrics(&registry);
    assert!(text.contains("dstore_watch_pushes_delivered"));
}

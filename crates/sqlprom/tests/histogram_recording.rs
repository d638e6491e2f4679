//! End-to-end recording against a real Prometheus-backed registry.
//!
//! These tests wire the observer exactly as a service would at startup and
//! inspect the resulting histogram.

use sqlprom::{
    METRIC_NAME, MetricsError, MetricsRegistry, ObserverConfig, QueryEvent, QueryListener,
    install, normalize,
};
use std::time::Duration;

// ── Startup wiring ───────────────────────────────────────────────────────────

#[test]
fn records_point_lookup_with_full_query() {
    let registry = MetricsRegistry::new();
    let observer = install(&registry, &ObserverConfig::new().enable_full_query()).unwrap();

    observer.on_query(&QueryEvent::from_secs_f64(
        "SELECT * FROM users WHERE id = 42",
        0.013,
    ));

    let labels = ["select * from users where id = ?", "SELECT"];
    assert_eq!(observer.sink().sample_count(&labels).unwrap(), 1);
    assert!((observer.sink().sample_sum(&labels).unwrap() - 0.013).abs() < 1e-9);

    let text = registry.encode_text().unwrap();
    assert!(text.contains(
        r#"sql_query_duration_count{query="select * from users where id = ?",query_type="SELECT"} 1"#
    ));
}

#[test]
fn same_shape_shares_one_series() {
    let registry = MetricsRegistry::new();
    let observer = install(&registry, &ObserverConfig::new().enable_full_query()).unwrap();

    for sql in [
        "SELECT * FROM t WHERE id IN (1,2,3)",
        "SELECT * FROM t WHERE id IN (4,5,6,7)",
        "select *   from t where id in (8)",
    ] {
        observer.on_query(&QueryEvent::new(sql, Duration::from_millis(3)));
    }

    let shape = normalize("SELECT * FROM t WHERE id IN (9)");
    assert_eq!(
        observer.sink().sample_count(&[shape.as_str(), "SELECT"]).unwrap(),
        3
    );
    // query_type is upper-cased, so keyword case never splits a series.
    assert_eq!(
        observer.sink().sample_count(&[shape.as_str(), "select"]).unwrap(),
        0
    );
    // Looking up the lower-case series must not have created it.
    assert!(!registry.encode_text().unwrap().contains(r#"query_type="select""#));
}

#[test]
fn custom_buckets_from_config() {
    let registry = MetricsRegistry::new();
    let config =
        ObserverConfig::from_toml_str("[prometheus]\nsql_buckets = [0.01, 0.1, 1.0]").unwrap();
    let observer = install(&registry, &config).unwrap();

    for secs in [0.002, 0.02, 0.2, 2.0] {
        observer.on_query(&QueryEvent::from_secs_f64("INSERT INTO t VALUES (1)", secs));
    }

    assert_eq!(
        observer.sink().bucket_counts(&["INSERT"]).unwrap(),
        vec![(0.01, 1), (0.1, 2), (1.0, 3)]
    );
    assert_eq!(observer.sink().sample_count(&["INSERT"]).unwrap(), 4);
}

#[test]
fn reinstall_with_same_config_is_idempotent() {
    let registry = MetricsRegistry::new();
    let config = ObserverConfig::new().with_buckets(vec![0.1, 1.0]);

    let first = install(&registry, &config).unwrap();
    let second = install(&registry, &config).unwrap();
    first.on_query(&QueryEvent::new("SELECT 1", Duration::from_millis(1)));
    second.on_query(&QueryEvent::new("SELECT 2", Duration::from_millis(1)));

    assert_eq!(first.sink().sample_count(&["SELECT"]).unwrap(), 2);
    assert_eq!(first.sink().name(), METRIC_NAME);
}

#[test]
fn reinstall_with_other_buckets_fails_fast() {
    let registry = MetricsRegistry::new();
    install(&registry, &ObserverConfig::new().with_buckets(vec![0.1, 1.0])).unwrap();

    let err = install(&registry, &ObserverConfig::new().with_buckets(vec![0.5, 5.0]))
        .unwrap_err();
    assert!(matches!(err, MetricsError::RegistrationMismatch { .. }));
    assert!(err.is_fatal());
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[test]
fn parallel_observers_lose_no_samples() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    let registry = MetricsRegistry::new();
    let observer = install(
        &registry,
        &ObserverConfig::new().with_buckets(vec![0.001, 0.01, 0.1]),
    )
    .unwrap();

    // Thread i always records the same duration so the expected
    // distribution is known up front.
    let durations = [0.0005, 0.005, 0.05, 0.5];

    std::thread::scope(|s| {
        for i in 0..THREADS {
            let observer = &observer;
            let secs = durations[i % durations.len()];
            s.spawn(move || {
                for _ in 0..PER_THREAD {
                    observer.on_query(&QueryEvent::from_secs_f64("SELECT * FROM t", secs));
                }
            });
        }
    });

    let total = (THREADS * PER_THREAD) as u64;
    let per_duration = total / durations.len() as u64;
    assert_eq!(observer.sink().sample_count(&["SELECT"]).unwrap(), total);
    assert_eq!(
        observer.sink().bucket_counts(&["SELECT"]).unwrap(),
        vec![
            (0.001, per_duration),
            (0.01, per_duration * 2),
            (0.1, per_duration * 3),
        ]
    );

    let expected_sum: f64 = durations.iter().map(|d| d * per_duration as f64).sum();
    assert!((observer.sink().sample_sum(&["SELECT"]).unwrap() - expected_sum).abs() < 1e-6);
}

#[test]
fn concurrent_install_registers_once() {
    let registry = MetricsRegistry::new();
    let config = ObserverConfig::new().enable_full_query();

    let (registry_ref, config_ref) = (&registry, &config);
    let observers: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || install(registry_ref, config_ref).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for observer in &observers {
        observer.on_query(&QueryEvent::new(
            "DELETE FROM t WHERE id = 1",
            Duration::from_millis(1),
        ));
    }

    assert_eq!(
        observers[0]
            .sink()
            .sample_count(&["delete from t where id = ?", "DELETE"])
            .unwrap(),
        4
    );
}

//! Metric store integration tests
//!
//! Merge semantics observed through the public API.

#[cfg(test)]
mod tests {
    use crate::common::StoredMetricFactory;
    use crate::{assert_approx_eq, assert_err_variant};
    use metrics_relay::MetricsError;
    use metrics_relay::core::metrics::{Envelope, MetricStore, MetricValue};
    use std::sync::Arc;

    #[test]
    fn test_counter_sum_is_order_independent() {
        let deltas = [3_i64, 0, 17, 1, 42, 8];
        let expected: i64 = deltas.iter().sum();

        let forward = MetricStore::new();
        for d in deltas {
            forward.collect_value("Requests", MetricValue::Counter(d)).unwrap();
        }
        let backward = MetricStore::new();
        for d in deltas.iter().rev() {
            backward.collect_value("Requests", MetricValue::Counter(*d)).unwrap();
        }

        assert_eq!(forward.get("Requests").unwrap().value, MetricValue::Counter(expected));
        assert_eq!(forward.export(), backward.export());
    }

    #[test]
    fn test_concurrent_counters_lose_nothing() {
        let store = Arc::new(MetricStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store.collect("Hits", "counter", "1").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("Hits").unwrap().text(), "4000");
    }

    #[test]
    fn test_gauge_keeps_latest_value() {
        let store = MetricStore::new();
        for value in ["1.5", "0", "36.6", "37.1"] {
            store.collect("Temp", "gauge", value).unwrap();
        }
        match store.get("Temp").unwrap().value {
            MetricValue::Gauge(v) => assert_approx_eq!(v, 37.1),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_boundary_errors() {
        let store = MetricStore::new();
        assert_err_variant!(store.collect("", "counter", "1"), MetricsError::BadRequest);
        assert_err_variant!(store.collect("X", "histogram", "1"), MetricsError::NotImplemented);
        assert_err_variant!(store.collect("X", "counter", "-1"), MetricsError::BadRequest);
        assert_err_variant!(store.collect("X", "gauge", "-0.1"), MetricsError::BadRequest);
        assert_err_variant!(store.get("X"), MetricsError::NotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn test_apply_returns_total_for_counters() {
        let store = MetricStore::new();
        store.apply(&Envelope::counter("Requests", 5)).unwrap();
        let merged = store.apply(&Envelope::counter("Requests", 10)).unwrap();
        assert_eq!(merged, Envelope::counter("Requests", 15));
    }

    #[test]
    fn test_envelope_bytes_are_stable() {
        let store = MetricStore::new();
        store.collect("Temp", "gauge", "36.6").unwrap();
        let first = store.envelope("Temp").unwrap();
        let second = store.envelope("Temp").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_import_replaces_state_atomically() {
        let store = MetricStore::new();
        store.collect("Old", "counter", "1").unwrap();

        let bad = vec![
            StoredMetricFactory::counter("Requests", 15),
            StoredMetricFactory::gauge("Temp", -1.0),
        ];
        assert!(store.import(bad).is_err());
        assert_eq!(store.list(), vec!["Old"]);

        let good = vec![
            StoredMetricFactory::counter("Requests", 15),
            StoredMetricFactory::gauge("Temp", 37.1),
        ];
        store.import(good).unwrap();
        assert_eq!(store.list(), vec!["Requests", "Temp"]);
        assert_eq!(store.get("Requests").unwrap().text(), "15");
    }
}

//! Storage integration tests
//!
//! Both backends against the same snapshots, selected through configuration.

#[cfg(test)]
mod tests {
    use crate::common::StoredMetricFactory;
    use metrics_relay::config::{DatabaseConfig, StorageConfig};
    use metrics_relay::core::metrics::MetricStore;
    use metrics_relay::storage::{MetricsStorage, build_storage};
    use std::sync::Arc;

    fn sample_store() -> MetricStore {
        MetricStore::from_snapshot(vec![
            StoredMetricFactory::counter("Requests", 15),
            StoredMetricFactory::gauge("Temp", 37.1),
            StoredMetricFactory::gauge("Alloc", 1_048_576.0),
        ])
        .unwrap()
    }

    async fn roundtrip(storage: Arc<dyn MetricsStorage>) {
        let store = sample_store();
        storage.save(&store.export()).await.unwrap();

        let restored = MetricStore::from_snapshot(storage.restore().await.unwrap()).unwrap();
        assert_eq!(restored.export(), store.export());
        assert!(storage.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            file_storage_path: dir.path().join("snapshot.json").to_string_lossy().into_owned(),
            database: DatabaseConfig::default(),
        };

        let storage = build_storage(&config).await.unwrap();
        assert_eq!(storage.name(), "file");
        roundtrip(storage).await;
    }

    #[tokio::test]
    async fn test_database_backend_roundtrip() {
        let config = StorageConfig {
            database: DatabaseConfig {
                dsn: Some("sqlite::memory:".to_string()),
                ..DatabaseConfig::default()
            },
            ..StorageConfig::default()
        };

        let storage = build_storage(&config).await.unwrap();
        assert_eq!(storage.name(), "database");
        roundtrip(storage).await;
    }

    #[tokio::test]
    async fn test_missing_file_restores_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            file_storage_path: dir.path().join("never-written.json").to_string_lossy().into_owned(),
            database: DatabaseConfig::default(),
        };

        let storage = build_storage(&config).await.unwrap();
        assert!(storage.restore().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_later_save_replaces_earlier_one() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            file_storage_path: dir.path().join("snapshot.json").to_string_lossy().into_owned(),
            database: DatabaseConfig::default(),
        };
        let storage = build_storage(&config).await.unwrap();

        storage.save(&sample_store().export()).await.unwrap();
        storage
            .save(&[StoredMetricFactory::counter("Requests", 20)])
            .await
            .unwrap();

        let restored = storage.restore().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].counter_value, Some(20));
    }
}

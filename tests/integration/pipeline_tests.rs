//! Agent to server pipeline tests
//!
//! A real ingestion server on a loopback port, fed by the agent's sender.

#[cfg(test)]
mod tests {
    use crate::common::{server_settings, write_private_key};
    use metrics_relay::agent::{Sender, Transport};
    use metrics_relay::config::{DeliveryMode, ServerSettings};
    use metrics_relay::core::codec::MessageSealer;
    use metrics_relay::core::metrics::MetricStore;
    use metrics_relay::core::security::{HASH_HEADER, PayloadDecryptor, Signer};
    use metrics_relay::runner::{LifecycleState, ServerRunner};
    use metrics_relay::storage::{FileStorage, MetricsStorage};
    use metrics_relay::utils::error::{Backoff, RetryConfig, RetryPolicy};
    use sha2::{Digest, Sha256};
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn single_attempt() -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::from_millis(10)),
            jitter: false,
        })
    }

    fn base_url(settings: &ServerSettings) -> String {
        format!("http://{}", settings.server.address)
    }

    /// Run `client` against a live server, then shut the server down
    async fn with_server<F, Fut>(settings: ServerSettings, client: F)
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let url = base_url(&settings);
        let runner = ServerRunner::new(settings);
        let lifecycle = runner.lifecycle().clone();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = runner.run_until(async move {
            let _ = stop_rx.await;
        });
        let client = async move {
            lifecycle.reached(LifecycleState::Serving).await;
            client(url).await;
            let _ = stop_tx.send(());
        };

        let (result, ()) = tokio::join!(server, client);
        result.unwrap();
    }

    async fn get_text(url: String) -> (u16, String) {
        let response = reqwest::get(url).await.unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    #[tokio::test]
    async fn test_signed_encrypted_delivery_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (key, key_path) = write_private_key(dir.path());

        let mut settings = server_settings(dir.path());
        settings.server.store_interval = 0;
        settings.security.key = Some("k".to_string());
        settings.security.crypto_key = Some(key_path);
        settings.security.trusted_subnet = Some("127.0.0.0/8".to_string());

        let encryptor = PayloadDecryptor::new(key).encryptor();
        with_server(settings.clone(), |url| async move {
            let transport = Transport::new(
                url.clone(),
                MessageSealer::new(Some(Signer::new("k")), Some(encryptor)),
                Some("127.0.0.1".parse().unwrap()),
                single_attempt(),
                Duration::from_secs(5),
            )
            .unwrap();
            let store = Arc::new(MetricStore::new());
            let sender = Sender::new(store.clone(), Arc::new(transport), 1, DeliveryMode::Batch);

            store.collect("Requests", "counter", "5").unwrap();
            store.collect("Temp", "gauge", "36.6").unwrap();
            assert_eq!(sender.flush().await.unwrap(), 2);

            store.collect("Requests", "counter", "10").unwrap();
            store.collect("Temp", "gauge", "37.1").unwrap();
            sender.flush().await.unwrap();

            assert_eq!(
                get_text(format!("{}/value/counter/Requests", url)).await,
                (200, "15".to_string())
            );
            assert_eq!(
                get_text(format!("{}/value/gauge/Temp", url)).await,
                (200, "37.1".to_string())
            );
        })
        .await;

        let saved = FileStorage::new(&settings.storage.file_storage_path)
            .restore()
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);

        settings.server.address = crate::common::free_address();
        with_server(settings, |url| async move {
            assert_eq!(
                get_text(format!("{}/value/counter/Requests", url)).await,
                (200, "15".to_string())
            );
        })
        .await;
    }

    #[tokio::test]
    async fn test_wrong_signature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = server_settings(dir.path());
        settings.security.key = Some("k".to_string());

        with_server(settings, |url| async move {
            let client = reqwest::Client::new();
            let body = r#"{"id":"Temp","type":"gauge","value":36.6}"#;

            let response = client
                .post(format!("{}/update/", url))
                .header(HASH_HEADER, Signer::new("k").sign(b"tampered").unwrap())
                .body(body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 400);

            let signature = hex::encode(Sha256::digest(body.as_bytes()));
            assert_eq!(
                response.headers().get(HASH_HEADER).unwrap().to_str().unwrap(),
                signature
            );
            let response = client
                .post(format!("{}/update/", url))
                .header(HASH_HEADER, &signature)
                .body(body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 200);
            assert_eq!(
                response.headers().get(HASH_HEADER).unwrap().to_str().unwrap(),
                signature
            );
            assert_eq!(
                response.text().await.unwrap(),
                r#"{"id":"Temp","type":"gauge","value":36.6}"#
            );
        })
        .await;
    }

    #[tokio::test]
    async fn test_rejected_batch_is_not_counted_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        with_server(server_settings(dir.path()), |url| async move {
            let client = reqwest::Client::new();
            let response = client
                .post(format!("{}/update/counter/Zeta/1", url))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 200);

            let transport = Transport::new(
                url.clone(),
                MessageSealer::default(),
                None,
                single_attempt(),
                Duration::from_secs(5),
            )
            .unwrap();
            let store = Arc::new(MetricStore::new());
            let sender = Sender::new(store.clone(), Arc::new(transport), 1, DeliveryMode::Batch);
            store.collect("PollCount", "counter", "5").unwrap();
            store.collect("Zeta", "gauge", "1.0").unwrap();

            for _ in 0..3 {
                assert!(sender.flush().await.is_err());
            }
            assert_eq!(sender.ledger().acknowledged("PollCount"), 0);
            assert_eq!(
                get_text(format!("{}/value/counter/PollCount", url)).await.0,
                404
            );
            assert_eq!(
                get_text(format!("{}/value/counter/Zeta", url)).await,
                (200, "1".to_string())
            );
        })
        .await;
    }

    #[tokio::test]
    async fn test_per_metric_delivery() {
        let dir = tempfile::tempdir().unwrap();
        with_server(server_settings(dir.path()), |url| async move {
            let transport = Transport::new(
                url.clone(),
                MessageSealer::default(),
                None,
                single_attempt(),
                Duration::from_secs(5),
            )
            .unwrap();
            let store = Arc::new(MetricStore::new());
            let sender = Sender::new(store.clone(), Arc::new(transport), 2, DeliveryMode::PerMetric);

            store.collect("PollCount", "counter", "3").unwrap();
            store.collect("RandomValue", "gauge", "0.25").unwrap();
            assert_eq!(sender.flush().await.unwrap(), 2);
            assert_eq!(sender.ledger().acknowledged("PollCount"), 3);

            let (status, html) = get_text(format!("{}/", url)).await;
            assert_eq!(status, 200);
            assert!(html.contains("PollCount"));
            assert!(html.contains("RandomValue"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_replayed_batch_applied_once() {
        let dir = tempfile::tempdir().unwrap();
        with_server(server_settings(dir.path()), |url| async move {
            let client = reqwest::Client::new();
            for _ in 0..2 {
                let response = client
                    .post(format!("{}/updates/", url))
                    .header("Idempotency-Key", "0d6f7a4e-5d1c-4b55-9a61-3f0c2f1e8a90")
                    .body(r#"[{"id":"Requests","type":"counter","delta":5}]"#)
                    .send()
                    .await
                    .unwrap();
                assert_eq!(response.status().as_u16(), 200);
            }

            assert_eq!(
                get_text(format!("{}/value/counter/Requests", url)).await,
                (200, "5".to_string())
            );
        })
        .await;
    }

    #[tokio::test]
    async fn test_ping_with_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        with_server(server_settings(dir.path()), |url| async move {
            assert_eq!(
                get_text(format!("{}/ping", url)).await,
                (200, "pong".to_string())
            );
        })
        .await;
    }

    #[tokio::test]
    async fn test_diagnostics_listener() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = server_settings(dir.path());
        let diagnostics = crate::common::free_address();
        settings.server.diagnostics_address = Some(diagnostics.clone());

        with_server(settings, |_| async move {
            let report: serde_json::Value = reqwest::get(format!("http://{}/debug/status", diagnostics))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(report["data"]["state"], "serving");
            assert_eq!(report["data"]["storage"], "file");
        })
        .await;
    }
}

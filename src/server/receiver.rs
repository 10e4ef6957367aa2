//! Inbound message handling
//!
//! [`Receiver`] turns an HTTP body into store updates: open the message
//! (decrypt, verify), apply it, and persist synchronously when configured.
//! Requests carrying an `Idempotency-Key` are applied once per TTL window;
//! a replay gets the first response back.

use crate::core::codec::MessageOpener;
use crate::core::metrics::{Envelope, MetricStore};
use crate::runner::persistence::PersistenceManager;
use crate::utils::error::{MetricsError, Result};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result of a body ingestion
#[derive(Debug, Clone)]
pub struct Ingested {
    /// JSON response body
    pub body: Arc<String>,
    /// Digest to echo in the `HashSHA256` response header
    pub digest: Option<String>,
    /// Whether this response was served from the replay cache
    pub replayed: bool,
}

pub struct Receiver {
    store: Arc<MetricStore>,
    opener: MessageOpener,
    persistence: Arc<PersistenceManager>,
    replay: Cache<String, Arc<String>>,
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("encrypted", &self.opener.is_encrypted())
            .field("replay_entries", &self.replay.entry_count())
            .finish()
    }
}

impl Receiver {
    pub fn new(
        store: Arc<MetricStore>,
        opener: MessageOpener,
        persistence: Arc<PersistenceManager>,
        replay_ttl: Duration,
        replay_capacity: u64,
    ) -> Self {
        let replay = Cache::builder()
            .max_capacity(replay_capacity)
            .time_to_live(replay_ttl)
            .build();
        Self {
            store,
            opener,
            persistence,
            replay,
        }
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// `POST /update/{type}/{name}/{value}`
    pub async fn ingest_text(&self, kind: &str, id: &str, raw: &str) -> Result<String> {
        let metric = self.store.collect(id, kind, raw)?;
        self.persistence.after_update().await;
        Ok(metric.text())
    }

    /// `POST /update/` with a single JSON envelope
    pub async fn ingest_one(
        &self,
        body: &[u8],
        signature: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> Result<Ingested> {
        self.ingest("update", body, signature, idempotency_key, |store, plaintext| {
            let envelope: Envelope = serde_json::from_slice(plaintext)?;
            let merged = store.apply(&envelope)?;
            Ok(serde_json::to_string(&merged)?)
        })
        .await
    }

    /// `POST /updates/` with a JSON array
    ///
    /// The batch is applied as one unit: the first failing envelope aborts it
    /// and nothing from it is kept.
    pub async fn ingest_batch(
        &self,
        body: &[u8],
        signature: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> Result<Ingested> {
        self.ingest("updates", body, signature, idempotency_key, |store, plaintext| {
            let envelopes: Vec<Envelope> = serde_json::from_slice(plaintext)?;
            if envelopes.is_empty() {
                return Err(MetricsError::bad_request("Empty batch"));
            }
            let merged = store.apply_batch(&envelopes)?;
            Ok(serde_json::to_string(&merged)?)
        })
        .await
    }

    async fn ingest<F>(
        &self,
        route: &str,
        body: &[u8],
        signature: Option<&str>,
        idempotency_key: Option<&str>,
        apply: F,
    ) -> Result<Ingested>
    where
        F: FnOnce(&MetricStore, &[u8]) -> Result<String>,
    {
        let opened = self.opener.open(body, signature)?;

        let key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());
        let Some(key) = key else {
            let body = apply(self.store.as_ref(), opened.plaintext.as_slice())?;
            self.persistence.after_update().await;
            return Ok(Ingested {
                body: Arc::new(body),
                digest: opened.digest,
                replayed: false,
            });
        };

        let mut applied = false;
        let body = self
            .replay
            .try_get_with(format!("{}:{}", route, key), async {
                let body = apply(self.store.as_ref(), opened.plaintext.as_slice())?;
                applied = true;
                self.persistence.after_update().await;
                Ok::<_, MetricsError>(Arc::new(body))
            })
            .await
            .map_err(MetricsError::Shared)?;

        if !applied {
            debug!("Replayed {} request with key {}", route, key);
        }

        Ok(Ingested {
            body,
            digest: opened.digest,
            replayed: !applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::MetricKind;
    use crate::core::security::Signer;
    use crate::storage::MockMetricsStorage;

    fn receiver(opener: MessageOpener) -> Receiver {
        let store = Arc::new(MetricStore::new());
        let persistence = Arc::new(PersistenceManager::new(
            store.clone(),
            Arc::new(MockMetricsStorage::new()),
            Duration::from_secs(300),
        ));
        Receiver::new(store, opener, persistence, Duration::from_secs(60), 100)
    }

    #[tokio::test]
    async fn test_ingest_one_returns_total() {
        let receiver = receiver(MessageOpener::default());
        receiver
            .ingest_one(br#"{"id":"Requests","type":"counter","delta":5}"#, None, None)
            .await
            .unwrap();
        let out = receiver
            .ingest_one(br#"{"id":"Requests","type":"counter","delta":10}"#, None, None)
            .await
            .unwrap();

        assert_eq!(out.body.as_str(), r#"{"id":"Requests","type":"counter","delta":15}"#);
        assert!(out.digest.is_none());
    }

    #[tokio::test]
    async fn test_replay_is_applied_once() {
        let receiver = receiver(MessageOpener::default());
        let body = br#"[{"id":"Requests","type":"counter","delta":5}]"#;

        let first = receiver.ingest_batch(body, None, Some("key-1")).await.unwrap();
        let second = receiver.ingest_batch(body, None, Some("key-1")).await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.body, second.body);
        assert_eq!(receiver.store().get("Requests").unwrap().text(), "5");

        receiver.ingest_batch(body, None, Some("key-2")).await.unwrap();
        assert_eq!(receiver.store().get("Requests").unwrap().text(), "10");
    }

    #[tokio::test]
    async fn test_failed_request_is_not_cached() {
        let receiver = receiver(MessageOpener::default());

        let err = receiver
            .ingest_one(br#"{"id":"Temp","type":"gauge","value":-1}"#, None, Some("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::Shared(ref inner) if matches!(**inner, MetricsError::BadRequest(_))));

        receiver
            .ingest_one(br#"{"id":"Temp","type":"gauge","value":1.5}"#, None, Some("k"))
            .await
            .unwrap();
        assert_eq!(receiver.store().get("Temp").unwrap().kind(), MetricKind::Gauge);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_store_untouched() {
        let receiver = receiver(MessageOpener::default());
        let body = br#"[
            {"id":"A","type":"counter","delta":1},
            {"id":"B","type":"histogram","value":1},
            {"id":"C","type":"counter","delta":1}
        ]"#;

        let err = receiver.ingest_batch(body, None, None).await.unwrap_err();
        assert!(matches!(err, MetricsError::NotImplemented(_)));
        assert!(receiver.store().is_empty());
    }

    #[tokio::test]
    async fn test_signature_checked_before_apply() {
        let signer = Signer::new("k");
        let receiver = receiver(MessageOpener::new(Some(signer.clone()), None, false));
        let body = br#"{"id":"Temp","type":"gauge","value":36.6}"#;

        let err = receiver.ingest_one(body, Some("deadbeef"), None).await.unwrap_err();
        assert!(matches!(err, MetricsError::SignatureMismatch { .. }));
        assert!(receiver.store().is_empty());

        let signature = signer.sign(body).unwrap();
        let out = receiver.ingest_one(body, Some(&signature), None).await.unwrap();
        assert_eq!(out.digest.as_deref(), Some(signature.as_str()));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let receiver = receiver(MessageOpener::default());
        let err = receiver.ingest_batch(b"[]", None, None).await.unwrap_err();
        assert!(matches!(err, MetricsError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_text_update() {
        let receiver = receiver(MessageOpener::default());
        assert_eq!(receiver.ingest_text("gauge", "Temp", "36.6").await.unwrap(), "36.6");
        assert!(matches!(
            receiver.ingest_text("unknown", "Temp", "1").await,
            Err(MetricsError::NotImplemented(_))
        ));
    }
}

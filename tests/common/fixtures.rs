//! Test fixtures and data factories

use metrics_relay::config::ServerSettings;
use metrics_relay::core::metrics::{MetricKind, StoredMetric};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use std::net::TcpListener;
use std::path::{Path, PathBuf};

/// A loopback address nobody is listening on
pub fn free_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener
        .local_addr()
        .expect("local address")
        .to_string()
}

/// Server settings with file storage under `dir` and a free port
pub fn server_settings(dir: &Path) -> ServerSettings {
    let mut settings = ServerSettings::default();
    settings.server.address = free_address();
    settings.server.workers = Some(1);
    settings.server.shutdown_timeout = 2;
    settings.storage.file_storage_path = dir.join("metrics.json").to_string_lossy().into_owned();
    settings
}

/// Generate a small RSA key and write it as PKCS#8 PEM under `dir`
pub fn write_private_key(dir: &Path) -> (RsaPrivateKey, PathBuf) {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("generate key");
    let pem = key.to_pkcs8_pem(LineEnding::LF).expect("encode key");
    let path = dir.join("private.pem");
    std::fs::write(&path, pem.as_bytes()).expect("write key");
    (key, path)
}

/// Factory for persistence records
pub struct StoredMetricFactory;

impl StoredMetricFactory {
    pub fn counter(id: &str, value: i64) -> StoredMetric {
        StoredMetric {
            id: id.to_string(),
            kind: MetricKind::Counter,
            counter_value: Some(value),
            gauge_value: None,
            text_value: None,
        }
    }

    pub fn gauge(id: &str, value: f64) -> StoredMetric {
        StoredMetric {
            id: id.to_string(),
            kind: MetricKind::Gauge,
            counter_value: None,
            gauge_value: Some(value),
            text_value: None,
        }
    }
}

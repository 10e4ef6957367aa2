//! JSON file backend

use super::MetricsStorage;
use crate::core::metrics::StoredMetric;
use crate::utils::error::{MetricsError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps the latest snapshot as one JSON array in a file
///
/// Saves go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

#[async_trait]
impl MetricsStorage for FileStorage {
    async fn save(&self, metrics: &[StoredMetric]) -> Result<()> {
        if let Some(parent) = self.parent_dir() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut content = serde_json::to_vec(metrics)?;
        content.push(b'\n');

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} metrics to {}", metrics.len(), self.path.display());
        Ok(())
    }

    async fn restore(&self) -> Result<Vec<StoredMetric>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(content.trim())?)
    }

    async fn ping(&self) -> Result<()> {
        match self.parent_dir() {
            Some(parent) if !parent.is_dir() => Err(MetricsError::internal(format!(
                "Storage directory {} does not exist",
                parent.display()
            ))),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

use crate::core::metrics::StoredMetric;
use crate::storage::MetricsStorage;
use crate::utils::error::{MetricsError, Result};
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{debug, warn};

use super::super::entities::metric;
use super::types::DatabaseStorage;

/// Rows per upsert statement; four bind parameters each
pub(crate) const UPSERT_CHUNK_SIZE: usize = 1000;

impl DatabaseStorage {
    /// Upsert every record inside one transaction
    async fn upsert_metrics(&self, metrics: &[StoredMetric]) -> Result<()> {
        let txn = self.db.begin().await?;
        for chunk in metrics.chunks(UPSERT_CHUNK_SIZE) {
            let rows = chunk.iter().map(|m| metric::ActiveModel {
                id: Set(m.id.clone()),
                mtype: Set(m.kind.to_string()),
                delta: Set(m.counter_value),
                mvalue: Set(m.gauge_value),
            });

            metric::Entity::insert_many(rows)
                .on_conflict(
                    OnConflict::column(metric::Column::Id)
                        .update_columns([
                            metric::Column::Mtype,
                            metric::Column::Delta,
                            metric::Column::Mvalue,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(())
    }
}

impl TryFrom<metric::Model> for StoredMetric {
    type Error = MetricsError;

    fn try_from(row: metric::Model) -> Result<Self> {
        Ok(StoredMetric {
            kind: row.mtype.parse()?,
            counter_value: row.delta,
            gauge_value: row.mvalue,
            text_value: None,
            id: row.id,
        })
    }
}

#[async_trait]
impl MetricsStorage for DatabaseStorage {
    async fn save(&self, metrics: &[StoredMetric]) -> Result<()> {
        if metrics.is_empty() {
            debug!("Nothing to save");
            return Ok(());
        }

        self.retry
            .call_if(|| self.upsert_metrics(metrics), MetricsError::is_transient)
            .await
            .inspect_err(|e| warn!("Saving {} metrics failed: {}", metrics.len(), e))?;

        debug!("Saved {} metrics to database", metrics.len());
        Ok(())
    }

    async fn restore(&self) -> Result<Vec<StoredMetric>> {
        let rows = metric::Entity::find()
            .order_by_asc(metric::Column::Id)
            .all(&self.db)
            .await?;

        rows.into_iter().map(StoredMetric::try_from).collect()
    }

    async fn ping(&self) -> Result<()> {
        self.health_check().await
    }

    fn name(&self) -> &'static str {
        "database"
    }
}

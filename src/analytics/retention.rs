//! Retention sweep
//!
//! The explicit garbage-collection hook for the ledger: without it, dead
//! links and their click events accumulate forever. Deletes run in bounded
//! batches so the sweep never holds a long transaction against the
//! redirect path.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::{error, info, warn};

use crate::storage::SeaOrmStore;
use migration::entities::{click_event, short_link};

#[derive(Debug, Default)]
pub struct SweepReport {
    /// Expired links deleted (their click events cascade)
    pub links_deleted: u64,
    /// Click events pruned by age
    pub events_deleted: u64,
}

pub struct RetentionTask {
    storage: Arc<SeaOrmStore>,
    click_retention_days: u64,
    expired_link_grace_days: u64,
    sweep_interval: StdDuration,
    batch_size: u64,
}

impl RetentionTask {
    pub fn from_config(storage: Arc<SeaOrmStore>) -> Self {
        let config = crate::config::get_config();
        Self {
            storage,
            click_retention_days: config.retention.click_retention_days,
            expired_link_grace_days: config.retention.expired_link_grace_days,
            sweep_interval: StdDuration::from_secs(config.retention.sweep_interval_secs),
            batch_size: config.retention.batch_size,
        }
    }

    /// Periodic sweep; run as a background task.
    pub async fn run_loop(&self) {
        loop {
            tokio::time::sleep(self.sweep_interval).await;
            if let Err(e) = self.run_sweep().await {
                error!("Retention sweep failed: {}", e);
            }
        }
    }

    /// Run one full sweep.
    pub async fn run_sweep(&self) -> anyhow::Result<SweepReport> {
        let mut report = SweepReport::default();

        match self.sweep_expired_links().await {
            Ok(deleted) => report.links_deleted = deleted,
            Err(e) => error!("Failed to sweep expired links: {}", e),
        }

        match self.sweep_old_events().await {
            Ok(deleted) => report.events_deleted = deleted,
            Err(e) => error!("Failed to prune click events: {}", e),
        }

        info!(
            "Retention sweep completed: {} links, {} click events",
            report.links_deleted, report.events_deleted
        );

        Ok(report)
    }

    /// Delete links whose expiry is older than the grace window. The grace
    /// window keeps recently expired links visible to stats before they
    /// disappear for good.
    async fn sweep_expired_links(&self) -> anyhow::Result<u64> {
        let db = self.storage.get_db();
        let cutoff = Utc::now() - Duration::days(self.expired_link_grace_days as i64);

        let mut total_deleted = 0u64;
        let mut iterations = 0;
        let max_iterations = 1000;

        loop {
            if iterations >= max_iterations {
                warn!(
                    "Expired-link sweep reached max iterations {} (deleted {} rows)",
                    max_iterations, total_deleted
                );
                break;
            }

            let ids_to_delete: Vec<String> = short_link::Entity::find()
                .select_only()
                .column(short_link::Column::Id)
                .filter(short_link::Column::ExpiresAt.is_not_null())
                .filter(short_link::Column::ExpiresAt.lte(cutoff))
                .order_by_asc(short_link::Column::ExpiresAt)
                .limit(self.batch_size)
                .into_tuple::<String>()
                .all(db)
                .await?;

            if ids_to_delete.is_empty() {
                break;
            }

            let result = short_link::Entity::delete_many()
                .filter(short_link::Column::Id.is_in(ids_to_delete))
                .exec(db)
                .await?;

            total_deleted += result.rows_affected;
            iterations += 1;

            if result.rows_affected < self.batch_size {
                break;
            }
        }

        Ok(total_deleted)
    }

    /// Prune click events older than the retention window, regardless of
    /// whether their link is still alive.
    async fn sweep_old_events(&self) -> anyhow::Result<u64> {
        let db = self.storage.get_db();
        let cutoff = Utc::now() - Duration::days(self.click_retention_days as i64);

        let mut total_deleted = 0u64;
        let mut iterations = 0;
        let max_iterations = 1000;

        loop {
            if iterations >= max_iterations {
                warn!(
                    "Click-event prune reached max iterations {} (deleted {} rows)",
                    max_iterations, total_deleted
                );
                break;
            }

            let ids_to_delete: Vec<i64> = click_event::Entity::find()
                .select_only()
                .column(click_event::Column::Id)
                .filter(click_event::Column::ClickedAt.lt(cutoff))
                .order_by_asc(click_event::Column::Id)
                .limit(self.batch_size)
                .into_tuple::<i64>()
                .all(db)
                .await?;

            if ids_to_delete.is_empty() {
                break;
            }

            let result = click_event::Entity::delete_many()
                .filter(click_event::Column::Id.is_in(ids_to_delete))
                .exec(db)
                .await?;

            total_deleted += result.rows_affected;
            iterations += 1;

            if result.rows_affected < self.batch_size {
                break;
            }
        }

        Ok(total_deleted)
    }
}

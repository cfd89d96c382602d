//! Click ledger operations
//!
//! The storage backend doubles as the [`ClickSink`] the recorder drains
//! into, and answers the count queries the stats aggregator needs.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use tracing::{debug, warn};

use super::{SeaOrmStore, retry};
use crate::analytics::{ClickEvent, ClickSink};
use crate::errors::{LinkforgeError, Result};

use migration::entities::{click_event, short_link};

#[async_trait]
impl ClickSink for SeaOrmStore {
    async fn flush_events(&self, events: Vec<ClickEvent>) -> anyhow::Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let total = events.len();
        let db = &self.db;

        // A link can be deleted between resolve and flush; its buffered
        // events reference an id that no longer exists. Partition on the
        // current link set, drop the orphans with a warning, and never
        // surface them (the client already has their redirect).
        let mut ids: Vec<String> = events.iter().map(|e| e.link_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let known: HashSet<String> = retry::with_retry_timeout(
            "flush_events(check_links)",
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                short_link::Entity::find()
                    .select_only()
                    .column(short_link::Column::Id)
                    .filter(short_link::Column::Id.is_in(ids.clone()))
                    .into_tuple::<String>()
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to check link ids for flush: {}", e))?
        .into_iter()
        .collect();

        let (keep, orphaned): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|e| known.contains(&e.link_id));

        if !orphaned.is_empty() {
            // Logged, never surfaced: the clients behind these events got
            // their redirects long ago
            warn!(
                "{}",
                LinkforgeError::unknown_link(format!(
                    "Dropping {} click events whose links no longer exist",
                    orphaned.len()
                ))
            );
        }

        if keep.is_empty() {
            return Ok(());
        }

        let models: Vec<click_event::ActiveModel> = keep
            .iter()
            .map(|event| click_event::ActiveModel {
                link_id: Set(event.link_id.clone()),
                clicked_at: Set(event.clicked_at),
                addr: Set(event.context.addr.clone()),
                agent: Set(event.context.agent.clone()),
                referer: Set(event.context.referer.clone()),
                ..Default::default()
            })
            .collect();

        retry::with_retry_timeout(
            "flush_events(insert)",
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                click_event::Entity::insert_many(models.clone())
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to append click events: {}", e))?;

        debug!(
            "Click ledger appended to {} database ({} of {} events)",
            self.backend_name.to_uppercase(),
            models.len(),
            total
        );

        Ok(())
    }
}

impl SeaOrmStore {
    /// Total recorded events for a link.
    pub async fn count_clicks(&self, link_id: &str) -> Result<u64> {
        let db = &self.db;
        let id_owned = link_id.to_string();

        retry::with_retry_timeout(
            "count_clicks",
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                click_event::Entity::find()
                    .filter(click_event::Column::LinkId.eq(&id_owned))
                    .count(db)
                    .await
            },
        )
        .await
        .map_err(|e| self.map_store_err("count_clicks", e))
    }

    /// Events recorded after `since`, for windowed stats.
    pub async fn count_clicks_since(
        &self,
        link_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let db = &self.db;
        let id_owned = link_id.to_string();

        retry::with_retry_timeout(
            "count_clicks_since",
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                click_event::Entity::find()
                    .filter(click_event::Column::LinkId.eq(&id_owned))
                    .filter(click_event::Column::ClickedAt.gt(since))
                    .count(db)
                    .await
            },
        )
        .await
        .map_err(|e| self.map_store_err("count_clicks_since", e))
    }
}

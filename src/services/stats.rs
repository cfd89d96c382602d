//! Statistics aggregation service
//!
//! Read-only combination of the link store and the click ledger. Counts
//! reflect flushed events: a click is visible here once the recorder's
//! write-behind buffer has drained, not at the instant of the redirect.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::Result;
use crate::storage::SeaOrmStore;

/// Aggregated view of one short link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStats {
    pub short_code: String,
    pub original_url: String,
    pub total_clicks: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct StatsAggregator {
    storage: Arc<SeaOrmStore>,
}

impl StatsAggregator {
    pub fn new(storage: Arc<SeaOrmStore>) -> Self {
        Self { storage }
    }

    /// Stats for a code, expired links included. `NotFound` only when the
    /// code never existed (or was swept).
    pub async fn get_stats(&self, short_code: &str) -> Result<LinkStats> {
        let link = self.storage.get_by_code(short_code).await?;
        let total_clicks = self.storage.count_clicks(&link.id).await?;

        Ok(LinkStats {
            short_code: link.short_code,
            original_url: link.original_url,
            total_clicks,
            created_at: link.created_at,
            expires_at: link.expires_at,
        })
    }

    /// Clicks recorded after `since` ("clicks in the last 24h" style
    /// windows).
    pub async fn clicks_since(&self, short_code: &str, since: DateTime<Utc>) -> Result<u64> {
        let link = self.storage.get_by_code(short_code).await?;
        self.storage.count_clicks_since(&link.id, since).await
    }
}

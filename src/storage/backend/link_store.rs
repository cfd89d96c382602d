//! Link store operations
//!
//! Creation goes through a single atomic INSERT guarded by the unique
//! index on `short_code`: under concurrent creators racing on the same
//! freshly generated code, exactly one insert lands and the rest see a
//! conflict. There is no existence check before the insert anywhere in
//! this module.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, sea_query::OnConflict};
use tracing::{debug, info};
use uuid::Uuid;

use super::{SeaOrmStore, retry};
use crate::errors::{LinkforgeError, Result};
use crate::storage::ShortLink;

use super::converters::{link_to_active_model, model_to_short_link};

use migration::entities::short_link;

/// Outcome of a single conditional insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another row already holds the code; the caller decides whether the
    /// holder can be reclaimed or a fresh code is needed.
    Conflict,
}

impl SeaOrmStore {
    /// Atomically insert a new link under `short_code`.
    ///
    /// Fails with `DuplicateCode` when the code already denotes a live
    /// link. A conflicting row whose link has expired is reclaimed: the
    /// dead row is deleted (its click events cascade) and the insert is
    /// tried once more.
    pub async fn insert(
        &self,
        short_code: &str,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink> {
        let link = ShortLink {
            id: Uuid::new_v4().to_string(),
            short_code: short_code.to_string(),
            original_url: original_url.to_string(),
            created_at: Utc::now(),
            expires_at,
        };

        match self.try_insert(&link).await? {
            InsertOutcome::Inserted => {
                info!("Short link created: {} -> {}", link.short_code, link.original_url);
                Ok(link)
            }
            InsertOutcome::Conflict => {
                if !self.reclaim_expired(short_code).await? {
                    return Err(LinkforgeError::duplicate_code(format!(
                        "Code '{}' already denotes a live link",
                        short_code
                    )));
                }
                debug!("Reclaimed expired holder of code '{}'", short_code);
                // A racing creator can still win the code between the
                // reclaim and this re-insert; that surfaces as a plain
                // duplicate and the service retries with a fresh code.
                match self.try_insert(&link).await? {
                    InsertOutcome::Inserted => {
                        info!(
                            "Short link created on reclaimed code: {} -> {}",
                            link.short_code, link.original_url
                        );
                        Ok(link)
                    }
                    InsertOutcome::Conflict => Err(LinkforgeError::duplicate_code(format!(
                        "Code '{}' was re-taken while reclaiming",
                        short_code
                    ))),
                }
            }
        }
    }

    /// One conditional insert: `ON CONFLICT DO NOTHING` on the code's
    /// unique index, reported as an outcome instead of an error.
    async fn try_insert(&self, link: &ShortLink) -> Result<InsertOutcome> {
        let db = &self.db;
        let active_model = link_to_active_model(link);

        let result = retry::with_retry_timeout(
            &format!("insert({})", link.short_code),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                short_link::Entity::insert(active_model.clone())
                    .on_conflict(
                        OnConflict::column(short_link::Column::ShortCode)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec(db)
                    .await
            },
        )
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(retry::RetryError::Db(DbErr::RecordNotInserted)) => Ok(InsertOutcome::Conflict),
            Err(e) => Err(self.map_store_err("insert", e)),
        }
    }

    /// Delete the holder of `short_code` if (and only if) it has expired.
    /// The condition lives in the WHERE clause, so a live holder is never
    /// touched even under concurrent calls. Returns whether a row died.
    async fn reclaim_expired(&self, short_code: &str) -> Result<bool> {
        let db = &self.db;
        let code_owned = short_code.to_string();
        let now = Utc::now();

        let result = retry::with_retry_timeout(
            &format!("reclaim_expired({})", short_code),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                short_link::Entity::delete_many()
                    .filter(short_link::Column::ShortCode.eq(&code_owned))
                    .filter(short_link::Column::ExpiresAt.is_not_null())
                    .filter(short_link::Column::ExpiresAt.lte(now))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| self.map_store_err("reclaim_expired", e))?;

        Ok(result.rows_affected > 0)
    }

    /// Lookup for the redirect path: expired links read as dead.
    pub async fn resolve(&self, short_code: &str) -> Result<ShortLink> {
        let link = self.get_by_code(short_code).await?;
        if link.is_expired_at(Utc::now()) {
            return Err(LinkforgeError::expired(format!(
                "Short link expired: {}",
                short_code
            )));
        }
        Ok(link)
    }

    /// Unconditional lookup by code, expiry ignored (stats/admin path).
    pub async fn get_by_code(&self, short_code: &str) -> Result<ShortLink> {
        let db = &self.db;
        let code_owned = short_code.to_string();

        let model = retry::with_retry_timeout(
            &format!("get_by_code({})", short_code),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                short_link::Entity::find()
                    .filter(short_link::Column::ShortCode.eq(&code_owned))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| self.map_store_err("get_by_code", e))?;

        model.map(model_to_short_link).ok_or_else(|| {
            LinkforgeError::not_found(format!("Short link not found: {}", short_code))
        })
    }

    /// Point lookup by opaque id.
    pub async fn get_by_id(&self, id: &str) -> Result<ShortLink> {
        let db = &self.db;
        let id_owned = id.to_string();

        let model = retry::with_retry_timeout(
            "get_by_id",
            self.retry_config,
            self.operation_timeout_ms,
            || async { short_link::Entity::find_by_id(&id_owned).one(db).await },
        )
        .await
        .map_err(|e| self.map_store_err("get_by_id", e))?;

        model
            .map(model_to_short_link)
            .ok_or_else(|| LinkforgeError::not_found(format!("Short link not found: id={}", id)))
    }

    /// Delete a link by code. Its click events cascade.
    pub async fn remove(&self, short_code: &str) -> Result<()> {
        let db = &self.db;
        let code_owned = short_code.to_string();

        let result = retry::with_retry_timeout(
            &format!("remove({})", short_code),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                short_link::Entity::delete_many()
                    .filter(short_link::Column::ShortCode.eq(&code_owned))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| self.map_store_err("remove", e))?;

        if result.rows_affected == 0 {
            return Err(LinkforgeError::not_found(format!(
                "Short link not found: {}",
                short_code
            )));
        }

        info!("Short link deleted: {}", short_code);
        Ok(())
    }
}

//! SeaORM storage backend
//!
//! Durable link store and click ledger over SQLite, MySQL/MariaDB, or
//! PostgreSQL. Short-code uniqueness is enforced by the database, never by
//! a check-then-insert in application code.

mod click_store;
mod connection;
mod converters;
mod link_store;
pub mod retry;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::analytics::ClickSink;
use crate::errors::{LinkforgeError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{link_to_active_model, model_to_short_link};
pub use link_store::InsertOutcome;

/// Infer the database flavor from a connection URL
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(LinkforgeError::database_config(format!(
            "Cannot infer database flavor from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
    /// Per-operation budget; exhaustion surfaces as StoreUnavailable.
    operation_timeout_ms: u64,
}

impl SeaOrmStore {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(LinkforgeError::database_config(
                "database_url is not set".to_string(),
            ));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let storage = SeaOrmStore {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
            operation_timeout_ms: config.database.operation_timeout_ms,
        };

        run_migrations(&storage.db).await?;

        warn!(
            "{} storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn get_backend_name(&self) -> &str {
        &self.backend_name
    }

    /// The ledger side of this store, as a sink for the click recorder.
    pub fn as_click_sink(self: &Arc<Self>) -> Arc<dyn ClickSink> {
        Arc::clone(self) as Arc<dyn ClickSink>
    }

    /// Raw connection access for maintenance paths (retention sweep).
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Map a retry executor failure to the crate error taxonomy: timeouts
    /// and connection loss become the coarse StoreUnavailable, everything
    /// else stays a database operation error.
    fn map_store_err(&self, operation: &str, err: retry::RetryError) -> LinkforgeError {
        match err {
            retry::RetryError::TimedOut { timeout_ms, .. } => LinkforgeError::store_unavailable(
                format!("{} timed out after {}ms", operation, timeout_ms),
            ),
            retry::RetryError::Db(e) if retry::is_connection_error(&e) => {
                LinkforgeError::store_unavailable(format!("{} failed: {}", operation, e))
            }
            retry::RetryError::Db(e) => {
                LinkforgeError::database_operation(format!("{} failed: {}", operation, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://links.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("links.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mysql://root@localhost/links").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("mariadb://root@localhost/links").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgres://root@localhost/links").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("mongodb://nope").is_err());
    }
}

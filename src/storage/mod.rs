use std::sync::Arc;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStore;
pub use models::ShortLink;

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create() -> Result<Arc<SeaOrmStore>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        // Infer the database flavor from the URL
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = SeaOrmStore::new(database_url, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}

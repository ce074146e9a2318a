//! Storage implementations.

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::{Result, Store};

#[cfg(feature = "sqlite")]
pub(crate) mod helpers;
pub mod mock;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use mock::MockStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn Store>> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory (data is lost on exit)");
            Ok(Arc::new(MockStore::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(url = %config.sqlite.url, "Storage: sqlite");
            if let Some(path) = config.sqlite.url.strip_prefix("sqlite://") {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        crate::interfaces::StorageError::Unavailable(format!(
                            "cannot create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            let store =
                SqliteStore::connect(&config.sqlite.url, config.sqlite.max_connections).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => Err(crate::interfaces::StorageError::Unavailable(
            "SQLite storage requested but 'sqlite' feature is not enabled".to_string(),
        )),
    }
}

//! Product catalogue storage interface.

use async_trait::async_trait;
use uuid::Uuid;

use super::Result;
use crate::model::Product;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Replace a product. `StorageError::NotFound` if absent.
    async fn update_product(&self, product: &Product) -> Result<()>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;

    /// List products ordered by name.
    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>>;
}

//! Product catalogue.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::interfaces::Store;
use crate::model::money::round_money;
use crate::model::Product;

use super::require_admin;

/// Fields of a product an administrator can set.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub proxy_type: String,
    pub unit_price: Decimal,
    pub unit_size: u32,
    pub allocation_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewProduct {
    fn validate(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let proxy_type = self.proxy_type.trim().to_string();
        let allocation_id = self.allocation_id.trim().to_string();
        if name.is_empty() || proxy_type.is_empty() || allocation_id.is_empty() {
            return Err(ServiceError::invalid(
                "name, proxy_type and allocation_id are required",
            ));
        }
        let unit_price = round_money(self.unit_price);
        if unit_price <= Decimal::ZERO {
            return Err(ServiceError::invalid("unit_price must be positive"));
        }
        if self.unit_size == 0 {
            return Err(ServiceError::invalid("unit_size must be positive"));
        }
        Ok(Self {
            name,
            proxy_type,
            unit_price,
            unit_size: self.unit_size,
            allocation_id,
            active: self.active,
        })
    }

    fn into_product(self, id: Uuid) -> Product {
        Product {
            id,
            name: self.name,
            proxy_type: self.proxy_type,
            unit_price: self.unit_price,
            unit_size: self.unit_size,
            allocation_id: self.allocation_id,
            active: self.active,
        }
    }
}

pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_product(&self, admin_id: Uuid, product: NewProduct) -> Result<Product> {
        require_admin(self.store.as_ref(), admin_id).await?;
        let product = product.validate()?.into_product(Uuid::new_v4());
        self.store.insert_product(&product).await?;
        info!(%admin_id, product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Replace every field of an existing product.
    pub async fn update_product(
        &self,
        admin_id: Uuid,
        product_id: Uuid,
        product: NewProduct,
    ) -> Result<Product> {
        require_admin(self.store.as_ref(), admin_id).await?;
        let product = product.validate()?.into_product(product_id);
        self.store.update_product(&product).await?;
        info!(%admin_id, %product_id, "Product updated");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {}", id)))
    }

    pub async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
        Ok(self.store.list_products(active_only).await?)
    }
}

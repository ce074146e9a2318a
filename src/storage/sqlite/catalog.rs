use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{is_unique_violation, SqliteStore};
use crate::interfaces::{CatalogStore, Result, StorageError};
use crate::model::Product;
use crate::storage::helpers::{decode_money, encode_money, parse_uuid};
use crate::storage::schema::Products;

const PRODUCT_COLUMNS: [Products; 7] = [
    Products::Id,
    Products::Name,
    Products::ProxyType,
    Products::UnitPrice,
    Products::UnitSize,
    Products::AllocationId,
    Products::Active,
];

fn product_from_row(row: &SqliteRow) -> Result<Product> {
    let unit_size: i64 = row.try_get("unit_size")?;
    Ok(Product {
        id: parse_uuid(row.try_get("id")?)?,
        name: row.try_get("name")?,
        proxy_type: row.try_get("proxy_type")?,
        unit_price: decode_money(row.try_get("unit_price")?),
        unit_size: u32::try_from(unit_size)
            .map_err(|_| StorageError::InvalidData(format!("bad unit size {}", unit_size)))?,
        allocation_id: row.try_get("allocation_id")?,
        active: row.try_get::<i64, _>("active")? != 0,
    })
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let query = Query::insert()
            .into_table(Products::Table)
            .columns(PRODUCT_COLUMNS)
            .values_panic([
                product.id.to_string().into(),
                product.name.clone().into(),
                product.proxy_type.clone().into(),
                encode_money(product.unit_price)?.into(),
                i64::from(product.unit_size).into(),
                product.allocation_id.clone().into(),
                i64::from(product.active).into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Duplicate(format!("product {}", product.id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let query = Query::update()
            .table(Products::Table)
            .values([
                (Products::Name, product.name.clone().into()),
                (Products::ProxyType, product.proxy_type.clone().into()),
                (Products::UnitPrice, encode_money(product.unit_price)?.into()),
                (Products::UnitSize, i64::from(product.unit_size).into()),
                (Products::AllocationId, product.allocation_id.clone().into()),
                (Products::Active, i64::from(product.active).into()),
            ])
            .and_where(Expr::col(Products::Id).eq(product.id.to_string()))
            .to_string(SqliteQueryBuilder);

        let done = sqlx::query(&query).execute(&self.pool).await?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("product {}", product.id)));
        }
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        let query = Query::select()
            .columns(PRODUCT_COLUMNS)
            .from(Products::Table)
            .and_where(Expr::col(Products::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
        let query = {
            let mut select = Query::select();
            select
                .columns(PRODUCT_COLUMNS)
                .from(Products::Table)
                .order_by(Products::Name, Order::Asc);
            if active_only {
                select.and_where(Expr::col(Products::Active).eq(1));
            }
            select.to_string(SqliteQueryBuilder)
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(product_from_row).collect()
    }
}

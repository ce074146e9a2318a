use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, Order as SortOrder, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::SqliteStore;
use crate::interfaces::{OrderStore, Result, StorageError};
use crate::model::{Order, OrderStatus, ProxyCredential};
use crate::storage::helpers::{decode_money, format_timestamp, parse_timestamp, parse_uuid};
use crate::storage::schema::{Orders, ProxyCredentials};

const ORDER_COLUMNS: [Orders; 9] = [
    Orders::Id,
    Orders::AccountId,
    Orders::ProductId,
    Orders::ProxyType,
    Orders::Quantity,
    Orders::TotalCost,
    Orders::Status,
    Orders::ExpiresAt,
    Orders::CreatedAt,
];

fn order_from_row(row: &SqliteRow) -> Result<Order> {
    let quantity: i64 = row.try_get("quantity")?;
    Ok(Order {
        id: parse_uuid(row.try_get("id")?)?,
        account_id: parse_uuid(row.try_get("account_id")?)?,
        product_id: parse_uuid(row.try_get("product_id")?)?,
        proxy_type: row.try_get("proxy_type")?,
        quantity: u32::try_from(quantity)
            .map_err(|_| StorageError::InvalidData(format!("bad quantity {}", quantity)))?,
        total_cost: decode_money(row.try_get("total_cost")?),
        status: row.try_get::<String, _>("status")?.parse::<OrderStatus>()?,
        expires_at: parse_timestamp(row.try_get("expires_at")?)?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

fn credential_from_row(row: &SqliteRow) -> Result<ProxyCredential> {
    let port: i64 = row.try_get("port")?;
    Ok(ProxyCredential {
        id: parse_uuid(row.try_get("id")?)?,
        order_id: parse_uuid(row.try_get("order_id")?)?,
        host: row.try_get("host")?,
        port: u16::try_from(port)
            .map_err(|_| StorageError::InvalidData(format!("bad port {}", port)))?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        geo: row.try_get("geo")?,
    })
}

fn credential_columns() -> [(ProxyCredentials, ProxyCredentials); 7] {
    [
        (ProxyCredentials::Table, ProxyCredentials::Id),
        (ProxyCredentials::Table, ProxyCredentials::OrderId),
        (ProxyCredentials::Table, ProxyCredentials::Host),
        (ProxyCredentials::Table, ProxyCredentials::Port),
        (ProxyCredentials::Table, ProxyCredentials::Username),
        (ProxyCredentials::Table, ProxyCredentials::Password),
        (ProxyCredentials::Table, ProxyCredentials::Geo),
    ]
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        let query = Query::select()
            .columns(ORDER_COLUMNS)
            .from(Orders::Table)
            .and_where(Expr::col(Orders::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>> {
        let query = Query::select()
            .columns(ORDER_COLUMNS)
            .from(Orders::Table)
            .and_where(Expr::col(Orders::AccountId).eq(account_id.to_string()))
            .order_by(Orders::CreatedAt, SortOrder::Desc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn credentials(&self, order_id: Uuid) -> Result<Vec<ProxyCredential>> {
        let query = Query::select()
            .columns(credential_columns())
            .from(ProxyCredentials::Table)
            .and_where(Expr::col(ProxyCredentials::OrderId).eq(order_id.to_string()))
            .order_by_expr(Expr::cust("rowid"), SortOrder::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(credential_from_row).collect()
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64> {
        let query = Query::update()
            .table(Orders::Table)
            .value(Orders::Status, OrderStatus::Expired.as_str())
            .and_where(Expr::col(Orders::Status).eq(OrderStatus::Active.as_str()))
            .and_where(Expr::col(Orders::ExpiresAt).lte(format_timestamp(now)))
            .to_string(SqliteQueryBuilder);

        let done = sqlx::query(&query).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn active_credentials(&self, proxy_type: &str) -> Result<Vec<ProxyCredential>> {
        let query = Query::select()
            .columns(credential_columns())
            .from(ProxyCredentials::Table)
            .inner_join(
                Orders::Table,
                Expr::col((Orders::Table, Orders::Id))
                    .equals((ProxyCredentials::Table, ProxyCredentials::OrderId)),
            )
            .and_where(Expr::col((Orders::Table, Orders::Status)).eq(OrderStatus::Active.as_str()))
            .and_where(Expr::col((Orders::Table, Orders::ProxyType)).eq(proxy_type))
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(credential_from_row).collect()
    }

    async fn orders_overlapping(
        &self,
        proxy_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let query = Query::select()
            .columns(ORDER_COLUMNS)
            .from(Orders::Table)
            .and_where(Expr::col(Orders::ProxyType).eq(proxy_type))
            .and_where(Expr::col(Orders::Status).ne(OrderStatus::Failed.as_str()))
            .and_where(Expr::col(Orders::CreatedAt).lt(format_timestamp(end)))
            .and_where(Expr::col(Orders::ExpiresAt).gt(format_timestamp(start)))
            .order_by(Orders::CreatedAt, SortOrder::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(order_from_row).collect()
    }
}

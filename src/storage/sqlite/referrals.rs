use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{is_unique_violation, SqliteStore};
use crate::interfaces::{ReferralStore, Result, StorageError};
use crate::model::{EarningStatus, ReferralEarning, ReferralLink};
use crate::storage::helpers::{
    decode_money, encode_money, format_timestamp, parse_optional_timestamp, parse_timestamp,
    parse_uuid,
};
use crate::storage::schema::{ReferralEarnings, ReferralLinks};

const EARNING_COLUMNS: [ReferralEarnings; 8] = [
    ReferralEarnings::Id,
    ReferralEarnings::ReferrerId,
    ReferralEarnings::ReferredId,
    ReferralEarnings::Amount,
    ReferralEarnings::Status,
    ReferralEarnings::Description,
    ReferralEarnings::CreatedAt,
    ReferralEarnings::CompletedAt,
];

fn link_from_row(row: &SqliteRow) -> Result<ReferralLink> {
    Ok(ReferralLink {
        referred_id: parse_uuid(row.try_get("referred_id")?)?,
        referrer_id: parse_uuid(row.try_get("referrer_id")?)?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

fn earning_from_row(row: &SqliteRow) -> Result<ReferralEarning> {
    Ok(ReferralEarning {
        id: parse_uuid(row.try_get("id")?)?,
        referrer_id: parse_uuid(row.try_get("referrer_id")?)?,
        referred_id: parse_uuid(row.try_get("referred_id")?)?,
        amount: decode_money(row.try_get("amount")?),
        status: row.try_get::<String, _>("status")?.parse::<EarningStatus>()?,
        description: row.try_get("description")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
        completed_at: parse_optional_timestamp(row.try_get("completed_at")?)?,
    })
}

impl SqliteStore {
    async fn select_links(&self, column: ReferralLinks, id: Uuid) -> Result<Vec<ReferralLink>> {
        let query = Query::select()
            .columns([
                ReferralLinks::ReferredId,
                ReferralLinks::ReferrerId,
                ReferralLinks::CreatedAt,
            ])
            .from(ReferralLinks::Table)
            .and_where(Expr::col(column).eq(id.to_string()))
            .order_by(ReferralLinks::CreatedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(link_from_row).collect()
    }
}

#[async_trait]
impl ReferralStore for SqliteStore {
    async fn insert_link(&self, link: &ReferralLink) -> Result<()> {
        let query = Query::insert()
            .into_table(ReferralLinks::Table)
            .columns([
                ReferralLinks::ReferredId,
                ReferralLinks::ReferrerId,
                ReferralLinks::CreatedAt,
            ])
            .values_panic([
                link.referred_id.to_string().into(),
                link.referrer_id.to_string().into(),
                format_timestamp(link.created_at).into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StorageError::Duplicate(format!(
                "referral link for {}",
                link.referred_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn link_for(&self, referred_id: Uuid) -> Result<Option<ReferralLink>> {
        Ok(self
            .select_links(ReferralLinks::ReferredId, referred_id)
            .await?
            .into_iter()
            .next())
    }

    async fn referred_by(&self, referrer_id: Uuid) -> Result<Vec<ReferralLink>> {
        self.select_links(ReferralLinks::ReferrerId, referrer_id)
            .await
    }

    async fn insert_earning(&self, earning: &ReferralEarning) -> Result<()> {
        let query = Query::insert()
            .into_table(ReferralEarnings::Table)
            .columns(EARNING_COLUMNS)
            .values_panic([
                earning.id.to_string().into(),
                earning.referrer_id.to_string().into(),
                earning.referred_id.to_string().into(),
                encode_money(earning.amount)?.into(),
                earning.status.as_str().into(),
                earning.description.clone().into(),
                format_timestamp(earning.created_at).into(),
                earning.completed_at.map(format_timestamp).into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Duplicate(format!("earning {}", earning.id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_earning(&self, id: Uuid) -> Result<Option<ReferralEarning>> {
        let query = Query::select()
            .columns(EARNING_COLUMNS)
            .from(ReferralEarnings::Table)
            .and_where(Expr::col(ReferralEarnings::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(earning_from_row).transpose()
    }

    async fn pending_earnings_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ReferralEarning>> {
        let query = Query::select()
            .columns(EARNING_COLUMNS)
            .from(ReferralEarnings::Table)
            .and_where(Expr::col(ReferralEarnings::Status).eq(EarningStatus::Pending.as_str()))
            .and_where(Expr::col(ReferralEarnings::CreatedAt).lte(format_timestamp(cutoff)))
            .order_by(ReferralEarnings::CreatedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(earning_from_row).collect()
    }

    async fn earnings_for(&self, referrer_id: Uuid) -> Result<Vec<ReferralEarning>> {
        let query = Query::select()
            .columns(EARNING_COLUMNS)
            .from(ReferralEarnings::Table)
            .and_where(Expr::col(ReferralEarnings::ReferrerId).eq(referrer_id.to_string()))
            .order_by(ReferralEarnings::CreatedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(earning_from_row).collect()
    }
}

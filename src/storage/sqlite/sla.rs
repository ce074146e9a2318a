use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{is_unique_violation, SqliteStore};
use crate::interfaces::{Result, SlaStore, StorageError};
use crate::model::{CreditStatus, SlaConfig, SlaCredit, UptimeRecord, UptimeStatus};
use crate::storage::helpers::{
    decode_money, encode_money, format_timestamp, parse_decimal, parse_optional_uuid,
    parse_timestamp, parse_uuid,
};
use crate::storage::schema::{SlaConfigs, SlaCredits, UptimeRecords};

const CONFIG_COLUMNS: [SlaConfigs; 5] = [
    SlaConfigs::ProxyType,
    SlaConfigs::GuaranteedUptime,
    SlaConfigs::CreditPerPercent,
    SlaConfigs::MeasurementWindowHours,
    SlaConfigs::Active,
];

const CREDIT_COLUMNS: [SlaCredits; 11] = [
    SlaCredits::Id,
    SlaCredits::AccountId,
    SlaCredits::ProxyType,
    SlaCredits::GuaranteedUptime,
    SlaCredits::ActualUptime,
    SlaCredits::CreditAmount,
    SlaCredits::Status,
    SlaCredits::WindowStart,
    SlaCredits::WindowEnd,
    SlaCredits::ReviewedBy,
    SlaCredits::CreatedAt,
];

fn config_from_row(row: &SqliteRow) -> Result<SlaConfig> {
    let hours: i64 = row.try_get("measurement_window_hours")?;
    Ok(SlaConfig {
        proxy_type: row.try_get("proxy_type")?,
        guaranteed_uptime: parse_decimal(row.try_get("guaranteed_uptime")?)?,
        credit_per_percent: parse_decimal(row.try_get("credit_per_percent")?)?,
        measurement_window_hours: u32::try_from(hours)
            .map_err(|_| StorageError::InvalidData(format!("bad window {}", hours)))?,
        active: row.try_get::<i64, _>("active")? != 0,
    })
}

fn uptime_from_row(row: &SqliteRow) -> Result<UptimeRecord> {
    let latency: Option<i64> = row.try_get("latency_ms")?;
    Ok(UptimeRecord {
        id: parse_uuid(row.try_get("id")?)?,
        proxy_type: row.try_get("proxy_type")?,
        status: row.try_get::<String, _>("status")?.parse::<UptimeStatus>()?,
        latency_ms: latency.and_then(|ms| u64::try_from(ms).ok()),
        checked_at: parse_timestamp(row.try_get("checked_at")?)?,
    })
}

fn credit_from_row(row: &SqliteRow) -> Result<SlaCredit> {
    Ok(SlaCredit {
        id: parse_uuid(row.try_get("id")?)?,
        account_id: parse_uuid(row.try_get("account_id")?)?,
        proxy_type: row.try_get("proxy_type")?,
        guaranteed_uptime: parse_decimal(row.try_get("guaranteed_uptime")?)?,
        actual_uptime: parse_decimal(row.try_get("actual_uptime")?)?,
        credit_amount: decode_money(row.try_get("credit_amount")?),
        status: row.try_get::<String, _>("status")?.parse::<CreditStatus>()?,
        window_start: parse_timestamp(row.try_get("window_start")?)?,
        window_end: parse_timestamp(row.try_get("window_end")?)?,
        reviewed_by: parse_optional_uuid(row.try_get("reviewed_by")?)?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl SlaStore for SqliteStore {
    async fn upsert_config(&self, config: &SlaConfig) -> Result<()> {
        let query = Query::insert()
            .into_table(SlaConfigs::Table)
            .columns(CONFIG_COLUMNS)
            .values_panic([
                config.proxy_type.clone().into(),
                config.guaranteed_uptime.to_string().into(),
                config.credit_per_percent.to_string().into(),
                i64::from(config.measurement_window_hours).into(),
                i64::from(config.active).into(),
            ])
            .on_conflict(
                OnConflict::column(SlaConfigs::ProxyType)
                    .update_columns([
                        SlaConfigs::GuaranteedUptime,
                        SlaConfigs::CreditPerPercent,
                        SlaConfigs::MeasurementWindowHours,
                        SlaConfigs::Active,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn get_config(&self, proxy_type: &str) -> Result<Option<SlaConfig>> {
        let query = Query::select()
            .columns(CONFIG_COLUMNS)
            .from(SlaConfigs::Table)
            .and_where(Expr::col(SlaConfigs::ProxyType).eq(proxy_type))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(config_from_row).transpose()
    }

    async fn list_configs(&self) -> Result<Vec<SlaConfig>> {
        let query = Query::select()
            .columns(CONFIG_COLUMNS)
            .from(SlaConfigs::Table)
            .order_by(SlaConfigs::ProxyType, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(config_from_row).collect()
    }

    async fn record_uptime(&self, record: &UptimeRecord) -> Result<()> {
        let latency = record
            .latency_ms
            .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX));
        let query = Query::insert()
            .into_table(UptimeRecords::Table)
            .columns([
                UptimeRecords::Id,
                UptimeRecords::ProxyType,
                UptimeRecords::Status,
                UptimeRecords::LatencyMs,
                UptimeRecords::CheckedAt,
            ])
            .values_panic([
                record.id.to_string().into(),
                record.proxy_type.clone().into(),
                record.status.as_str().into(),
                latency.into(),
                format_timestamp(record.checked_at).into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn uptime_between(
        &self,
        proxy_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UptimeRecord>> {
        let query = Query::select()
            .columns([
                UptimeRecords::Id,
                UptimeRecords::ProxyType,
                UptimeRecords::Status,
                UptimeRecords::LatencyMs,
                UptimeRecords::CheckedAt,
            ])
            .from(UptimeRecords::Table)
            .and_where(Expr::col(UptimeRecords::ProxyType).eq(proxy_type))
            .and_where(Expr::col(UptimeRecords::CheckedAt).gte(format_timestamp(start)))
            .and_where(Expr::col(UptimeRecords::CheckedAt).lt(format_timestamp(end)))
            .order_by(UptimeRecords::CheckedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(uptime_from_row).collect()
    }

    async fn insert_credit(&self, credit: &SlaCredit) -> Result<bool> {
        let query = Query::insert()
            .into_table(SlaCredits::Table)
            .columns(CREDIT_COLUMNS)
            .values_panic([
                credit.id.to_string().into(),
                credit.account_id.to_string().into(),
                credit.proxy_type.clone().into(),
                credit.guaranteed_uptime.to_string().into(),
                credit.actual_uptime.to_string().into(),
                encode_money(credit.credit_amount)?.into(),
                credit.status.as_str().into(),
                format_timestamp(credit.window_start).into(),
                format_timestamp(credit.window_end).into(),
                credit.reviewed_by.map(|id| id.to_string()).into(),
                format_timestamp(credit.created_at).into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&self.pool).await {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_credit(&self, id: Uuid) -> Result<Option<SlaCredit>> {
        let query = Query::select()
            .columns(CREDIT_COLUMNS)
            .from(SlaCredits::Table)
            .and_where(Expr::col(SlaCredits::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(credit_from_row).transpose()
    }

    async fn credits(&self, status: Option<CreditStatus>) -> Result<Vec<SlaCredit>> {
        let query = {
            let mut select = Query::select();
            select
                .columns(CREDIT_COLUMNS)
                .from(SlaCredits::Table)
                .order_by(SlaCredits::CreatedAt, Order::Asc)
                .order_by_expr(Expr::cust("rowid"), Order::Asc);
            if let Some(status) = status {
                select.and_where(Expr::col(SlaCredits::Status).eq(status.as_str()));
            }
            select.to_string(SqliteQueryBuilder)
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(credit_from_row).collect()
    }

    async fn transition_credit(
        &self,
        id: Uuid,
        from: CreditStatus,
        to: CreditStatus,
        reviewer: Uuid,
    ) -> Result<SlaCredit> {
        let query = Query::update()
            .table(SlaCredits::Table)
            .values([
                (SlaCredits::Status, to.as_str().into()),
                (SlaCredits::ReviewedBy, reviewer.to_string().into()),
            ])
            .and_where(Expr::col(SlaCredits::Id).eq(id.to_string()))
            .and_where(Expr::col(SlaCredits::Status).eq(from.as_str()))
            .to_string(SqliteQueryBuilder);

        let done = sqlx::query(&query).execute(&self.pool).await?;
        let credit = self
            .get_credit(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("sla credit {}", id)))?;

        if done.rows_affected() == 0 {
            return Err(StorageError::AlreadyProcessed(format!(
                "sla credit {} is {}",
                id, credit.status
            )));
        }
        Ok(credit)
    }
}

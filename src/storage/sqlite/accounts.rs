use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{is_unique_violation, SqliteStore};
use crate::interfaces::{AccountStore, Result, StorageError};
use crate::model::{Account, BalanceAudit, Role};
use crate::storage::helpers::{
    decode_money, format_timestamp, parse_decimal, parse_timestamp, parse_uuid,
};
use crate::storage::schema::{Accounts, BalanceAudits};

pub(super) const ACCOUNT_COLUMNS: [Accounts; 8] = [
    Accounts::Id,
    Accounts::Email,
    Accounts::Role,
    Accounts::Balance,
    Accounts::ReferralCode,
    Accounts::ReferralRate,
    Accounts::RegistrationIp,
    Accounts::CreatedAt,
];

pub(super) fn account_from_row(row: &SqliteRow) -> Result<Account> {
    let rate: Option<String> = row.try_get("referral_rate")?;
    Ok(Account {
        id: parse_uuid(row.try_get("id")?)?,
        email: row.try_get("email")?,
        role: row.try_get::<String, _>("role")?.parse::<Role>()?,
        balance: decode_money(row.try_get("balance")?),
        referral_code: row.try_get("referral_code")?,
        referral_rate: rate.as_deref().map(parse_decimal).transpose()?,
        registration_ip: row.try_get("registration_ip")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

pub(super) fn audit_from_row(row: &SqliteRow) -> Result<BalanceAudit> {
    Ok(BalanceAudit {
        id: parse_uuid(row.try_get("id")?)?,
        account_id: parse_uuid(row.try_get("account_id")?)?,
        admin_id: parse_uuid(row.try_get("admin_id")?)?,
        old_balance: decode_money(row.try_get("old_balance")?),
        new_balance: decode_money(row.try_get("new_balance")?),
        reason: row.try_get("reason")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

impl SqliteStore {
    async fn find_account_by(&self, column: Accounts, value: &str) -> Result<Option<Account>> {
        let query = Query::select()
            .columns(ACCOUNT_COLUMNS)
            .from(Accounts::Table)
            .and_where(Expr::col(column).eq(value))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn update_account(&self, id: Uuid, column: Accounts, value: Option<String>) -> Result<()> {
        let query = Query::update()
            .table(Accounts::Table)
            .value(column, value)
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let done = sqlx::query(&query).execute(&self.pool).await?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("account {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        let query = Query::insert()
            .into_table(Accounts::Table)
            .columns(ACCOUNT_COLUMNS)
            .values_panic([
                account.id.to_string().into(),
                account.email.clone().into(),
                account.role.as_str().into(),
                0i64.into(),
                account.referral_code.clone().into(),
                account.referral_rate.map(|r| r.to_string()).into(),
                account.registration_ip.clone().into(),
                format_timestamp(account.created_at).into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Duplicate(format!("account {}", account.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.find_account_by(Accounts::Id, &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        // The email column is declared COLLATE NOCASE.
        self.find_account_by(Accounts::Email, email).await
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<Account>> {
        self.find_account_by(Accounts::ReferralCode, code).await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        self.update_account(id, Accounts::Role, Some(role.as_str().to_string()))
            .await
    }

    async fn set_referral_rate(&self, id: Uuid, rate: Option<Decimal>) -> Result<()> {
        self.update_account(id, Accounts::ReferralRate, rate.map(|r| r.to_string()))
            .await
    }

    async fn audits(&self, account_id: Uuid) -> Result<Vec<BalanceAudit>> {
        let query = Query::select()
            .columns([
                BalanceAudits::Id,
                BalanceAudits::AccountId,
                BalanceAudits::AdminId,
                BalanceAudits::OldBalance,
                BalanceAudits::NewBalance,
                BalanceAudits::Reason,
                BalanceAudits::CreatedAt,
            ])
            .from(BalanceAudits::Table)
            .and_where(Expr::col(BalanceAudits::AccountId).eq(account_id.to_string()))
            .order_by(BalanceAudits::CreatedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(audit_from_row).collect()
    }
}

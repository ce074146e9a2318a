use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, error};
use uuid::Uuid;

use super::{is_unique_violation, SqliteStore};
use crate::interfaces::{Attachment, LedgerStore, Posting, Receipt, Result, StorageError};
use crate::model::{
    BalanceAudit, CreditStatus, Direction, EarningStatus, LedgerEntry, Order as ProxyOrder,
    ProxyCredential, WebhookEvent,
};
use crate::storage::helpers::{
    decode_money, encode_money, format_timestamp, parse_timestamp, parse_uuid,
};
use crate::storage::schema::{
    Accounts, BalanceAudits, LedgerEntries, Orders, ProxyCredentials, ReferralEarnings,
    SlaCredits, WebhookEvents,
};

const ENTRY_COLUMNS: [LedgerEntries; 7] = [
    LedgerEntries::Id,
    LedgerEntries::AccountId,
    LedgerEntries::Direction,
    LedgerEntries::Amount,
    LedgerEntries::Reference,
    LedgerEntries::Description,
    LedgerEntries::CreatedAt,
];

fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: parse_uuid(row.try_get("id")?)?,
        account_id: parse_uuid(row.try_get("account_id")?)?,
        direction: row.try_get::<String, _>("direction")?.parse::<Direction>()?,
        amount: decode_money(row.try_get("amount")?),
        reference: row.try_get("reference")?,
        description: row.try_get("description")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

fn webhook_from_row(row: &SqliteRow) -> Result<WebhookEvent> {
    Ok(WebhookEvent {
        provider: row.try_get("provider")?,
        event_id: row.try_get("event_id")?,
        account_id: parse_uuid(row.try_get("account_id")?)?,
        amount: decode_money(row.try_get("amount")?),
        received_at: parse_timestamp(row.try_get("received_at")?)?,
    })
}

impl SqliteStore {
    /// Apply a posting on a connection that already holds the write lock.
    async fn apply_posting(
        conn: &mut SqliteConnection,
        posting: Posting,
        now: DateTime<Utc>,
    ) -> Result<Receipt> {
        let Posting { entry, attachments } = posting;
        if entry.amount <= Decimal::ZERO {
            return Err(StorageError::InvalidData(format!(
                "ledger amount must be positive, got {}",
                entry.amount
            )));
        }
        let amount = encode_money(entry.amount)?;
        let account_id = entry.account_id.to_string();

        let query = Query::select()
            .column(Accounts::Balance)
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Id).eq(&account_id))
            .to_string(SqliteQueryBuilder);
        let old_minor: i64 = match sqlx::query(&query).fetch_optional(&mut *conn).await? {
            Some(row) => row.try_get(0)?,
            None => {
                return Err(StorageError::NotFound(format!("account {}", entry.account_id)));
            }
        };

        let delta = match entry.direction {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        };
        let new_minor = old_minor.checked_add(delta).ok_or_else(|| {
            StorageError::InvalidData(format!(
                "balance of account {} out of range after {} {}",
                entry.account_id, entry.direction, entry.amount
            ))
        })?;
        if new_minor < 0 {
            return Err(StorageError::InsufficientFunds {
                available: decode_money(old_minor),
                required: entry.amount,
            });
        }

        let query = Query::update()
            .table(Accounts::Table)
            .value(Accounts::Balance, Expr::col(Accounts::Balance).add(delta))
            .and_where(Expr::col(Accounts::Id).eq(&account_id))
            .and_where(Expr::col(Accounts::Balance).gte(-delta))
            .to_string(SqliteQueryBuilder);
        let updated = sqlx::query(&query).execute(&mut *conn).await?;
        if updated.rows_affected() != 1 {
            return Err(StorageError::InsufficientFunds {
                available: decode_money(old_minor),
                required: entry.amount,
            });
        }

        let ledger_entry = LedgerEntry {
            id: Uuid::new_v4(),
            account_id: entry.account_id,
            direction: entry.direction,
            amount: decode_money(amount),
            reference: entry.reference,
            description: entry.description,
            created_at: now,
        };
        let query = Query::insert()
            .into_table(LedgerEntries::Table)
            .columns(ENTRY_COLUMNS)
            .values_panic([
                ledger_entry.id.to_string().into(),
                account_id.clone().into(),
                ledger_entry.direction.as_str().into(),
                amount.into(),
                ledger_entry.reference.clone().into(),
                ledger_entry.description.clone().into(),
                format_timestamp(now).into(),
            ])
            .to_string(SqliteQueryBuilder);
        if let Err(e) = sqlx::query(&query).execute(&mut *conn).await {
            return Err(if is_unique_violation(&e) {
                StorageError::AlreadyProcessed(format!(
                    "reference {}",
                    ledger_entry.reference.as_deref().unwrap_or_default()
                ))
            } else {
                e.into()
            });
        }

        let mut audit = None;
        for attachment in attachments {
            match attachment {
                Attachment::RecordWebhook(event) => {
                    Self::insert_webhook(conn, &event).await?;
                }
                Attachment::CreateOrder { order, credentials } => {
                    Self::insert_order(conn, &order, &credentials).await?;
                }
                Attachment::ReleaseEarning(id) => {
                    let query = Query::update()
                        .table(ReferralEarnings::Table)
                        .value(ReferralEarnings::Status, EarningStatus::Completed.as_str())
                        .value(ReferralEarnings::CompletedAt, format_timestamp(now))
                        .and_where(Expr::col(ReferralEarnings::Id).eq(id.to_string()))
                        .and_where(
                            Expr::col(ReferralEarnings::Status).eq(EarningStatus::Pending.as_str()),
                        )
                        .to_string(SqliteQueryBuilder);
                    let done = sqlx::query(&query).execute(&mut *conn).await?;
                    if done.rows_affected() == 0 {
                        return Err(Self::guard_failure(
                            conn,
                            ReferralEarnings::Table,
                            ReferralEarnings::Id,
                            id,
                            "earning",
                        )
                        .await);
                    }
                }
                Attachment::ApplySlaCredit(id) => {
                    let query = Query::update()
                        .table(SlaCredits::Table)
                        .value(SlaCredits::Status, CreditStatus::Applied.as_str())
                        .and_where(Expr::col(SlaCredits::Id).eq(id.to_string()))
                        .and_where(Expr::col(SlaCredits::Status).eq(CreditStatus::Approved.as_str()))
                        .to_string(SqliteQueryBuilder);
                    let done = sqlx::query(&query).execute(&mut *conn).await?;
                    if done.rows_affected() == 0 {
                        return Err(Self::guard_failure(
                            conn,
                            SlaCredits::Table,
                            SlaCredits::Id,
                            id,
                            "sla credit",
                        )
                        .await);
                    }
                }
                Attachment::Audit { admin_id, reason } => {
                    let row = BalanceAudit {
                        id: Uuid::new_v4(),
                        account_id: entry.account_id,
                        admin_id,
                        old_balance: decode_money(old_minor),
                        new_balance: decode_money(new_minor),
                        reason,
                        created_at: now,
                    };
                    let query = Query::insert()
                        .into_table(BalanceAudits::Table)
                        .columns([
                            BalanceAudits::Id,
                            BalanceAudits::AccountId,
                            BalanceAudits::AdminId,
                            BalanceAudits::OldBalance,
                            BalanceAudits::NewBalance,
                            BalanceAudits::Reason,
                            BalanceAudits::CreatedAt,
                        ])
                        .values_panic([
                            row.id.to_string().into(),
                            account_id.clone().into(),
                            admin_id.to_string().into(),
                            old_minor.into(),
                            new_minor.into(),
                            row.reason.clone().into(),
                            format_timestamp(now).into(),
                        ])
                        .to_string(SqliteQueryBuilder);
                    sqlx::query(&query).execute(&mut *conn).await?;
                    audit = Some(row);
                }
            }
        }

        Ok(Receipt {
            entry: ledger_entry,
            balance: decode_money(new_minor),
            audit,
        })
    }

    async fn insert_webhook(conn: &mut SqliteConnection, event: &WebhookEvent) -> Result<()> {
        let query = Query::insert()
            .into_table(WebhookEvents::Table)
            .columns([
                WebhookEvents::Provider,
                WebhookEvents::EventId,
                WebhookEvents::AccountId,
                WebhookEvents::Amount,
                WebhookEvents::ReceivedAt,
            ])
            .values_panic([
                event.provider.clone().into(),
                event.event_id.clone().into(),
                event.account_id.to_string().into(),
                encode_money(event.amount)?.into(),
                format_timestamp(event.received_at).into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&mut *conn).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StorageError::AlreadyProcessed(format!(
                "webhook {}/{}",
                event.provider, event.event_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_order(
        conn: &mut SqliteConnection,
        order: &ProxyOrder,
        credentials: &[ProxyCredential],
    ) -> Result<()> {
        let query = Query::insert()
            .into_table(Orders::Table)
            .columns([
                Orders::Id,
                Orders::AccountId,
                Orders::ProductId,
                Orders::ProxyType,
                Orders::Quantity,
                Orders::TotalCost,
                Orders::Status,
                Orders::ExpiresAt,
                Orders::CreatedAt,
            ])
            .values_panic([
                order.id.to_string().into(),
                order.account_id.to_string().into(),
                order.product_id.to_string().into(),
                order.proxy_type.clone().into(),
                i64::from(order.quantity).into(),
                encode_money(order.total_cost)?.into(),
                order.status.as_str().into(),
                format_timestamp(order.expires_at).into(),
                format_timestamp(order.created_at).into(),
            ])
            .to_string(SqliteQueryBuilder);
        match sqlx::query(&query).execute(&mut *conn).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::Duplicate(format!("order {}", order.id)));
            }
            Err(e) => return Err(e.into()),
        }

        for credential in credentials {
            let query = Query::insert()
                .into_table(ProxyCredentials::Table)
                .columns([
                    ProxyCredentials::Id,
                    ProxyCredentials::OrderId,
                    ProxyCredentials::Host,
                    ProxyCredentials::Port,
                    ProxyCredentials::Username,
                    ProxyCredentials::Password,
                    ProxyCredentials::Geo,
                ])
                .values_panic([
                    credential.id.to_string().into(),
                    order.id.to_string().into(),
                    credential.host.clone().into(),
                    i64::from(credential.port).into(),
                    credential.username.clone().into(),
                    credential.password.clone().into(),
                    credential.geo.clone().into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;
        }
        Ok(())
    }

    /// Error for a status guard that matched no row: `NotFound` when the row
    /// is missing, `AlreadyProcessed` when it exists in another state.
    async fn guard_failure<T, C>(
        conn: &mut SqliteConnection,
        table: T,
        id_column: C,
        id: Uuid,
        what: &str,
    ) -> StorageError
    where
        T: sea_query::Iden + 'static,
        C: sea_query::Iden + 'static,
    {
        let query = Query::select()
            .expr(Expr::val(1))
            .from(table)
            .and_where(Expr::col(id_column).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&mut *conn).await {
            Ok(Some(_)) => StorageError::AlreadyProcessed(format!("{} {}", what, id)),
            Ok(None) => StorageError::NotFound(format!("{} {}", what, id)),
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn commit(&self, posting: Posting) -> Result<Receipt> {
        let now = Utc::now();

        // BEGIN IMMEDIATE takes the write lock before the balance is read, so
        // the debit check and the update see the same balance.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match Self::apply_posting(&mut conn, posting, now).await {
            Ok(receipt) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                debug!(
                    account_id = %receipt.entry.account_id,
                    direction = %receipt.entry.direction,
                    amount = %receipt.entry.amount,
                    "Posting committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    error!(error = %rollback, cause = %e, "Posting rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let query = Query::select()
            .columns(ENTRY_COLUMNS)
            .from(LedgerEntries::Table)
            .and_where(Expr::col(LedgerEntries::AccountId).eq(account_id.to_string()))
            .order_by(LedgerEntries::CreatedAt, Order::Asc)
            .order_by_expr(Expr::cust("rowid"), Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>> {
        let query = Query::select()
            .columns(ENTRY_COLUMNS)
            .from(LedgerEntries::Table)
            .and_where(Expr::col(LedgerEntries::Reference).eq(reference))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(entry_from_row).transpose()
    }

    async fn webhook_event(&self, provider: &str, event_id: &str) -> Result<Option<WebhookEvent>> {
        let query = Query::select()
            .columns([
                WebhookEvents::Provider,
                WebhookEvents::EventId,
                WebhookEvents::AccountId,
                WebhookEvents::Amount,
                WebhookEvents::ReceivedAt,
            ])
            .from(WebhookEvents::Table)
            .and_where(Expr::col(WebhookEvents::Provider).eq(provider))
            .and_where(Expr::col(WebhookEvents::EventId).eq(event_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(webhook_from_row).transpose()
    }
}

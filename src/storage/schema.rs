//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! The tables themselves are created by `migrations/sqlite`.

use sea_query::Iden;

/// Accounts table schema.
#[derive(Iden)]
pub enum Accounts {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "email"]
    Email,
    #[iden = "role"]
    Role,
    #[iden = "balance"]
    Balance,
    #[iden = "referral_code"]
    ReferralCode,
    #[iden = "referral_rate"]
    ReferralRate,
    #[iden = "registration_ip"]
    RegistrationIp,
    #[iden = "created_at"]
    CreatedAt,
}

/// Ledger entries table schema.
#[derive(Iden)]
pub enum LedgerEntries {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "account_id"]
    AccountId,
    #[iden = "direction"]
    Direction,
    #[iden = "amount"]
    Amount,
    #[iden = "reference"]
    Reference,
    #[iden = "description"]
    Description,
    #[iden = "created_at"]
    CreatedAt,
}

/// Balance audit table schema.
#[derive(Iden)]
pub enum BalanceAudits {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "account_id"]
    AccountId,
    #[iden = "admin_id"]
    AdminId,
    #[iden = "old_balance"]
    OldBalance,
    #[iden = "new_balance"]
    NewBalance,
    #[iden = "reason"]
    Reason,
    #[iden = "created_at"]
    CreatedAt,
}

/// Webhook idempotency table schema.
#[derive(Iden)]
pub enum WebhookEvents {
    Table,
    #[iden = "provider"]
    Provider,
    #[iden = "event_id"]
    EventId,
    #[iden = "account_id"]
    AccountId,
    #[iden = "amount"]
    Amount,
    #[iden = "received_at"]
    ReceivedAt,
}

/// Products table schema.
#[derive(Iden)]
pub enum Products {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "proxy_type"]
    ProxyType,
    #[iden = "unit_price"]
    UnitPrice,
    #[iden = "unit_size"]
    UnitSize,
    #[iden = "allocation_id"]
    AllocationId,
    #[iden = "active"]
    Active,
}

/// Orders table schema.
#[derive(Iden)]
pub enum Orders {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "account_id"]
    AccountId,
    #[iden = "product_id"]
    ProductId,
    #[iden = "proxy_type"]
    ProxyType,
    #[iden = "quantity"]
    Quantity,
    #[iden = "total_cost"]
    TotalCost,
    #[iden = "status"]
    Status,
    #[iden = "expires_at"]
    ExpiresAt,
    #[iden = "created_at"]
    CreatedAt,
}

/// Proxy credentials table schema.
#[derive(Iden)]
pub enum ProxyCredentials {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "order_id"]
    OrderId,
    #[iden = "host"]
    Host,
    #[iden = "port"]
    Port,
    #[iden = "username"]
    Username,
    #[iden = "password"]
    Password,
    #[iden = "geo"]
    Geo,
}

/// Referral links table schema.
#[derive(Iden)]
pub enum ReferralLinks {
    Table,
    #[iden = "referred_id"]
    ReferredId,
    #[iden = "referrer_id"]
    ReferrerId,
    #[iden = "created_at"]
    CreatedAt,
}

/// Referral earnings table schema.
#[derive(Iden)]
pub enum ReferralEarnings {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "referrer_id"]
    ReferrerId,
    #[iden = "referred_id"]
    ReferredId,
    #[iden = "amount"]
    Amount,
    #[iden = "status"]
    Status,
    #[iden = "description"]
    Description,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "completed_at"]
    CompletedAt,
}

/// SLA configuration table schema.
#[derive(Iden)]
pub enum SlaConfigs {
    Table,
    #[iden = "proxy_type"]
    ProxyType,
    #[iden = "guaranteed_uptime"]
    GuaranteedUptime,
    #[iden = "credit_per_percent"]
    CreditPerPercent,
    #[iden = "measurement_window_hours"]
    MeasurementWindowHours,
    #[iden = "active"]
    Active,
}

/// Uptime samples table schema.
#[derive(Iden)]
pub enum UptimeRecords {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "proxy_type"]
    ProxyType,
    #[iden = "status"]
    Status,
    #[iden = "latency_ms"]
    LatencyMs,
    #[iden = "checked_at"]
    CheckedAt,
}

/// SLA credits table schema.
#[derive(Iden)]
pub enum SlaCredits {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "account_id"]
    AccountId,
    #[iden = "proxy_type"]
    ProxyType,
    #[iden = "guaranteed_uptime"]
    GuaranteedUptime,
    #[iden = "actual_uptime"]
    ActualUptime,
    #[iden = "credit_amount"]
    CreditAmount,
    #[iden = "status"]
    Status,
    #[iden = "window_start"]
    WindowStart,
    #[iden = "window_end"]
    WindowEnd,
    #[iden = "reviewed_by"]
    ReviewedBy,
    #[iden = "created_at"]
    CreatedAt,
}

/// Settings key/value table schema.
#[derive(Iden)]
pub enum Settings {
    Table,
    #[iden = "key"]
    Key,
    #[iden = "value"]
    Value,
}

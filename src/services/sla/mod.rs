//! Uptime sampling and SLA credits.
//!
//! Samples are grouped into fixed windows aligned to the Unix epoch. A window
//! is only evaluated once it has ended, and a credit is unique per account,
//! proxy type and window end, so evaluation can be re-run safely.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SlaMonitorConfig;
use crate::error::{Result, ServiceError};
use crate::interfaces::{Attachment, Posting, Store, UptimeProbe};
use crate::model::money::round_money;
use crate::model::{CreditStatus, ProxyCredential, SlaConfig, SlaCredit, UptimeRecord, UptimeStatus};
use crate::utils::credentials::sample;

use super::ledger::LedgerService;
use super::require_admin;

/// Counts of one sampling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    pub up: usize,
    pub degraded: usize,
    pub down: usize,
}

impl SampleReport {
    pub fn total(&self) -> usize {
        self.up + self.degraded + self.down
    }

    fn count(&mut self, status: UptimeStatus) {
        match status {
            UptimeStatus::Up => self.up += 1,
            UptimeStatus::Degraded => self.degraded += 1,
            UptimeStatus::Down => self.down += 1,
        }
    }
}

/// Last window of `hours` that ended at or before `now`.
pub fn window_for(now: DateTime<Utc>, hours: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let length = i64::from(hours) * 3600;
    if length == 0 {
        return None;
    }
    let end = now.timestamp().div_euclid(length) * length;
    let start = Utc.timestamp_opt(end - length, 0).single()?;
    let end = Utc.timestamp_opt(end, 0).single()?;
    Some((start, end))
}

/// Share of available samples in percent, unrounded.
pub fn uptime_percent(records: &[UptimeRecord]) -> Option<Decimal> {
    if records.is_empty() {
        return None;
    }
    let available = records.iter().filter(|r| r.status.is_available()).count();
    Some(Decimal::from(available) * Decimal::ONE_HUNDRED / Decimal::from(records.len()))
}

pub struct SlaService {
    store: Arc<dyn Store>,
    ledger: Arc<LedgerService>,
    probe: Arc<dyn UptimeProbe>,
    config: SlaMonitorConfig,
}

impl SlaService {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<LedgerService>,
        probe: Arc<dyn UptimeProbe>,
        config: SlaMonitorConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            probe,
            config,
        }
    }

    /// Probe a random sample of live credentials of every monitored type.
    pub async fn sample(&self, now: DateTime<Utc>) -> Result<SampleReport> {
        let mut report = SampleReport::default();
        for config in self.store.list_configs().await? {
            if !config.active {
                continue;
            }
            let credentials = self.store.active_credentials(&config.proxy_type).await?;
            if credentials.is_empty() {
                debug!(proxy_type = %config.proxy_type, "No live credentials to probe");
                continue;
            }

            let picked = sample(&credentials, self.config.sample_size);
            let statuses = join_all(picked.iter().map(|c| self.probe_one(c))).await;

            for (credential, (status, latency)) in picked.iter().zip(statuses) {
                let record = UptimeRecord {
                    id: Uuid::new_v4(),
                    proxy_type: config.proxy_type.clone(),
                    status,
                    latency_ms: latency,
                    checked_at: now,
                };
                self.store.record_uptime(&record).await?;
                report.count(status);
                if status == UptimeStatus::Down {
                    debug!(
                        proxy_type = %config.proxy_type,
                        host = %credential.host,
                        "Proxy probe failed"
                    );
                }
            }
        }

        if report.total() > 0 {
            info!(
                up = report.up,
                degraded = report.degraded,
                down = report.down,
                "Uptime sampled"
            );
        }
        Ok(report)
    }

    async fn probe_one(&self, credential: &ProxyCredential) -> (UptimeStatus, Option<u64>) {
        match tokio::time::timeout(self.config.probe_timeout(), self.probe.probe(credential)).await
        {
            Ok(Ok(outcome)) => {
                let latency = u64::try_from(outcome.latency.as_millis()).unwrap_or(u64::MAX);
                let status = if outcome.latency > self.config.degraded_after() {
                    UptimeStatus::Degraded
                } else {
                    UptimeStatus::Up
                };
                (status, Some(latency))
            }
            Ok(Err(e)) => {
                debug!(host = %credential.host, error = %e, "Probe error");
                (UptimeStatus::Down, None)
            }
            Err(_) => (UptimeStatus::Down, None),
        }
    }

    /// Propose credits for the last completed window of every monitored type.
    ///
    /// Returns the credits created by this run.
    pub async fn evaluate(&self, now: DateTime<Utc>) -> Result<Vec<SlaCredit>> {
        let mut created = Vec::new();
        for config in self.store.list_configs().await? {
            if !config.active {
                continue;
            }
            let Some((start, end)) = window_for(now, config.measurement_window_hours) else {
                continue;
            };
            let records = self
                .store
                .uptime_between(&config.proxy_type, start, end)
                .await?;
            let Some(measured) = uptime_percent(&records) else {
                continue;
            };
            if measured >= config.guaranteed_uptime {
                continue;
            }

            // Compare and price on the exact ratio; only the stored figure is rounded.
            let amount =
                round_money((config.guaranteed_uptime - measured) * config.credit_per_percent);
            let uptime = round_money(measured);
            if amount <= Decimal::ZERO {
                continue;
            }

            let accounts: BTreeSet<Uuid> = self
                .store
                .orders_overlapping(&config.proxy_type, start, end)
                .await?
                .into_iter()
                .map(|o| o.account_id)
                .collect();

            for account_id in accounts {
                let credit = SlaCredit {
                    id: Uuid::new_v4(),
                    account_id,
                    proxy_type: config.proxy_type.clone(),
                    guaranteed_uptime: config.guaranteed_uptime,
                    actual_uptime: uptime,
                    credit_amount: amount,
                    status: CreditStatus::Pending,
                    window_start: start,
                    window_end: end,
                    reviewed_by: None,
                    created_at: now,
                };
                if self.store.insert_credit(&credit).await? {
                    info!(
                        credit_id = %credit.id,
                        %account_id,
                        proxy_type = %config.proxy_type,
                        %uptime,
                        %amount,
                        "SLA breach, credit proposed"
                    );
                    created.push(credit);
                }
            }
        }
        Ok(created)
    }

    pub async fn approve(&self, admin_id: Uuid, credit_id: Uuid) -> Result<SlaCredit> {
        require_admin(self.store.as_ref(), admin_id).await?;
        let credit = self
            .store
            .transition_credit(credit_id, CreditStatus::Pending, CreditStatus::Approved, admin_id)
            .await?;
        info!(%admin_id, %credit_id, "SLA credit approved");
        Ok(credit)
    }

    pub async fn reject(&self, admin_id: Uuid, credit_id: Uuid) -> Result<SlaCredit> {
        require_admin(self.store.as_ref(), admin_id).await?;
        let credit = self
            .store
            .transition_credit(credit_id, CreditStatus::Pending, CreditStatus::Rejected, admin_id)
            .await?;
        info!(%admin_id, %credit_id, "SLA credit rejected");
        Ok(credit)
    }

    /// Credit an approved SLA credit to its account.
    pub async fn apply(&self, admin_id: Uuid, credit_id: Uuid) -> Result<SlaCredit> {
        require_admin(self.store.as_ref(), admin_id).await?;
        let credit = self.credit(credit_id).await?;
        match credit.status {
            CreditStatus::Approved => {}
            CreditStatus::Applied => {
                return Err(ServiceError::AlreadyProcessed(format!(
                    "sla credit {}",
                    credit_id
                )))
            }
            other => {
                return Err(ServiceError::invalid(format!(
                    "sla credit {} is {}, not approved",
                    credit_id, other
                )))
            }
        }

        let posting = Posting::credit(
            credit.account_id,
            credit.credit_amount,
            Some(format!("sla_credit:{}", credit.id)),
            format!(
                "SLA credit: {} uptime {}% below {}%",
                credit.proxy_type, credit.actual_uptime, credit.guaranteed_uptime
            ),
        )
        .with(Attachment::ApplySlaCredit(credit.id));
        let receipt = self.ledger.post(posting).await?;

        info!(
            %admin_id,
            %credit_id,
            account_id = %credit.account_id,
            amount = %credit.credit_amount,
            balance = %receipt.balance,
            "SLA credit applied"
        );
        self.credit(credit_id).await
    }

    async fn credit(&self, credit_id: Uuid) -> Result<SlaCredit> {
        self.store
            .get_credit(credit_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("sla credit {}", credit_id)))
    }

    pub async fn credits(&self, status: Option<CreditStatus>) -> Result<Vec<SlaCredit>> {
        Ok(self.store.credits(status).await?)
    }

    pub async fn upsert_config(&self, admin_id: Uuid, config: SlaConfig) -> Result<SlaConfig> {
        require_admin(self.store.as_ref(), admin_id).await?;
        let config = validate_config(config)?;
        self.store.upsert_config(&config).await?;
        info!(
            %admin_id,
            proxy_type = %config.proxy_type,
            guaranteed_uptime = %config.guaranteed_uptime,
            "SLA configuration saved"
        );
        Ok(config)
    }

    pub async fn configs(&self) -> Result<Vec<SlaConfig>> {
        Ok(self.store.list_configs().await?)
    }
}

fn validate_config(mut config: SlaConfig) -> Result<SlaConfig> {
    config.proxy_type = config.proxy_type.trim().to_string();
    if config.proxy_type.is_empty() {
        return Err(ServiceError::invalid("proxy_type is required"));
    }
    if config.guaranteed_uptime <= Decimal::ZERO || config.guaranteed_uptime > Decimal::ONE_HUNDRED
    {
        return Err(ServiceError::invalid(
            "guaranteed_uptime must be above 0 and at most 100",
        ));
    }
    if config.credit_per_percent < Decimal::ZERO {
        return Err(ServiceError::invalid("credit_per_percent cannot be negative"));
    }
    if config.measurement_window_hours == 0 {
        return Err(ServiceError::invalid(
            "measurement_window_hours must be positive",
        ));
    }
    config.credit_per_percent = round_money(config.credit_per_percent);
    Ok(config)
}

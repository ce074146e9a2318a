//! Referral commissions.
//!
//! Earnings are recorded as pending liabilities and only reach the referrer's
//! balance when the release sweep finds them past the hold period.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ReferralConfig;
use crate::error::{Result, ServiceError};
use crate::interfaces::{Attachment, Posting, Store};
use crate::model::money::percent_of;
use crate::model::{EarningStatus, ReferralEarning};

use super::ledger::LedgerService;
use super::settings::{self, Settings};

/// Outcome of one release sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub released: usize,
    /// Claimed concurrently by another sweep.
    pub skipped: usize,
    /// Left pending for the next run.
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralSummary {
    pub referrer_id: Uuid,
    pub referred_accounts: usize,
    pub pending: Decimal,
    pub completed: Decimal,
    pub earnings: Vec<ReferralEarning>,
}

pub struct ReferralService {
    store: Arc<dyn Store>,
    ledger: Arc<LedgerService>,
    settings: Arc<dyn Settings>,
    defaults: ReferralConfig,
}

impl ReferralService {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<LedgerService>,
        settings: Arc<dyn Settings>,
        defaults: ReferralConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            settings,
            defaults,
        }
    }

    /// Record a pending commission for the referrer of `referred_id`.
    ///
    /// Never fails the caller: every error is logged and yields `None`.
    pub async fn award(
        &self,
        referred_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Option<ReferralEarning> {
        match self.try_award(referred_id, amount, description).await {
            Ok(earning) => earning,
            Err(e) => {
                error!(
                    referred_id = %referred_id,
                    %amount,
                    error = %e,
                    "Failed to award referral commission"
                );
                None
            }
        }
    }

    async fn try_award(
        &self,
        referred_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<Option<ReferralEarning>> {
        if !self.settings.get_bool(settings::REFERRAL_ENABLED, true).await {
            return Ok(None);
        }
        let Some(link) = self.store.link_for(referred_id).await? else {
            return Ok(None);
        };
        let referrer = self
            .store
            .get_account(link.referrer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("referrer {}", link.referrer_id)))?;

        let rate = match referrer.referral_rate {
            Some(rate) => rate,
            None => {
                self.settings
                    .get_decimal(settings::REFERRAL_PERCENTAGE, self.defaults.percentage)
                    .await
            }
        };
        let commission = percent_of(amount, rate);
        if commission <= Decimal::ZERO {
            debug!(%referred_id, %amount, %rate, "Commission rounds to zero, skipped");
            return Ok(None);
        }

        let earning = ReferralEarning {
            id: Uuid::new_v4(),
            referrer_id: referrer.id,
            referred_id,
            amount: commission,
            status: EarningStatus::Pending,
            description: format!("{} ({}% of {})", description, rate.normalize(), amount),
            created_at: Utc::now(),
            completed_at: None,
        };
        self.store.insert_earning(&earning).await?;

        info!(
            earning_id = %earning.id,
            referrer_id = %referrer.id,
            %referred_id,
            amount = %commission,
            "Referral commission pending"
        );
        Ok(Some(earning))
    }

    /// Credit every pending earning older than the hold period.
    ///
    /// Each earning is claimed and credited in one posting, so overlapping
    /// sweeps release it at most once.
    pub async fn release_due(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let hold_days = self
            .settings
            .get_u32(settings::REFERRAL_HOLD_DAYS, self.defaults.hold_days)
            .await;
        let cutoff = now - Duration::days(i64::from(hold_days));
        let due = self.store.pending_earnings_before(cutoff).await?;

        let mut report = SweepReport::default();
        for earning in due {
            match self.release(&earning).await {
                Ok(()) => report.released += 1,
                Err(ServiceError::AlreadyProcessed(_)) => {
                    debug!(earning_id = %earning.id, "Earning already released");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(
                        earning_id = %earning.id,
                        referrer_id = %earning.referrer_id,
                        error = %e,
                        "Failed to release earning, left pending"
                    );
                    report.failed += 1;
                }
            }
        }

        if report != SweepReport::default() {
            info!(
                released = report.released,
                skipped = report.skipped,
                failed = report.failed,
                "Referral sweep finished"
            );
        }
        Ok(report)
    }

    async fn release(&self, earning: &ReferralEarning) -> Result<()> {
        let guard = self.ledger.locks().lock(earning.referrer_id).await;
        let posting = Posting::credit(
            earning.referrer_id,
            earning.amount,
            Some(format!("referral:{}", earning.id)),
            format!("Referral commission: {}", earning.description),
        )
        .with(Attachment::ReleaseEarning(earning.id));
        self.ledger.post_locked(&guard, posting).await?;
        Ok(())
    }

    pub async fn summary(&self, referrer_id: Uuid) -> Result<ReferralSummary> {
        let earnings = self.store.earnings_for(referrer_id).await?;
        let referred_accounts = self.store.referred_by(referrer_id).await?.len();

        let total = |status: EarningStatus| -> Decimal {
            earnings
                .iter()
                .filter(|e| e.status == status)
                .map(|e| e.amount)
                .sum()
        };

        Ok(ReferralSummary {
            referrer_id,
            referred_accounts,
            pending: total(EarningStatus::Pending),
            completed: total(EarningStatus::Completed),
            earnings,
        })
    }
}

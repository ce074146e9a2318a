//! Payment provider notifications.
//!
//! A confirmed payment credits the account exactly once: the webhook row and
//! the ledger entry commit together, keyed by `(provider, event_id)`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PaymentsConfig;
use crate::error::{Result, ServiceError};
use crate::interfaces::{Attachment, Posting, Store};
use crate::model::WebhookEvent;
use crate::utils::signature;

use super::ledger::{validate_amount, LedgerService};
use super::referral::ReferralService;

/// The only event type that moves money.
pub const PAYMENT_CONFIRMED: &str = "payment.confirmed";

/// Notification body sent by a payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub account_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Credited {
        account_id: Uuid,
        amount: Decimal,
        balance: Decimal,
    },
    AlreadyProcessed,
    Ignored { reason: String },
}

pub struct PaymentService {
    store: Arc<dyn Store>,
    ledger: Arc<LedgerService>,
    referral: Arc<ReferralService>,
    config: PaymentsConfig,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<LedgerService>,
        referral: Arc<ReferralService>,
        config: PaymentsConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            referral,
            config,
        }
    }

    /// Verify, parse and apply one notification.
    ///
    /// A signature failure changes nothing. Replays return
    /// [`WebhookOutcome::AlreadyProcessed`].
    pub async fn handle_webhook(
        &self,
        provider: &str,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookOutcome> {
        let Some(secret) = self.config.secret(provider) else {
            warn!(provider, "Webhook from unknown payment provider");
            return Err(ServiceError::InvalidSignature);
        };
        let header = signature_header.ok_or(ServiceError::InvalidSignature)?;
        signature::verify(
            secret,
            payload,
            header,
            Utc::now().timestamp(),
            Duration::from_secs(self.config.tolerance_secs),
        )
        .map_err(|e| {
            warn!(provider, error = %e, "Webhook signature rejected");
            ServiceError::InvalidSignature
        })?;

        let event: PaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::invalid(format!("malformed payment event: {}", e)))?;

        if event.event_type != PAYMENT_CONFIRMED {
            debug!(provider, event_id = %event.id, event_type = %event.event_type, "Webhook ignored");
            return Ok(WebhookOutcome::Ignored {
                reason: format!("event type {}", event.event_type),
            });
        }
        if event.id.trim().is_empty() {
            return Err(ServiceError::invalid("payment event id is required"));
        }
        let amount = validate_amount(event.amount)?;

        if self.store.webhook_event(provider, &event.id).await?.is_some() {
            info!(provider, event_id = %event.id, "Webhook replay ignored");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let posting = Posting::credit(
            event.account_id,
            amount,
            Some(format!("webhook:{}:{}", provider, event.id)),
            format!("Top-up via {} ({})", provider, event.id),
        )
        .with(Attachment::RecordWebhook(WebhookEvent {
            provider: provider.to_string(),
            event_id: event.id.clone(),
            account_id: event.account_id,
            amount,
            received_at: Utc::now(),
        }));

        let receipt = match self.ledger.post(posting).await {
            Ok(receipt) => receipt,
            Err(ServiceError::AlreadyProcessed(_)) => {
                info!(provider, event_id = %event.id, "Webhook processed concurrently");
                return Ok(WebhookOutcome::AlreadyProcessed);
            }
            Err(e) => return Err(e),
        };

        info!(
            provider,
            event_id = %event.id,
            account_id = %event.account_id,
            %amount,
            balance = %receipt.balance,
            "Account topped up"
        );

        self.referral
            .award(event.account_id, amount, &format!("Top-up {}", event.id))
            .await;

        Ok(WebhookOutcome::Credited {
            account_id: event.account_id,
            amount,
            balance: receipt.balance,
        })
    }
}

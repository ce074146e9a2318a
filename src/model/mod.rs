//! Domain records.
//!
//! Plain data types shared by the storage ports, the services and the HTTP
//! surface. Status enums round-trip through their lowercase names, which is
//! also how they are persisted.

/// Error returned when a persisted enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::model::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::model::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

mod account;
mod ledger;
pub mod money;
mod order;
mod referral;
mod sla;

pub use account::{Account, BalanceAudit, Role};
pub use ledger::{Direction, LedgerEntry, WebhookEvent};
pub use order::{Order, OrderStatus, Product, ProxyCredential};
pub use referral::{EarningStatus, ReferralEarning, ReferralLink};
pub use sla::{CreditStatus, SlaConfig, SlaCredit, UptimeRecord, UptimeStatus};

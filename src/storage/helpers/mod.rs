//! Shared storage helper functions.
//!
//! Column codecs used by the persistent backends: timestamps as fixed-width
//! RFC 3339 text, money as integer minor units, percentages as decimal text.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::interfaces::{Result, StorageError};
use crate::model::money;

/// Format a timestamp so that text ordering matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

pub fn parse_optional_timestamp(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.as_deref().map(parse_timestamp).transpose()
}

/// Encode a money amount as minor units.
pub fn encode_money(amount: Decimal) -> Result<i64> {
    money::to_minor(amount)
        .ok_or_else(|| StorageError::InvalidData(format!("amount out of range: {}", amount)))
}

pub fn decode_money(minor: i64) -> Decimal {
    money::from_minor(minor)
}

pub fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .map_err(|e| StorageError::InvalidData(format!("bad decimal {:?}: {}", text, e)))
}

pub fn parse_uuid(text: &str) -> Result<Uuid> {
    Ok(Uuid::parse_str(text)?)
}

pub fn parse_optional_uuid(text: Option<String>) -> Result<Option<Uuid>> {
    text.as_deref().map(parse_uuid).transpose()
}

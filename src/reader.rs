//! Fetches the transfer history from the ledger and shapes it for display.

use alloy::primitives::{utils::format_units, U256};
use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::consts::DEFAULT_TIMESTAMP_FORMAT;
use crate::contract_client::{Ledger, TransferStruct};
use crate::error::Result;

/// A transfer as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub address_from: String,
    pub address_to: String,
    pub timestamp: String,
    pub message: String,
    pub keyword: String,
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct DisplayOptions {
    /// `chrono` format string applied in the local time zone.
    pub timestamp_format: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Convert an 18-decimal fixed-point amount into display units.
pub fn format_amount(raw: U256) -> f64 {
    match format_units(raw, "ether") {
        Ok(s) => s.parse().unwrap_or_else(|e| {
            warn!(amount = %raw, error = %e, "Unparseable formatted amount");
            f64::NAN
        }),
        Err(e) => {
            warn!(amount = %raw, error = %e, "Failed to format amount");
            f64::NAN
        }
    }
}

/// Whether `format` is a usable `chrono` strftime string.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Render seconds since the epoch in the viewer's local time zone. An
/// unusable `format` falls back to the default one.
pub fn format_timestamp(secs: u64, format: &str) -> String {
    let utc = i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    match utc {
        Some(utc) => {
            let local = utc.with_timezone(&Local);
            let mut out = String::new();
            if write!(out, "{}", local.format(format)).is_ok() {
                return out;
            }
            warn!(format = %format, "Invalid timestamp format, using default");
            local.format(DEFAULT_TIMESTAMP_FORMAT).to_string()
        }
        None => {
            warn!(timestamp = secs, "Timestamp out of range");
            secs.to_string()
        }
    }
}

pub fn to_display(raw: &TransferStruct, options: &DisplayOptions) -> Transaction {
    let secs = u64::try_from(raw.timestamp).unwrap_or(u64::MAX);
    Transaction {
        address_from: raw.sender.to_string(),
        address_to: raw.receiver.to_string(),
        timestamp: format_timestamp(secs, &options.timestamp_format),
        message: raw.message.clone(),
        keyword: raw.keyword.clone(),
        amount: format_amount(raw.amount),
    }
}

/// Fetch the complete list and the total count. Always a full refetch.
pub async fn read_all(
    ledger: &dyn Ledger,
    options: &DisplayOptions,
) -> Result<(Vec<Transaction>, u64)> {
    let raw = ledger.get_all_transactions().await?;
    let count = ledger.get_transaction_count().await?;
    debug!(records = raw.len(), count, "Fetched transactions from ledger");

    let transactions = raw.iter().map(|r| to_display(r, options)).collect();
    Ok((transactions, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{raw_transfer, MockLedger};
    use chrono::TimeZone;

    #[test]
    fn test_one_ether_displays_as_one() {
        let raw = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(format_amount(raw), 1.0);
    }

    #[test]
    fn test_fractional_amount() {
        let raw = U256::from(1_500_000_000_000_000u128);
        assert_eq!(format_amount(raw), 0.0015);
    }

    #[test]
    fn test_zero_timestamp_is_local_epoch() {
        let expected = Local
            .timestamp_opt(0, 0)
            .single()
            .unwrap()
            .format(DEFAULT_TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(format_timestamp(0, DEFAULT_TIMESTAMP_FORMAT), expected);
    }

    #[test]
    fn test_out_of_range_timestamp_falls_back_to_seconds() {
        assert_eq!(format_timestamp(u64::MAX, "%Y"), u64::MAX.to_string());
    }

    #[test]
    fn test_invalid_format_falls_back_to_default() {
        assert!(!is_valid_timestamp_format("%Q"));
        assert!(is_valid_timestamp_format(DEFAULT_TIMESTAMP_FORMAT));
        assert_eq!(
            format_timestamp(0, "%Q"),
            format_timestamp(0, DEFAULT_TIMESTAMP_FORMAT)
        );
    }

    #[test]
    fn test_to_display_maps_fields() {
        let raw = raw_transfer(2, "gm", "coffee");
        let tx = to_display(&raw, &DisplayOptions::default());

        assert_eq!(tx.address_from, raw.sender.to_string());
        assert_eq!(tx.address_to, raw.receiver.to_string());
        assert_eq!(tx.message, "gm");
        assert_eq!(tx.keyword, "coffee");
        assert_eq!(tx.amount, 2.0);
    }

    #[tokio::test]
    async fn test_read_all_returns_list_and_count() {
        let ledger = MockLedger::with_records(vec![
            raw_transfer(1, "first", "cat"),
            raw_transfer(3, "second", "dog"),
        ]);

        let (transactions, count) = read_all(&ledger, &DisplayOptions::default())
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].message, "second");
        assert_eq!(transactions[1].amount, 3.0);
    }
}

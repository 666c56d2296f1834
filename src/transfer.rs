use std::str::FromStr;

use alloy::primitives::{utils::parse_ether, Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::consts::TRANSFER_GAS_LIMIT;
use crate::contract_client::Ledger;
use crate::error::{Error, Result};
use crate::wallet::{TransferRequest, WalletProvider};

/// The user-entered transfer form. Every field is kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    pub address_to: String,
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    AddressTo,
    Amount,
    Keyword,
    Message,
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "addressTo" => Ok(FormField::AddressTo),
            "amount" => Ok(FormField::Amount),
            "keyword" => Ok(FormField::Keyword),
            "message" => Ok(FormField::Message),
            other => Err(format!("unknown form field {other:?}")),
        }
    }
}

impl FormData {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::AddressTo => self.address_to = value,
            FormField::Amount => self.amount = value,
            FormField::Keyword => self.keyword = value,
            FormField::Message => self.message = value,
        }
    }
}

/// Hashes of both halves of a submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer_hash: B256,
    pub ledger_hash: B256,
    pub to: Address,
    pub amount: U256,
}

/// Convert a human-entered decimal amount into base units.
pub fn parse_amount(input: &str) -> Result<U256> {
    parse_ether(input.trim()).map_err(|e| Error::InvalidAmount {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

pub fn parse_recipient(input: &str) -> Result<Address> {
    input.trim().parse::<Address>().map_err(|e| Error::InvalidAddress {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Send the native transfer through the wallet, then record its metadata in
/// the ledger and wait for that call to be mined.
pub async fn submit(
    wallet: &dyn WalletProvider,
    ledger: &dyn Ledger,
    from: Address,
    form: &FormData,
) -> Result<TransferReceipt> {
    let to = parse_recipient(&form.address_to)?;
    let amount = parse_amount(&form.amount)?;

    let request = TransferRequest {
        from,
        to,
        value: amount,
        gas: TRANSFER_GAS_LIMIT,
    };
    let transfer_hash = wallet.send_transaction(&request).await?;
    info!(transfer_hash = ?transfer_hash, to = %to, amount = %amount, "Native transfer accepted");

    let ledger_hash = ledger
        .add_to_blockchain(to, amount, form.message.clone(), form.keyword.clone())
        .await?;
    info!(ledger_hash = ?ledger_hash, "Transfer recorded on ledger");

    Ok(TransferReceipt {
        transfer_hash,
        ledger_hash,
        to,
        amount,
    })
}

use alloy::{
    contract::{CallBuilder, CallDecoder},
    primitives::B256,
    providers::Provider,
    sol_types::decode_revert_reason,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Error, Result};

/// Sends contract writes one at a time and waits for them to be mined.
#[derive(Clone)]
pub(crate) struct TransactionSubmitter {
    tx_lock: Arc<Mutex<()>>,
    gas_limit: Option<u64>,
}

impl TransactionSubmitter {
    pub(crate) fn new(tx_lock: Arc<Mutex<()>>) -> Self {
        Self {
            tx_lock,
            gas_limit: None,
        }
    }

    pub(crate) async fn invoke<P, D>(&self, method: &str, call: CallBuilder<P, D>) -> Result<B256>
    where
        P: Provider + Clone,
        D: CallDecoder + Clone,
    {
        // Pre-simulate to catch reverts with proper error messages
        if let Err(e) = call.call().await {
            let e = decode_error(e);
            return Err(Error::Contract(format!("{method} reverted: {e}")));
        }

        let call = match self.gas_limit {
            Some(gas) => call.gas(gas),
            None => call,
        };

        let _guard = self.tx_lock.lock().await;
        let pending = call.send().await.map_err(|e| {
            let e = decode_error(e);
            Error::Contract(format!("{method} failed to send: {e}"))
        })?;

        let tx_hash = *pending.tx_hash();
        info!(method = %method, tx_hash = ?tx_hash, "Transaction sent, awaiting confirmation");

        let receipt = pending.get_receipt().await.map_err(|e| {
            Error::Transport(format!("{method} confirmation failed for {tx_hash:?}: {e}"))
        })?;

        if !receipt.status() {
            if let Some(limit) = self.gas_limit {
                let used = receipt.gas_used;
                if used >= limit {
                    return Err(Error::Contract(format!(
                        "{method} ran out of gas (used {used} of {limit} limit). Tx: {tx_hash:?}"
                    )));
                }
            }
            return Err(Error::Contract(format!(
                "{method} reverted on-chain. Tx hash: {tx_hash:?}"
            )));
        }

        info!(
            method = %method,
            tx_hash = ?tx_hash,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(tx_hash)
    }

    pub(crate) fn with_gas_limit(&self, limit: u64) -> Self {
        let mut this = self.clone();
        this.gas_limit = Some(limit);
        this
    }
}

/// Prefer the decoded `Error(string)` / panic reason over the raw transport message.
fn decode_error(error: alloy::contract::Error) -> String {
    error
        .as_revert_data()
        .and_then(|data| decode_revert_reason(&data))
        .unwrap_or_else(|| error.to_string())
}

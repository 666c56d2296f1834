use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::consts::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::error::{Error, Result};

/// A native value transfer as handed to the wallet's `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: u64,
}

impl TransferRequest {
    /// JSON-RPC params with quantities hex encoded.
    pub fn to_rpc_params(&self) -> Value {
        json!([{
            "from": self.from.to_string(),
            "to": self.to.to_string(),
            "gas": format!("0x{:x}", self.gas),
            "value": format!("0x{:x}", self.value),
        }])
    }
}

/// Account access and transaction signing, in the shape of an EIP-1193 provider.
///
/// Implementors only need `request`; the typed helpers decode its results.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Accounts the wallet already authorized, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>> {
        parse_accounts(self.request("eth_accounts", json!([])).await?)
    }

    /// Asks the user to authorize account access.
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        parse_accounts(self.request("eth_requestAccounts", json!([])).await?)
    }

    /// Submits a native transfer and returns its hash once the wallet accepts it.
    async fn send_transaction(&self, tx: &TransferRequest) -> Result<B256> {
        let result = self
            .request("eth_sendTransaction", tx.to_rpc_params())
            .await?;
        serde_json::from_value(result.clone())
            .map_err(|e| Error::InvalidResponse(format!("transaction hash {result}: {e}")))
    }
}

fn parse_accounts(value: Value) -> Result<Vec<Address>> {
    let raw: Vec<String> = serde_json::from_value(value)
        .map_err(|e| Error::InvalidResponse(format!("account list: {e}")))?;
    raw.into_iter()
        .map(|a| {
            a.parse::<Address>().map_err(|e| Error::InvalidAddress {
                input: a.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Wallet backed by a JSON-RPC endpoint that manages the accounts itself,
/// such as a development node with unlocked accounts.
pub struct RpcWallet {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcWallet {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method = %method, id, "Wallet request");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Error objects win over the HTTP status; some wallets pair them with 4xx.
        let parsed = serde_json::from_slice::<RpcResponse>(&bytes);
        if let Ok(RpcResponse {
            error: Some(err), ..
        }) = &parsed
        {
            return Err(Error::from_rpc(err.code, err.message.clone()));
        }
        if !status.is_success() {
            return Err(Error::Transport(format!("{method}: HTTP {status}")));
        }

        parsed
            .map_err(|e| Error::InvalidResponse(format!("{method} response: {e}")))?
            .result
            .ok_or_else(|| Error::InvalidResponse(format!("{method} returned no result")))
    }
}

/// Wallet holding a private key in-process; transfers are signed locally and
/// broadcast through the chain provider.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    provider: DynProvider,
}

impl LocalWallet {
    pub async fn connect(signer: PrivateKeySigner, rpc_url: &str) -> Result<Self> {
        let wallet = EthereumWallet::from(signer.clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(rpc_url)
            .await?
            .erased();
        Ok(Self { signer, provider })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.address().to_string()])),
            "eth_sendTransaction" => {
                let mut txs: Vec<TransactionRequest> = serde_json::from_value(params)
                    .map_err(|e| Error::InvalidResponse(format!("transaction params: {e}")))?;
                if txs.is_empty() {
                    return Err(Error::InvalidResponse(
                        "eth_sendTransaction without a transaction".to_string(),
                    ));
                }
                let tx = txs.swap_remove(0);
                let pending = self.provider.send_transaction(tx).await?;
                Ok(json!(pending.tx_hash()))
            }
            other => Ok(self
                .provider
                .raw_request::<Value, Value>(other.to_string().into(), params)
                .await?),
        }
    }
}

/// Parse a private key string (with or without 0x prefix) into a signer.
pub fn load_signer(private_key: &str) -> anyhow::Result<PrivateKeySigner> {
    let key = private_key.trim_start_matches("0x");
    key.parse::<PrivateKeySigner>()
        .context("Failed to parse private key")
}

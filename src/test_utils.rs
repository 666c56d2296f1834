//! In-memory wallet and ledger doubles shared by the unit tests.

use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::contract_client::{ContractGateway, Ledger, TransferStruct};
use crate::error::{Error, Result, USER_REJECTED_CODE};
use crate::wallet::{TransferRequest, WalletProvider};

pub const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

pub fn raw_transfer(ether: u64, message: &str, keyword: &str) -> TransferStruct {
    TransferStruct {
        sender: ALICE,
        receiver: BOB,
        amount: U256::from(ether as u128 * ONE_ETHER),
        message: message.to_string(),
        timestamp: U256::from(1_700_000_000u64),
        keyword: keyword.to_string(),
    }
}

#[derive(Default)]
pub struct MockWallet {
    accounts: Vec<Address>,
    authorized: bool,
    reject_connect: bool,
    reject_sends: bool,
    fail_accounts: bool,
    sent: Mutex<Vec<TransferRequest>>,
}

impl MockWallet {
    /// A wallet that will hand out `accounts` once asked.
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            ..Default::default()
        }
    }

    /// Accounts are visible through `eth_accounts` without prompting.
    pub fn already_authorized(mut self) -> Self {
        self.authorized = true;
        self
    }

    pub fn rejecting_connect(mut self) -> Self {
        self.reject_connect = true;
        self
    }

    /// `eth_accounts` fails as if the wallet were unreachable.
    pub fn failing_accounts(mut self) -> Self {
        self.fail_accounts = true;
        self
    }

    pub fn rejecting_sends(mut self) -> Self {
        self.reject_sends = true;
        self
    }

    pub fn sent(&self) -> Vec<TransferRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, _params: Value) -> Result<Value> {
        let accounts: Vec<String> = self.accounts.iter().map(|a| a.to_string()).collect();
        match method {
            "eth_accounts" if self.fail_accounts => {
                Err(Error::Transport("wallet unreachable".to_string()))
            }
            "eth_accounts" if self.authorized => Ok(json!(accounts)),
            "eth_accounts" => Ok(json!([])),
            "eth_requestAccounts" if self.reject_connect => Err(Error::from_rpc(
                USER_REJECTED_CODE,
                "User rejected the request.",
            )),
            "eth_requestAccounts" => Ok(json!(accounts)),
            other => Err(Error::from_rpc(-32601, format!("{other} not supported"))),
        }
    }

    async fn send_transaction(&self, tx: &TransferRequest) -> Result<B256> {
        if self.reject_sends {
            return Err(Error::from_rpc(
                USER_REJECTED_CODE,
                "User denied transaction signature.",
            ));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx.clone());
        Ok(B256::with_last_byte(sent.len() as u8))
    }
}

#[derive(Default)]
pub struct MockLedger {
    records: Mutex<Vec<TransferStruct>>,
    fail_reads: bool,
    fail_writes: bool,
    gate: Option<Arc<Notify>>,
}

impl MockLedger {
    pub fn with_records(records: Vec<TransferStruct>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Writes block until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn records(&self) -> Vec<TransferStruct> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_all_transactions(&self) -> Result<Vec<TransferStruct>> {
        if self.fail_reads {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(self.records())
    }

    async fn get_transaction_count(&self) -> Result<u64> {
        if self.fail_reads {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn add_to_blockchain(
        &self,
        receiver: Address,
        amount: U256,
        message: String,
        keyword: String,
    ) -> Result<B256> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_writes {
            return Err(Error::Contract("addToBlockchain reverted".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let timestamp = U256::from(1_700_000_000u64 + records.len() as u64);
        records.push(TransferStruct {
            sender: ALICE,
            receiver,
            amount,
            message,
            timestamp,
            keyword,
        });
        Ok(B256::with_last_byte(0xff))
    }
}

/// Hands out the same ledger and remembers which account asked for it.
pub struct MockGateway {
    ledger: Arc<MockLedger>,
    senders: Mutex<Vec<Option<Address>>>,
}

impl MockGateway {
    pub fn new(ledger: MockLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn ledger_ref(&self) -> &MockLedger {
        &self.ledger
    }

    pub fn senders(&self) -> Vec<Option<Address>> {
        self.senders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractGateway for MockGateway {
    async fn ledger(&self, from: Option<Address>) -> Result<Arc<dyn Ledger>> {
        self.senders.lock().unwrap().push(from);
        Ok(self.ledger.clone())
    }
}

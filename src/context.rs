//! Shared transaction state and the operations allowed to mutate it.
//!
//! `TransactionContext` owns the account, the form, the loading flag, the
//! transaction list and the cached count. Callers read cloned snapshots and
//! mutate only through the methods here. The state lock is never held across
//! wallet or chain I/O.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::contract_client::{ContractGateway, Ledger};
use crate::error::{Error, Result};
use crate::reader::{self, DisplayOptions, Transaction};
use crate::state::LocalStorage;
use crate::transfer::{self, FormData, FormField, TransferReceipt};
use crate::wallet::WalletProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disconnected,
    Connecting,
    ConnectedIdle,
    Submitting,
}

/// Point-in-time copy of the context state handed to the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    pub phase: Phase,
    pub account: Option<Address>,
    pub form: FormData,
    pub is_loading: bool,
    pub transactions: Vec<Transaction>,
    pub transaction_count: Option<u64>,
}

impl ContextSnapshot {
    /// Phase changes made outside a submission never leave `Submitting`;
    /// only the submission's own guard does.
    fn enter(&mut self, phase: Phase) {
        if self.phase != Phase::Submitting {
            self.phase = phase;
        }
    }

    fn finish_submission(&mut self) {
        self.is_loading = false;
        if self.phase == Phase::Submitting {
            self.phase = Phase::ConnectedIdle;
        }
    }
}

/// Held for the lifetime of one submission. Dropping it, including when the
/// submitting future is cancelled, clears the loading flag before the
/// in-flight permit is released.
struct SubmissionGuard {
    state: Arc<Mutex<ContextSnapshot>>,
    permit: Option<OwnedMutexGuard<()>>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        let permit = self.permit.take();
        match self.state.try_lock() {
            Ok(mut state) => {
                state.finish_submission();
                drop(permit);
            }
            Err(_) => {
                let state = self.state.clone();
                match Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            state.lock().await.finish_submission();
                            drop(permit);
                        });
                    }
                    Err(_) => warn!("No runtime to clear the loading flag on"),
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct TransactionContext {
    wallet: Option<Arc<dyn WalletProvider>>,
    gateway: Arc<dyn ContractGateway>,
    storage: LocalStorage,
    display: DisplayOptions,
    state: Arc<Mutex<ContextSnapshot>>,
    in_flight: Arc<Mutex<()>>,
}

impl TransactionContext {
    /// `wallet` is `None` when no provider is available.
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        gateway: Arc<dyn ContractGateway>,
        storage: LocalStorage,
        display: DisplayOptions,
    ) -> Self {
        let state = ContextSnapshot {
            transaction_count: storage.transaction_count(),
            ..Default::default()
        };
        Self {
            wallet,
            gateway,
            storage,
            display,
            state: Arc::new(Mutex::new(state)),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub async fn snapshot(&self) -> ContextSnapshot {
        self.state.lock().await.clone()
    }

    pub async fn handle_change(&self, field: FormField, value: impl Into<String>) {
        self.state.lock().await.form.set(field, value);
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletProvider>> {
        self.wallet.as_ref().ok_or(Error::ProviderMissing)
    }

    async fn ledger(&self) -> Result<Arc<dyn Ledger>> {
        let account = self.state.lock().await.account;
        self.gateway.ledger(account).await
    }

    /// Startup check: pick up an already-authorized account and sync the
    /// cached count. The two steps run independently; the first error is
    /// returned. Returns `ProviderMissing` without touching state when no
    /// wallet is available.
    pub async fn init(&self) -> Result<()> {
        let wallet = self.wallet()?;

        let accounts = wallet
            .accounts()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to query authorized accounts"));
        if let Ok(accounts) = &accounts {
            match accounts.first() {
                Some(&account) => {
                    {
                        let mut state = self.state.lock().await;
                        state.account = Some(account);
                        state.enter(Phase::ConnectedIdle);
                    }
                    info!(account = %account, "Found authorized account");
                    if let Err(e) = self.refresh_transactions().await {
                        warn!(error = %e, "Failed to load transactions");
                    }
                }
                None => info!("No authorized accounts found"),
            }
        }

        let synced = self.sync_transaction_count().await;
        accounts?;
        synced?;
        Ok(())
    }

    /// Ask the wallet for account access and resynchronize in memory.
    pub async fn connect_wallet(&self) -> Result<Address> {
        let wallet = self.wallet()?;

        self.state.lock().await.enter(Phase::Connecting);

        let account = match wallet.request_accounts().await {
            Ok(accounts) => accounts.first().copied().ok_or(Error::NoAccounts),
            Err(e) => Err(e),
        };

        let account = match account {
            Ok(account) => account,
            Err(e) => {
                self.state.lock().await.enter(Phase::Disconnected);
                if e.is_user_rejected() {
                    warn!(error = %e, "Wallet connection rejected");
                } else {
                    warn!(error = %e, "Wallet connection failed");
                }
                return Err(e);
            }
        };

        {
            let mut state = self.state.lock().await;
            state.account = Some(account);
            state.enter(Phase::ConnectedIdle);
        }
        info!(account = %account, "Wallet connected");

        self.resync().await;
        Ok(account)
    }

    /// Submit the current form. Fails with `Busy` while another submission is
    /// in flight. The loading flag is cleared on every exit path, including
    /// cancellation of the returned future.
    pub async fn send_transaction(&self) -> Result<TransferReceipt> {
        let wallet = self.wallet()?.clone();
        let permit = self
            .in_flight
            .clone()
            .try_lock_owned()
            .map_err(|_| Error::Busy)?;

        let (from, form) = {
            let mut state = self.state.lock().await;
            let from = state.account.ok_or(Error::NotConnected)?;
            state.phase = Phase::Submitting;
            state.is_loading = true;
            (from, state.form.clone())
        };
        let guard = SubmissionGuard {
            state: self.state.clone(),
            permit: Some(permit),
        };

        let result = self.submit(wallet.as_ref(), from, &form).await;
        drop(guard);

        match &result {
            Ok(receipt) => {
                info!(ledger_hash = ?receipt.ledger_hash, "Transaction submitted");
                self.resync().await;
            }
            Err(e) => warn!(error = %e, "Transaction submission failed"),
        }
        result
    }

    async fn submit(
        &self,
        wallet: &dyn WalletProvider,
        from: Address,
        form: &FormData,
    ) -> Result<TransferReceipt> {
        let ledger = self.ledger().await?;
        transfer::submit(wallet, ledger.as_ref(), from, form).await
    }

    /// Replace the transaction list with a fresh read from the ledger.
    pub async fn refresh_transactions(&self) -> Result<()> {
        self.wallet()?;
        let ledger = self.ledger().await?;
        let (transactions, _) = reader::read_all(ledger.as_ref(), &self.display).await?;
        debug!(count = transactions.len(), "Transactions refreshed");
        self.state.lock().await.transactions = transactions;
        Ok(())
    }

    /// Read the contract's count and overwrite the cache with it. The cache is
    /// advisory; a mismatch is only logged.
    pub async fn sync_transaction_count(&self) -> Result<u64> {
        self.wallet()?;
        let ledger = self.ledger().await?;
        let count = ledger.get_transaction_count().await?;

        let cached = self.storage.transaction_count();
        if cached != Some(count) {
            debug!(cached = ?cached, count, "Cached transaction count differs from contract");
        }
        self.storage.set_transaction_count(count)?;
        self.state.lock().await.transaction_count = Some(count);
        Ok(count)
    }

    /// In-memory replacement for reloading everything after a state change.
    async fn resync(&self) {
        if let Err(e) = self.sync_transaction_count().await {
            warn!(error = %e, "Failed to refresh transaction count");
        }
        if let Err(e) = self.refresh_transactions().await {
            warn!(error = %e, "Failed to refresh transactions");
        }
    }
}

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::consts::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_RPC_URL};
use crate::error::{Error, Result};

pub(crate) mod tx_submitter;

use tx_submitter::TransactionSubmitter;

sol! {
    /// One recorded transfer as stored by the ledger contract.
    #[derive(Debug, PartialEq, Eq)]
    struct TransferStruct {
        address sender;
        address receiver;
        uint256 amount;
        string message;
        uint256 timestamp;
        string keyword;
    }

    #[sol(rpc)]
    #[derive(Debug)]
    contract Transactions {
        function addToBlockchain(address receiver, uint256 amount, string memory message, string memory keyword) public;
        function getAllTransactions() public view returns (TransferStruct[] memory);
        function getTransactionCount() public view returns (uint256);
    }
}

use Transactions::TransactionsInstance;

/// Configuration for connecting to the ledger contract
#[derive(Clone, Debug)]
pub struct ContractConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    /// Fixed gas limit for `addToBlockchain`; estimated by the node when unset.
    pub gas_limit: Option<u64>,
}

impl ContractConfig {
    pub fn new(rpc_url: String, contract_address: Address) -> Self {
        Self {
            rpc_url,
            contract_address,
            gas_limit: None,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: Option<u64>) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Local anvil node with the contract deployed first by account #0.
    pub fn anvil_config() -> Self {
        Self::new(
            DEFAULT_RPC_URL.to_string(),
            DEFAULT_CONTRACT_ADDRESS
                .parse::<Address>()
                .expect("Invalid contract address"),
        )
    }
}

/// Operations the ledger contract offers.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_all_transactions(&self) -> Result<Vec<TransferStruct>>;

    async fn get_transaction_count(&self) -> Result<u64>;

    /// Records transfer metadata and waits for the call to be mined.
    async fn add_to_blockchain(
        &self,
        receiver: Address,
        amount: U256,
        message: String,
        keyword: String,
    ) -> Result<B256>;
}

/// Builds ledger handles bound to the current signer.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// A fresh handle for every call; `from` is the active account.
    async fn ledger(&self, from: Option<Address>) -> Result<Arc<dyn Ledger>>;
}

/// Client for interacting with the Transactions contract
#[derive(Clone)]
pub struct TransactionsClient<P: Provider + Clone> {
    contract: TransactionsInstance<P>,
    submitter: TransactionSubmitter,
    from: Option<Address>,
}

impl<P: Provider + Clone> TransactionsClient<P> {
    pub fn new(provider: P, config: &ContractConfig, tx_lock: Arc<Mutex<()>>) -> Self {
        let contract = TransactionsInstance::new(config.contract_address, provider);
        let submitter = TransactionSubmitter::new(tx_lock);
        let submitter = match config.gas_limit {
            Some(limit) => submitter.with_gas_limit(limit),
            None => submitter,
        };
        Self {
            contract,
            submitter,
            from: None,
        }
    }

    /// Send writes from `from`, leaving signing to the node.
    pub fn with_sender(mut self, from: Option<Address>) -> Self {
        self.from = from;
        self
    }

    /// Get the contract address
    pub fn address(&self) -> Address {
        *self.contract.address()
    }
}

#[async_trait]
impl<P> Ledger for TransactionsClient<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn get_all_transactions(&self) -> Result<Vec<TransferStruct>> {
        self.contract
            .getAllTransactions()
            .call()
            .await
            .map_err(|e| Error::Contract(format!("getAllTransactions failed: {e}")))
    }

    async fn get_transaction_count(&self) -> Result<u64> {
        let count = self
            .contract
            .getTransactionCount()
            .call()
            .await
            .map_err(|e| Error::Contract(format!("getTransactionCount failed: {e}")))?;
        u64::try_from(count)
            .map_err(|_| Error::InvalidResponse(format!("transaction count {count} overflows")))
    }

    async fn add_to_blockchain(
        &self,
        receiver: Address,
        amount: U256,
        message: String,
        keyword: String,
    ) -> Result<B256> {
        let call = self
            .contract
            .addToBlockchain(receiver, amount, message, keyword);
        let call = match self.from {
            Some(from) => call.from(from),
            None => call,
        };
        self.submitter.invoke("addToBlockchain", call).await
    }
}

/// Gateway over an alloy HTTP/WS provider.
///
/// With a local signer the handle signs writes itself; without one, writes
/// are sent from the active account and signed by the node.
#[derive(Clone)]
pub struct AlloyGateway {
    config: ContractConfig,
    signer: Option<PrivateKeySigner>,
    tx_lock: Arc<Mutex<()>>,
}

impl AlloyGateway {
    pub fn new(config: ContractConfig, signer: Option<PrivateKeySigner>) -> Self {
        Self {
            config,
            signer,
            tx_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    async fn provider(&self) -> Result<DynProvider> {
        let builder = ProviderBuilder::new();
        let provider = match &self.signer {
            Some(signer) => builder
                .wallet(EthereumWallet::from(signer.clone()))
                .connect(&self.config.rpc_url)
                .await?
                .erased(),
            None => builder.connect(&self.config.rpc_url).await?.erased(),
        };
        Ok(provider)
    }
}

#[async_trait]
impl ContractGateway for AlloyGateway {
    async fn ledger(&self, from: Option<Address>) -> Result<Arc<dyn Ledger>> {
        let provider = self.provider().await?;
        let sender = match &self.signer {
            Some(signer) => Some(signer.address()),
            None => from,
        };
        debug!(
            contract = %self.config.contract_address,
            sender = ?sender,
            "Building ledger handle"
        );
        let client = TransactionsClient::new(provider, &self.config, self.tx_lock.clone())
            .with_sender(sender);
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let address = "0xDc64a140Aa3E981100a9becA4E685f962f0cF6C9"
            .parse::<Address>()
            .unwrap();
        let config = ContractConfig::new("http://localhost:8545".to_string(), address);

        assert_eq!(config.contract_address, address);
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.gas_limit, None);
    }

    #[test]
    fn test_anvil_config() {
        let config = ContractConfig::anvil_config().with_gas_limit(Some(300_000));
        assert_eq!(
            config.contract_address,
            DEFAULT_CONTRACT_ADDRESS.parse::<Address>().unwrap()
        );
        assert_eq!(config.gas_limit, Some(300_000));
    }

    #[tokio::test]
    async fn test_client_reports_contract_address() {
        let config = ContractConfig::anvil_config();
        let provider = ProviderBuilder::new()
            .connect(&config.rpc_url)
            .await
            .unwrap()
            .erased();
        let client = TransactionsClient::new(provider, &config, Arc::new(Mutex::new(())));
        assert_eq!(client.address(), config.contract_address);
    }
}

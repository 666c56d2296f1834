use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use crate::config::consts::{
    CONTRACT_ADDRESS_KEY, DEFAULT_CONTRACT_ADDRESS, DEFAULT_RPC_URL, RPC_URL_KEY, STATE_FILE,
};
use crate::config::file::{load_config_from_path, FileConfig};
use crate::context::TransactionContext;
use crate::contract_client::{AlloyGateway, ContractConfig};
use crate::gif::GifClient;
use crate::reader::is_valid_timestamp_format;
use crate::state::LocalStorage;
use crate::wallet::{load_signer, LocalWallet, RpcWallet, WalletProvider};

/// Connection arguments shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Ethereum RPC endpoint for contract reads and writes
    #[arg(long, env = "RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Transactions ledger contract address
    #[arg(long, env = "CONTRACT_ADDRESS", global = true)]
    pub contract_address: Option<String>,

    /// Private key of a local wallet (takes precedence over --wallet-url)
    #[arg(long, env = "PRIVATE_KEY", global = true, hide_env_values = true)]
    pub private_key: Option<String>,

    /// JSON-RPC endpoint of a wallet that manages its own accounts
    #[arg(long, env = "WALLET_URL", global = true)]
    pub wallet_url: Option<String>,

    /// GIPHY API key for keyword GIFs
    #[arg(long, env = "GIPHY_API_KEY", global = true, hide_env_values = true)]
    pub giphy_api_key: Option<String>,

    /// State file holding the cached transaction count and last endpoints
    #[arg(long, env = "KRYPT_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Optional TOML settings file
    #[arg(long, env = "KRYPT_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Which wallet provider, if any, is available.
#[derive(Debug, Clone)]
pub enum WalletSource {
    Local(PrivateKeySigner),
    Rpc(String),
    Missing,
}

/// Client configuration with all values resolved
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    pub wallet: WalletSource,
    pub giphy_api_key: Option<String>,
    pub storage: LocalStorage,
    pub file: FileConfig,
}

impl ClientConfig {
    /// Load configuration with priority: CLI/env -> state file -> defaults
    pub fn load(args: ClientArgs) -> Result<Self> {
        let storage = LocalStorage::new(args.state_file.unwrap_or_else(|| STATE_FILE.into()));

        let rpc_url = args
            .rpc_url
            .or_else(|| storage.get_item(RPC_URL_KEY))
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let contract_address_str = args
            .contract_address
            .or_else(|| storage.get_item(CONTRACT_ADDRESS_KEY))
            .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string());
        let contract_address = contract_address_str
            .parse::<Address>()
            .with_context(|| format!("Invalid contract address {contract_address_str}"))?;

        let file = match &args.config {
            Some(path) => load_config_from_path(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => FileConfig::default(),
        };
        if !is_valid_timestamp_format(&file.display.timestamp_format) {
            bail!(
                "Invalid display.timestamp_format {:?}",
                file.display.timestamp_format
            );
        }

        let wallet = match (args.private_key, args.wallet_url) {
            (Some(pk), _) => WalletSource::Local(load_signer(&pk)?),
            (None, Some(url)) => WalletSource::Rpc(url),
            (None, None) => WalletSource::Missing,
        };

        storage.set_item(RPC_URL_KEY, &rpc_url)?;
        storage.set_item(CONTRACT_ADDRESS_KEY, &contract_address.to_string())?;

        info!(
            rpc_url = %rpc_url,
            contract_address = %contract_address,
            state_file = %storage.path().display(),
            "Loaded client config"
        );

        Ok(Self {
            rpc_url,
            contract_address,
            wallet,
            giphy_api_key: args.giphy_api_key,
            storage,
            file,
        })
    }

    pub fn contract_config(&self) -> ContractConfig {
        ContractConfig::new(self.rpc_url.clone(), self.contract_address)
            .with_gas_limit(self.file.contract.gas_limit)
    }

    pub async fn wallet_provider(&self) -> Result<Option<Arc<dyn WalletProvider>>> {
        let wallet: Option<Arc<dyn WalletProvider>> = match &self.wallet {
            WalletSource::Local(signer) => {
                let wallet = LocalWallet::connect(signer.clone(), &self.rpc_url).await?;
                Some(Arc::new(wallet))
            }
            WalletSource::Rpc(url) => Some(Arc::new(RpcWallet::new(url.clone())?)),
            WalletSource::Missing => None,
        };
        Ok(wallet)
    }

    pub fn gateway(&self) -> AlloyGateway {
        let signer = match &self.wallet {
            WalletSource::Local(signer) => Some(signer.clone()),
            _ => None,
        };
        AlloyGateway::new(self.contract_config(), signer)
    }

    pub async fn context(&self) -> Result<TransactionContext> {
        let wallet = self.wallet_provider().await?;
        Ok(TransactionContext::new(
            wallet,
            Arc::new(self.gateway()),
            self.storage.clone(),
            (&self.file.display).into(),
        ))
    }

    pub fn gif_client(&self) -> Result<GifClient> {
        Ok(GifClient::new(
            self.giphy_api_key.clone(),
            self.file.gif.clone(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::temp_storage;

    #[test]
    fn test_defaults_without_wallet() {
        let storage = temp_storage("config_defaults");
        let args = ClientArgs {
            state_file: Some(storage.path().to_path_buf()),
            ..Default::default()
        };

        let config = ClientConfig::load(args).unwrap();

        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(
            config.contract_address,
            DEFAULT_CONTRACT_ADDRESS.parse::<Address>().unwrap()
        );
        assert!(matches!(config.wallet, WalletSource::Missing));
        assert_eq!(storage.get_item(RPC_URL_KEY), Some(DEFAULT_RPC_URL.to_string()));
        let _ = std::fs::remove_file(storage.path());
    }

    #[test]
    fn test_state_file_used_when_args_absent() {
        let storage = temp_storage("config_state");
        storage.set_item(RPC_URL_KEY, "http://node:8545").unwrap();
        let args = ClientArgs {
            state_file: Some(storage.path().to_path_buf()),
            wallet_url: Some("http://wallet:8545".to_string()),
            ..Default::default()
        };

        let config = ClientConfig::load(args).unwrap();

        assert_eq!(config.rpc_url, "http://node:8545");
        assert!(matches!(config.wallet, WalletSource::Rpc(ref url) if url == "http://wallet:8545"));
        let _ = std::fs::remove_file(storage.path());
    }

    #[test]
    fn test_private_key_takes_precedence() {
        let storage = temp_storage("config_pk");
        let args = ClientArgs {
            state_file: Some(storage.path().to_path_buf()),
            private_key: Some(
                "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d".to_string(),
            ),
            wallet_url: Some("http://wallet:8545".to_string()),
            ..Default::default()
        };

        let config = ClientConfig::load(args).unwrap();

        match &config.wallet {
            WalletSource::Local(signer) => assert_eq!(
                signer.address(),
                "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
                    .parse::<Address>()
                    .unwrap()
            ),
            other => panic!("unexpected wallet source: {other:?}"),
        }
        let _ = std::fs::remove_file(storage.path());
    }

    #[test]
    fn test_invalid_contract_address() {
        let storage = temp_storage("config_bad_addr");
        let args = ClientArgs {
            state_file: Some(storage.path().to_path_buf()),
            contract_address: Some("0xnot-an-address".to_string()),
            ..Default::default()
        };

        assert!(ClientConfig::load(args).is_err());
    }

    #[test]
    fn test_invalid_timestamp_format_rejected() {
        let storage = temp_storage("config_bad_format");
        let config_path = std::env::temp_dir().join(format!(
            "krypt_bad_format_{}.toml",
            std::process::id()
        ));
        std::fs::write(&config_path, "[display]\ntimestamp_format = \"%Q\"\n").unwrap();
        let args = ClientArgs {
            state_file: Some(storage.path().to_path_buf()),
            config: Some(config_path.clone()),
            ..Default::default()
        };

        let err = ClientConfig::load(args).unwrap_err();

        assert!(err.to_string().contains("timestamp_format"));
        let _ = std::fs::remove_file(&config_path);
        let _ = std::fs::remove_file(storage.path());
    }
}

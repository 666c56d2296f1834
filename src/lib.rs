//! Wallet-backed transfer client with an on-chain transaction ledger.
//!
//! The [`context::TransactionContext`] ties together a [`wallet::WalletProvider`],
//! the ledger contract behind [`contract_client::ContractGateway`], and a
//! [`state::LocalStorage`] cache. [`gif`] resolves transfer keywords to GIFs.

pub mod config;
pub mod context;
pub mod contract_client;
pub mod error;
pub mod gif;
pub mod reader;
pub mod render;
pub mod state;
pub mod transfer;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_utils;

pub use context::{ContextSnapshot, Phase, TransactionContext};
pub use error::{Error, Result};
pub use reader::Transaction;
pub use transfer::{FormData, FormField};

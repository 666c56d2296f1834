pub mod client;
pub mod consts;
pub mod file;

// Re-export for convenience
pub use client::{ClientArgs, ClientConfig, WalletSource};
pub use file::{load_config_from_path, FileConfig};

//! Centralized constants used by the CLI, the context and the helpers.

// =============================================================================
// State File
// =============================================================================

/// Default state file, the local-storage analogue between runs.
pub const STATE_FILE: &str = "krypt.env";

/// Key holding the last known transaction count.
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";
pub const RPC_URL_KEY: &str = "RPC_URL";
pub const CONTRACT_ADDRESS_KEY: &str = "CONTRACT_ADDRESS";

// =============================================================================
// Chain Defaults
// =============================================================================

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// First contract deployed by anvil account #0.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Gas limit for a plain value transfer (0x5208).
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

// =============================================================================
// Display
// =============================================================================

/// en-US style `toLocaleString` rendering, e.g. `1/1/1970, 12:00:00 AM`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

// =============================================================================
// GIF Lookup
// =============================================================================

pub const GIPHY_SEARCH_URL: &str = "https://api.giphy.com/v1/gifs/search";

pub const PLACEHOLDER_GIF_URL: &str = "https://metro.co.uk/wp-content/uploads/2015/05/pokemon_crying.gif?quality=90&strip=all&zoom=1&resize=500%2C284";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

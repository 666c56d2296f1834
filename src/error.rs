use thiserror::Error;

/// EIP-1193 error code returned when the user declines a wallet request.
pub const USER_REJECTED_CODE: i64 = 4001;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the wallet, contract and context operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No wallet provider is configured. The message is the alert shown to the user.
    #[error("Please install MetaMask.")]
    ProviderMissing,

    #[error("request rejected by the user: {0}")]
    UserRejected(String),

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("no account connected")]
    NotConnected,

    #[error("a transaction is already being submitted")]
    Busy,

    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("contract error: {0}")]
    Contract(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn is_user_rejected(&self) -> bool {
        matches!(self, Error::UserRejected(_))
    }

    /// Network-level failures talking to the wallet, the chain or a third party.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Builds the error for a JSON-RPC error object, folding the user-rejection code.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == USER_REJECTED_CODE {
            Error::UserRejected(message)
        } else {
            Error::Rpc { code, message }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<alloy::transports::TransportError> for Error {
    fn from(e: alloy::transports::TransportError) -> Self {
        Error::Transport(e.to_string())
    }
}

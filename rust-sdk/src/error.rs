use enhancer_interface::InterfaceError;
use thiserror::Error;

use crate::signing::ProviderError;

/// Prefix the node puts in front of transaction-pool rejections.
pub const TX_POOL_PREFIX: &str = "TransactionPool.Remember:";

/// Shown when an error carries no usable text.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Errors that can occur when using the Wallet Enhancer SDK
#[derive(Error, Debug)]
pub enum EnhancerError {
    /// No asset was selected
    #[error("Please select an asset!")]
    EmptySelection,

    /// More assets were selected than the operation allows
    #[error("You can only select {max} assets at a time!")]
    SelectionTooLarge { max: usize },

    /// Asset ids start at 1
    #[error("Invalid asset id: {0}")]
    InvalidAssetId(u64),

    /// No signer address is connected
    #[error("Please connect your wallet!")]
    NoWallet,

    /// The transfer flow needs a second connected account as receiver
    #[error("You need to connect multiple wallets to use this tool")]
    InsufficientAccounts,

    /// A transaction must be signed by an account the session does not hold
    #[error("Signer {0} is not connected in this session")]
    SignerNotConnected(String),

    /// Content identifier codec other than raw or dag-pb
    #[error("Unknown codec")]
    UnknownCodec,

    /// Malformed template URL
    #[error("Invalid template url: {0}")]
    InvalidTemplate(String),

    /// Amount text that cannot be scaled to base units
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The indexer has no record of the asset
    #[error("Asset {0} not found")]
    AssetNotFound(u64),

    /// No signing provider session
    #[error("Wallet is not connected")]
    NotConnected,

    /// The provider session expired and could not be re-established
    #[error("Wallet session expired")]
    SessionExpired,

    /// The user declined in the external provider
    #[error("{0}")]
    SigningRejected(String),

    /// The provider returned nothing usable
    #[error("Transaction signing failed")]
    SigningFailed,

    /// The node refused the transaction; holds the node's raw text
    #[error("{0}")]
    NodeRejected(String),

    /// No confirmation within the polling bound
    #[error("Transaction not confirmed after {rounds} rounds")]
    ConfirmationTimeout { rounds: u64 },

    /// Non-success HTTP status from the node or indexer
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Wire encoding failure
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Asset metadata that cannot be decoded
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
}

impl From<InterfaceError> for EnhancerError {
    fn from(error: InterfaceError) -> Self {
        match error {
            InterfaceError::InvalidAddress(address) => EnhancerError::InvalidAddress(address),
            other => EnhancerError::Encoding(other.to_string()),
        }
    }
}

impl From<ProviderError> for EnhancerError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::SessionExpired => EnhancerError::SessionExpired,
            ProviderError::Rejected(reason) => EnhancerError::SigningRejected(reason),
            ProviderError::Failed(_) => EnhancerError::SigningFailed,
        }
    }
}

impl EnhancerError {
    /// True for failures detected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EnhancerError::EmptySelection
                | EnhancerError::SelectionTooLarge { .. }
                | EnhancerError::NoWallet
                | EnhancerError::InsufficientAccounts
                | EnhancerError::InvalidAmount(_)
                | EnhancerError::InvalidAssetId(_)
        )
    }

    /// Short message suitable for showing next to a failed item.
    pub fn user_message(&self) -> String {
        user_facing_reason(&self.to_string())
    }
}

/// Reduces an error message to what a user should see.
///
/// Transaction-pool rejections keep only the text after the pool prefix,
/// other messages are shown as they are, and an empty message falls back to
/// a generic one.
pub fn user_facing_reason(message: &str) -> String {
    if let Some((_, rest)) = message.split_once(TX_POOL_PREFIX) {
        let rest = rest.trim();
        if !rest.is_empty() {
            return rest.to_string();
        }
    }
    let message = message.trim();
    if message.is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message.to_string()
    }
}

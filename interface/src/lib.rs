//! Wire-level building blocks for Wallet Enhancer asset transactions.
//!
//! Everything in this crate is deterministic and network-free: addresses,
//! transaction construction, canonical encoding, transaction ids and group
//! ids. The SDK layers network access and signing on top of it.

pub mod address;
pub mod group;
pub mod params;
pub mod transaction;

pub use address::Address;
pub use group::{assign_group_id, compute_group_id, GroupId};
pub use params::{SuggestedParams, TransactionParamsResponse, VALIDITY_WINDOW};
pub use transaction::{AssetTransfer, Transaction, TransactionType};

use thiserror::Error;

/// Asset identifiers are positive integers, unique per network.
pub type AssetId = u64;

/// Note attached to every transaction built by the tool.
pub const TX_NOTE: &str = "via Wallet Enhancer";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid genesis hash: {0}")]
    InvalidGenesisHash(String),
}

impl From<rmp_serde::encode::Error> for InterfaceError {
    fn from(error: rmp_serde::encode::Error) -> Self {
        InterfaceError::Encoding(error.to_string())
    }
}

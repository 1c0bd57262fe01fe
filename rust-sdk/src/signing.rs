//! # Signing gateway
//!
//! The SDK never holds keys. Signatures come from an external wallet
//! provider reached through [`WalletProvider`]; the concrete provider is
//! chosen once at connect time and only the trait object is kept afterwards.
//!
//! [`SigningGateway`] owns that provider together with the persisted
//! [`ConnectionState`] and turns [`TransactionGroup`]s into signed payloads.

use async_trait::async_trait;
use enhancer_interface::{Address, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{error::EnhancerError, transaction_factory::TransactionGroup};

/// Signed bytes of one transaction, ready for submission.
pub type SignedPayload = Vec<u8>;

/// Wallet applications that can act as signing providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Pera,
    Defly,
    Daffi,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Pera => "pera",
            ProviderKind::Defly => "defly",
            ProviderKind::Daffi => "daffi",
        };
        f.write_str(name)
    }
}

/// Failures reported by a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Session expired")]
    SessionExpired,

    /// The user declined; the text is shown unchanged.
    #[error("{0}")]
    Rejected(String),

    #[error("Provider failure: {0}")]
    Failed(String),
}

/// One transaction and the accounts expected to sign it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub transaction: Transaction,
    pub signers: Vec<Address>,
}

/// Capability set of an external wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Opens a session and returns the accounts it exposes.
    async fn connect(&self) -> Result<Vec<Address>, ProviderError>;

    async fn reconnect_session(&self) -> Result<(), ProviderError>;

    /// Signs every request of every group, returning one payload per
    /// transaction in request order.
    async fn sign_transaction(
        &self,
        groups: &[Vec<SignRequest>],
    ) -> Result<Vec<SignedPayload>, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;
}

/// Connection state persisted under the `wallet` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    #[serde(default)]
    pub accounts: Vec<Address>,
    #[serde(rename = "walletAddress", default)]
    pub wallet_address: Option<Address>,
    #[serde(rename = "walletType", default)]
    pub wallet_type: Option<ProviderKind>,
}

impl ConnectionState {
    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains(address)
    }
}

/// Holds the single active provider and signs transaction groups with it.
#[derive(Default)]
pub struct SigningGateway {
    provider: Option<Box<dyn WalletProvider>>,
    state: ConnectionState,
}

impl SigningGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects `provider`, replacing any previous one.
    ///
    /// The first exposed account becomes the active address.
    pub async fn connect(
        &mut self,
        provider: Box<dyn WalletProvider>,
    ) -> Result<&ConnectionState, EnhancerError> {
        let accounts = provider.connect().await?;
        if accounts.is_empty() {
            return Err(EnhancerError::NotConnected);
        }
        debug!(kind = %provider.kind(), accounts = accounts.len(), "provider connected");

        self.state = ConnectionState {
            wallet_address: accounts.first().copied(),
            wallet_type: Some(provider.kind()),
            accounts,
        };
        self.provider = Some(provider);
        Ok(&self.state)
    }

    /// Ends the session. Local state is cleared even if the provider fails
    /// to disconnect.
    pub async fn disconnect(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.disconnect().await {
                warn!(kind = %provider.kind(), error = %e, "provider disconnect failed");
            }
        }
        self.state = ConnectionState::default();
    }

    /// Switches the active address to another connected account.
    pub fn select_account(&mut self, address: Address) -> Result<(), EnhancerError> {
        if !self.state.contains(&address) {
            return Err(EnhancerError::SignerNotConnected(address.to_string()));
        }
        self.state.wallet_address = Some(address);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_some() && self.state.wallet_address.is_some()
    }

    pub fn accounts(&self) -> &[Address] {
        &self.state.accounts
    }

    pub fn active_address(&self) -> Option<Address> {
        self.state.wallet_address
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Signs `groups` on behalf of `signer`.
    ///
    /// A transaction whose sender is another account is signed by that
    /// account instead, which must belong to the same session. The session
    /// is re-established first; an expiry during signing gets one reconnect
    /// and one retry. The result holds one payload list per group.
    pub async fn sign(
        &self,
        groups: &[TransactionGroup],
        signer: &Address,
    ) -> Result<Vec<Vec<SignedPayload>>, EnhancerError> {
        let provider = self.provider.as_deref().ok_or(EnhancerError::NotConnected)?;
        if self.state.wallet_address.is_none() {
            return Err(EnhancerError::NotConnected);
        }

        let requests = self.sign_requests(groups, signer)?;
        let expected: usize = requests.iter().map(Vec::len).sum();

        provider.reconnect_session().await?;
        let payloads = match provider.sign_transaction(&requests).await {
            Err(ProviderError::SessionExpired) => {
                warn!(kind = %provider.kind(), "session expired while signing, reconnecting");
                provider.reconnect_session().await?;
                provider.sign_transaction(&requests).await?
            },
            other => other?,
        };

        if payloads.len() != expected || payloads.iter().any(Vec::is_empty) {
            warn!(
                expected,
                received = payloads.len(),
                "provider returned unusable signatures"
            );
            return Err(EnhancerError::SigningFailed);
        }

        let mut payloads = payloads.into_iter();
        Ok(groups
            .iter()
            .map(|group| payloads.by_ref().take(group.len()).collect())
            .collect())
    }

    fn sign_requests(
        &self,
        groups: &[TransactionGroup],
        signer: &Address,
    ) -> Result<Vec<Vec<SignRequest>>, EnhancerError> {
        if !self.state.contains(signer) {
            return Err(EnhancerError::SignerNotConnected(signer.to_string()));
        }

        groups
            .iter()
            .map(|group| {
                group
                    .transactions()
                    .iter()
                    .map(|txn| {
                        let party = txn.sender;
                        if !self.state.contains(&party) {
                            return Err(EnhancerError::SignerNotConnected(party.to_string()));
                        }
                        Ok(SignRequest {
                            transaction: txn.clone(),
                            signers: vec![party],
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

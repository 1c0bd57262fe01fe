use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;
use enhancer_sdk::{
    interface::{Address, AssetId, SuggestedParams},
    AssetRecord, EnhancerError, LedgerClient, NodeStatus, PendingTransaction, ProviderError,
    ProviderKind, SignRequest, SignedPayload, SigningGateway, WalletProvider,
};

pub fn account(seed: u8) -> Address {
    Address::new([seed; 32])
}

pub fn asset(id: AssetId, creator: &str, decimals: u32) -> AssetRecord {
    AssetRecord {
        id,
        creator: creator.to_string(),
        manager: creator.to_string(),
        decimals,
        total_supply: 100,
        name: format!("Asset {}", id),
        unit_name: String::new(),
        url: String::new(),
        reserve: String::new(),
        deleted: false,
    }
}

/// Ledger that confirms every submission and records what was sent.
#[derive(Default)]
pub struct MockLedger {
    pub assets: HashMap<AssetId, AssetRecord>,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl MockLedger {
    pub fn new(records: Vec<AssetRecord>) -> Self {
        Self {
            assets: records.into_iter().map(|r| (r.id, r)).collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn suggested_params(&self) -> Result<SuggestedParams, EnhancerError> {
        Ok(SuggestedParams {
            fee_per_byte: 0,
            min_fee: 1_000,
            first_valid: 500,
            last_valid: 1_500,
            genesis_id: "mainnet-v1.0".to_string(),
            genesis_hash: [4u8; 32],
        })
    }

    async fn asset(&self, asset_id: AssetId) -> Result<AssetRecord, EnhancerError> {
        self.assets
            .get(&asset_id)
            .cloned()
            .ok_or(EnhancerError::AssetNotFound(asset_id))
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, EnhancerError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(signed.to_vec());
        Ok(format!("TX{}", sent.len()))
    }

    async fn status(&self) -> Result<NodeStatus, EnhancerError> {
        Ok(NodeStatus { last_round: 500 })
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, EnhancerError> {
        Ok(NodeStatus {
            last_round: round + 1,
        })
    }

    async fn pending_transaction(&self, _tx_id: &str) -> Result<PendingTransaction, EnhancerError> {
        Ok(PendingTransaction {
            confirmed_round: Some(501),
            pool_error: String::new(),
        })
    }
}

/// Provider whose signature for a transaction is its raw id.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub accounts: Vec<Address>,
    pub declined: Arc<Mutex<HashSet<AssetId>>>,
    pub requests: Arc<Mutex<Vec<Vec<Vec<SignRequest>>>>>,
}

impl MockProvider {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            ..Default::default()
        }
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Defly
    }

    async fn connect(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.accounts.clone())
    }

    async fn reconnect_session(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn sign_transaction(
        &self,
        groups: &[Vec<SignRequest>],
    ) -> Result<Vec<SignedPayload>, ProviderError> {
        self.requests.lock().unwrap().push(groups.to_vec());
        groups
            .iter()
            .flatten()
            .map(|request| {
                if self
                    .declined
                    .lock()
                    .unwrap()
                    .contains(&request.transaction.asset_id())
                {
                    return Err(ProviderError::Rejected("declined".to_string()));
                }
                request
                    .transaction
                    .raw_id()
                    .map(|id| id.to_vec())
                    .map_err(|e| ProviderError::Failed(e.to_string()))
            })
            .collect()
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub async fn connect(provider: &MockProvider) -> Result<SigningGateway> {
    let mut gateway = SigningGateway::new();
    gateway.connect(Box::new(provider.clone())).await?;
    Ok(gateway)
}

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use enhancer_interface::{Address, AssetId, SuggestedParams};

use crate::{
    error::EnhancerError,
    rpc::{LedgerClient, NodeStatus, PendingTransaction},
    signing::{ProviderError, ProviderKind, SignRequest, SignedPayload, WalletProvider},
    types::AssetRecord,
};

pub const LAST_ROUND: u64 = 1_000;

pub fn account(seed: u8) -> Address {
    Address::new([seed; 32])
}

pub fn params() -> SuggestedParams {
    SuggestedParams {
        fee_per_byte: 0,
        min_fee: 1_000,
        first_valid: LAST_ROUND,
        last_valid: LAST_ROUND + 1_000,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: [9u8; 32],
    }
}

pub fn record(id: AssetId, creator: &str, decimals: u32) -> AssetRecord {
    AssetRecord {
        id,
        creator: creator.to_string(),
        manager: creator.to_string(),
        decimals,
        total_supply: 1_000_000,
        name: format!("Asset {}", id),
        unit_name: "AST".to_string(),
        url: String::new(),
        reserve: String::new(),
        deleted: false,
    }
}

/// Asset id a mock payload was signed for.
pub fn payload_asset(payload: &[u8]) -> AssetId {
    let mut id = [0u8; 8];
    id.copy_from_slice(&payload[..8]);
    AssetId::from_be_bytes(id)
}

/// In-memory ledger.
///
/// Submissions whose first payload belongs to a rejected asset fail with
/// the pool prefix; everything else confirms on the first poll.
#[derive(Default)]
pub struct MockLedger {
    pub assets: Mutex<HashMap<AssetId, AssetRecord>>,
    pub unreachable_assets: Mutex<HashSet<AssetId>>,
    pub rejected_assets: Mutex<HashSet<AssetId>>,
    pub pool_error: Mutex<Option<String>>,
    pub never_confirm: Mutex<bool>,
    pub params_unavailable: Mutex<bool>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub asset_fetches: AtomicUsize,
    pub block_waits: AtomicUsize,
}

impl MockLedger {
    pub fn with_assets(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        let ledger = Self::default();
        ledger
            .assets
            .lock()
            .unwrap()
            .extend(records.into_iter().map(|r| (r.id, r)));
        ledger
    }

    pub fn reject(&self, asset_id: AssetId) {
        self.rejected_assets.lock().unwrap().insert(asset_id);
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn suggested_params(&self) -> Result<SuggestedParams, EnhancerError> {
        if *self.params_unavailable.lock().unwrap() {
            return Err(EnhancerError::Api {
                status: 503,
                message: "node unavailable".to_string(),
            });
        }
        Ok(params())
    }

    async fn asset(&self, asset_id: AssetId) -> Result<AssetRecord, EnhancerError> {
        self.asset_fetches.fetch_add(1, Ordering::SeqCst);
        if self.unreachable_assets.lock().unwrap().contains(&asset_id) {
            return Err(EnhancerError::Api {
                status: 500,
                message: "indexer error".to_string(),
            });
        }
        self.assets
            .lock()
            .unwrap()
            .get(&asset_id)
            .cloned()
            .ok_or(EnhancerError::AssetNotFound(asset_id))
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, EnhancerError> {
        let asset_id = payload_asset(signed);
        if self.rejected_assets.lock().unwrap().contains(&asset_id) {
            return Err(EnhancerError::NodeRejected(format!(
                "TransactionPool.Remember: asset {} missing from account",
                asset_id
            )));
        }
        self.sent.lock().unwrap().push(signed.to_vec());
        Ok(format!("TX{}", asset_id))
    }

    async fn status(&self) -> Result<NodeStatus, EnhancerError> {
        Ok(NodeStatus {
            last_round: LAST_ROUND,
        })
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, EnhancerError> {
        self.block_waits.fetch_add(1, Ordering::SeqCst);
        Ok(NodeStatus {
            last_round: round + 1,
        })
    }

    async fn pending_transaction(&self, _tx_id: &str) -> Result<PendingTransaction, EnhancerError> {
        if let Some(pool_error) = self.pool_error.lock().unwrap().clone() {
            return Ok(PendingTransaction {
                confirmed_round: None,
                pool_error,
            });
        }
        if *self.never_confirm.lock().unwrap() {
            return Ok(PendingTransaction::default());
        }
        Ok(PendingTransaction {
            confirmed_round: Some(LAST_ROUND + 1),
            pool_error: String::new(),
        })
    }
}

#[derive(Default)]
pub struct ProviderState {
    pub accounts: Vec<Address>,
    pub declined_assets: Mutex<HashSet<AssetId>>,
    pub expirations: AtomicUsize,
    pub malformed: Mutex<bool>,
    pub reconnects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub requests: Mutex<Vec<Vec<Vec<SignRequest>>>>,
}

/// Provider that "signs" by prefixing the asset id to the transaction id.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub state: Arc<ProviderState>,
}

impl MockProvider {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            state: Arc::new(ProviderState {
                accounts,
                ..Default::default()
            }),
        }
    }

    pub fn decline(&self, asset_id: AssetId) {
        self.state.declined_assets.lock().unwrap().insert(asset_id);
    }

    pub fn expire(&self, times: usize) {
        self.state.expirations.store(times, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Vec<Vec<SignRequest>>> {
        self.state.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pera
    }

    async fn connect(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.state.accounts.clone())
    }

    async fn reconnect_session(&self) -> Result<(), ProviderError> {
        self.state.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(
        &self,
        groups: &[Vec<SignRequest>],
    ) -> Result<Vec<SignedPayload>, ProviderError> {
        self.state.requests.lock().unwrap().push(groups.to_vec());

        let expirations = self.state.expirations.load(Ordering::SeqCst);
        if expirations > 0 {
            self.state.expirations.store(expirations - 1, Ordering::SeqCst);
            return Err(ProviderError::SessionExpired);
        }
        if *self.state.malformed.lock().unwrap() {
            return Ok(Vec::new());
        }

        let mut payloads = Vec::new();
        for request in groups.iter().flatten() {
            let asset_id = request.transaction.asset_id();
            if self.state.declined_assets.lock().unwrap().contains(&asset_id) {
                return Err(ProviderError::Rejected(
                    "Transaction request rejected by user".to_string(),
                ));
            }
            let raw_id = request
                .transaction
                .raw_id()
                .map_err(|e| ProviderError::Failed(e.to_string()))?;
            let mut payload = asset_id.to_be_bytes().to_vec();
            payload.extend_from_slice(&raw_id);
            payloads.push(payload);
        }
        Ok(payloads)
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

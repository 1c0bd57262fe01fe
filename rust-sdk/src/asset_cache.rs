use std::collections::HashMap;

use enhancer_interface::AssetId;
use tracing::debug;

use crate::{error::EnhancerError, rpc::LedgerClient, types::AssetRecord};

/// Asset parameters fetched during the session, keyed by asset id.
///
/// Entries are only ever added or replaced whole; nothing is evicted until
/// the session is reset.
#[derive(Debug, Default, Clone)]
pub struct AssetCache {
    records: HashMap<AssetId, AssetRecord>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset_id: AssetId) -> Option<&AssetRecord> {
        self.records.get(&asset_id)
    }

    pub fn contains(&self, asset_id: AssetId) -> bool {
        self.records.contains_key(&asset_id)
    }

    /// Stores `record`, replacing any earlier copy of the same asset.
    pub fn insert(&mut self, record: AssetRecord) {
        self.records.insert(record.id, record);
    }

    /// Returns the cached record, fetching and caching it on a miss.
    pub async fn resolve(
        &mut self,
        ledger: &dyn LedgerClient,
        asset_id: AssetId,
    ) -> Result<&AssetRecord, EnhancerError> {
        if !self.records.contains_key(&asset_id) {
            debug!(asset_id, "asset cache miss");
            let record = ledger.asset(asset_id).await?;
            self.insert(record);
        }
        self.records
            .get(&asset_id)
            .ok_or(EnhancerError::AssetNotFound(asset_id))
    }

    /// Re-fetches a record regardless of what is cached.
    pub async fn refresh(
        &mut self,
        ledger: &dyn LedgerClient,
        asset_id: AssetId,
    ) -> Result<&AssetRecord, EnhancerError> {
        let record = ledger.asset(asset_id).await?;
        self.insert(record);
        self.records
            .get(&asset_id)
            .ok_or(EnhancerError::AssetNotFound(asset_id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

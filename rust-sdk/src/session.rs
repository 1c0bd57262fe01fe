use enhancer_interface::AssetId;

use crate::{asset_cache::AssetCache, selection::SelectionSet};

/// State shared by the batch operations of one connected session.
///
/// Owned by the caller and lent to [`BatchExecutor`](crate::BatchExecutor)
/// for the length of a run.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    pub selection: SelectionSet,
    pub cache: AssetCache,
    /// Asset ids currently listed to the user.
    pub displayed: Vec<AssetId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything tied to the current account. Called on account
    /// switch and disconnect.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.cache.clear();
        self.displayed.clear();
    }

    pub(crate) fn evict_displayed(&mut self, asset_id: AssetId) {
        self.displayed.retain(|id| *id != asset_id);
    }
}

use enhancer_interface::AssetId;

use crate::types::MAX_SELECT_COUNT;

/// Ordered set of asset ids marked for a batch operation.
///
/// Insertion order is kept for display. The set never holds more than
/// [`MAX_SELECT_COUNT`] ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<AssetId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `asset_id`, or removes it if it is already selected.
    ///
    /// Adding to a full set, or adding id 0, does nothing. Returns whether
    /// the id is selected afterwards.
    pub fn toggle(&mut self, asset_id: AssetId) -> bool {
        if self.remove(asset_id) {
            return false;
        }
        if asset_id == 0 || self.ids.len() >= MAX_SELECT_COUNT {
            return false;
        }
        self.ids.push(asset_id);
        true
    }

    /// Removes `asset_id`; returns whether it was present.
    pub fn remove(&mut self, asset_id: AssetId) -> bool {
        match self.ids.iter().position(|id| *id == asset_id) {
            Some(index) => {
                self.ids.remove(index);
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, asset_id: AssetId) -> bool {
        self.ids.contains(&asset_id)
    }

    pub fn ids(&self) -> &[AssetId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Clipboard text: comma-joined ids in selection order.
    pub fn copy_text(&self) -> String {
        self.ids
            .iter()
            .map(AssetId::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

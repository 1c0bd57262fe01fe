use super::*;
use crate::{asset_cache::AssetCache, session::SessionState};
use super::common::*;

#[test]
fn toggle_adds_then_removes() {
    let mut selection = SelectionSet::new();
    assert!(selection.toggle(7));
    assert!(selection.contains(7));
    assert!(!selection.toggle(7));
    assert!(selection.is_empty());
}

#[test]
fn asset_id_zero_is_never_selected() {
    let mut selection = SelectionSet::new();
    assert!(!selection.toggle(0));
    assert!(selection.is_empty());
}

#[test]
fn insertion_order_is_kept() {
    let mut selection = SelectionSet::new();
    for id in [30, 10, 20] {
        selection.toggle(id);
    }
    assert_eq!(selection.ids(), &[30, 10, 20]);
}

#[test]
fn adding_beyond_the_limit_is_a_no_op() {
    let mut selection = SelectionSet::new();
    for id in 1..=MAX_SELECT_COUNT as u64 {
        assert!(selection.toggle(id));
    }
    assert!(!selection.toggle(65));
    assert_eq!(selection.len(), MAX_SELECT_COUNT);
    assert!(!selection.contains(65));

    // Toggling out still works on a full set.
    assert!(!selection.toggle(1));
    assert_eq!(selection.len(), MAX_SELECT_COUNT - 1);
}

#[test]
fn removing_an_absent_id_is_a_no_op() {
    let mut selection = SelectionSet::new();
    selection.toggle(1);
    assert!(!selection.remove(2));
    assert_eq!(selection.ids(), &[1]);
}

#[test]
fn copy_text_joins_ids_in_order() {
    let mut selection = SelectionSet::new();
    assert_eq!(selection.copy_text(), "");

    selection.toggle(31566704);
    assert_eq!(selection.copy_text(), "31566704");

    selection.toggle(12);
    selection.toggle(9000);
    assert_eq!(selection.copy_text(), "31566704,12,9000");
}

#[test_log::test(tokio::test)]
async fn cache_fetches_each_asset_once() {
    let ledger = MockLedger::with_assets([record(5, &account(1).to_string(), 0)]);
    let mut cache = AssetCache::new();

    cache.resolve(&ledger, 5).await.unwrap();
    cache.resolve(&ledger, 5).await.unwrap();
    assert_eq!(ledger.asset_fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    assert!(matches!(
        cache.resolve(&ledger, 6).await,
        Err(EnhancerError::AssetNotFound(6))
    ));
    assert!(!cache.contains(6));
}

#[test_log::test(tokio::test)]
async fn cache_refresh_replaces_the_whole_record() {
    let ledger = MockLedger::with_assets([record(5, "", 0)]);
    let mut cache = AssetCache::new();
    cache.insert(record(5, &account(1).to_string(), 6));

    let refreshed = cache.refresh(&ledger, 5).await.unwrap();
    assert_eq!(refreshed.creator, "");
    assert_eq!(refreshed.decimals, 0);
}

#[test]
fn session_reset_clears_everything() {
    let mut session = SessionState::new();
    session.selection.toggle(1);
    session.cache.insert(record(1, "", 0));
    session.displayed = vec![1, 2];

    session.reset();
    assert!(session.selection.is_empty());
    assert!(session.cache.is_empty());
    assert!(session.displayed.is_empty());
}

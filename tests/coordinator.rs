//! End-to-end rating flows through the coordinator and the in-memory store.

use std::sync::Arc;

use prestige_ranking::{
    AlbumId, CategoryId, ComparisonOutcome, CoordinatorError, InMemoryError, InMemoryRankingStore,
    ItemId, ItemKind, PartitionError, PartitionKey, RankedItem, RankingConfig, RateRequest,
    RatingCoordinator, SessionError, SessionStep,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn make_track(id: &str, category: &str, position: usize, score: f64) -> RankedItem {
    RankedItem::new(ItemId::new(id), ItemKind::Track, CategoryId::new(category), position, score)
}

/// loved: a(10), b(8), c(6); okay: x(4)
fn seeded_store() -> Arc<InMemoryRankingStore> {
    let store = InMemoryRankingStore::with_items(vec![
        make_track("a", "loved", 0, 10.0),
        make_track("b", "loved", 1, 8.0),
        make_track("c", "loved", 2, 6.0),
        make_track("x", "okay", 0, 4.0),
    ])
    .unwrap();
    Arc::new(store)
}

fn coordinator(store: Arc<InMemoryRankingStore>) -> RatingCoordinator<InMemoryRankingStore> {
    RatingCoordinator::new(store, RankingConfig::default()).unwrap()
}

fn rate_track(id: &str, category: &str) -> RateRequest {
    RateRequest::new(ItemId::new(id), ItemKind::Track, CategoryId::new(category))
}

fn loved_ids(store: &InMemoryRankingStore) -> Vec<String> {
    store
        .partition(&PartitionKey::new(CategoryId::new("loved"), ItemKind::Track))
        .map(|p| p.items().iter().map(|i| i.item_id.to_string()).collect())
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Flows
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rate_commit_persists_position_score_and_history() {
    let store = seeded_store();
    let c = coordinator(Arc::clone(&store));

    let mut rating = c.begin(rate_track("d", "loved")).await.unwrap();
    rating.answer_winner(&ItemId::new("d")).unwrap();
    let step = rating.answer_winner(&ItemId::new("a")).unwrap();
    assert_eq!(step, SessionStep::Complete { final_position: 1 });

    let write = c.commit(&rating).await.unwrap();
    assert_eq!(write.position, 1);
    assert_eq!(write.personal_score, Some(9.0));

    assert_eq!(loved_ids(&store), vec!["a", "d", "b", "c"]);
    let stored = store
        .partition(&PartitionKey::new(CategoryId::new("loved"), ItemKind::Track))
        .unwrap();
    let scores: Vec<f64> = stored.items().iter().map(|i| i.personal_score).collect();
    assert_eq!(scores, vec![10.0, 9.0, 8.0, 6.0]);

    let history = c.comparisons_for(&ItemId::new("d")).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].candidate_item_id, ItemId::new("b"));
    assert_eq!(history[1].outcome, ComparisonOutcome::ExistingItemWins);
}

#[tokio::test]
async fn test_invalid_winner_is_rejected_without_progress() {
    let c = coordinator(seeded_store());
    let mut rating = c.begin(rate_track("d", "loved")).await.unwrap();

    let err = rating.answer_winner(&ItemId::new("c")).unwrap_err();
    assert!(matches!(err, SessionError::InvalidWinner { .. }));
    assert!(rating.session().history().is_empty());
}

#[tokio::test]
async fn test_stale_commit_is_rejected() {
    let store = seeded_store();
    let first = coordinator(Arc::clone(&store));
    let second = coordinator(Arc::clone(&store));

    let mut slow = first.begin(rate_track("d", "loved")).await.unwrap();

    let mut fast = second.begin(rate_track("e", "loved")).await.unwrap();
    fast.answer(ComparisonOutcome::ExistingItemWins).unwrap();
    fast.answer(ComparisonOutcome::ExistingItemWins).unwrap();
    second.commit(&fast).await.unwrap();

    slow.answer(ComparisonOutcome::NewItemWins).unwrap();
    slow.answer(ComparisonOutcome::NewItemWins).unwrap();
    let err = first.commit(&slow).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Store(_)));
    assert_eq!(first.active_session(), None);
    assert_eq!(loved_ids(&store), vec!["a", "b", "c", "e"]);
}

#[tokio::test]
async fn test_recategorize_moves_item() {
    let store = seeded_store();
    let c = coordinator(Arc::clone(&store));

    let mut rating = c
        .recategorize(ItemId::new("x"), ItemKind::Track, CategoryId::new("loved"))
        .await
        .unwrap();
    assert_eq!(rating.previous_category(), Some(&CategoryId::new("okay")));
    rating.answer(ComparisonOutcome::ExistingItemWins).unwrap();
    rating.answer(ComparisonOutcome::NewItemWins).unwrap();

    let write = c.commit(&rating).await.unwrap();
    assert_eq!(write.position, 2);
    assert_eq!(write.personal_score, Some(7.0));
    assert_eq!(loved_ids(&store), vec!["a", "b", "x", "c"]);
    assert!(store
        .partition(&PartitionKey::new(CategoryId::new("okay"), ItemKind::Track))
        .is_none());
}

#[tokio::test]
async fn test_recategorize_unranked_item() {
    let c = coordinator(seeded_store());
    let err = c
        .recategorize(ItemId::new("zzz"), ItemKind::Track, CategoryId::new("loved"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::NotRanked(_)));
}

#[tokio::test]
async fn test_album_ranking_has_no_score() {
    let album = AlbumId::new("al");
    let store = Arc::new(
        InMemoryRankingStore::with_items(vec![
            make_track("t1", "loved", 0, 10.0).with_album(album.clone()).with_rank_within_album(0),
            make_track("t2", "loved", 1, 8.0).with_album(album.clone()),
        ])
        .unwrap(),
    );
    let c = coordinator(Arc::clone(&store));

    let mut rating = c.begin_album(ItemId::new("t2"), album.clone()).await.unwrap();
    let step = rating.answer(ComparisonOutcome::NewItemWins).unwrap();
    assert_eq!(step, SessionStep::Complete { final_position: 0 });

    let write = c.commit(&rating).await.unwrap();
    assert_eq!(write.personal_score, None);

    let t1 = c.store().partition(&PartitionKey::new(CategoryId::new("loved"), ItemKind::Track)).unwrap();
    assert_eq!(t1.get(&ItemId::new("t2")).unwrap().rank_within_album, Some(0));
    assert_eq!(t1.get(&ItemId::new("t1")).unwrap().rank_within_album, Some(1));
    assert_eq!(t1.get(&ItemId::new("t2")).unwrap().personal_score, 8.0);
}

#[tokio::test]
async fn test_begin_album_rejects_foreign_track() {
    let c = coordinator(seeded_store());
    let err = c
        .begin_album(ItemId::new("a"), AlbumId::new("al"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::NotAlbumTrack { .. }));
}

#[tokio::test]
async fn test_remove_then_rate_again() {
    let store = seeded_store();
    let c = coordinator(Arc::clone(&store));

    let removed = c.remove(&ItemId::new("b"), ItemKind::Track).await.unwrap();
    assert_eq!(removed.personal_score, 8.0);
    assert_eq!(loved_ids(&store), vec!["a", "c"]);

    let mut rating = c.begin(rate_track("b", "loved")).await.unwrap();
    rating.answer(ComparisonOutcome::NewItemWins).unwrap();
    let write = c.commit(&rating).await.unwrap();
    assert_eq!(write.position, 0);
    assert_eq!(write.personal_score, Some(11.0));
}

#[test]
fn test_store_rejects_scores_contradicting_positions() {
    let err = InMemoryRankingStore::with_items(vec![
        make_track("a", "loved", 0, 5.0),
        make_track("b", "loved", 1, 8.0),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        InMemoryError::Partition(PartitionError::ScoresOutOfOrder { position: 1, .. })
    ));
}

#[tokio::test]
async fn test_committed_items_reload_into_same_partition() {
    let store = seeded_store();
    let c = coordinator(Arc::clone(&store));

    let mut rating = c.begin(rate_track("d", "loved")).await.unwrap();
    rating.answer(ComparisonOutcome::NewItemWins).unwrap();
    rating.answer(ComparisonOutcome::ExistingItemWins).unwrap();
    c.commit(&rating).await.unwrap();

    let items = store.all_items();
    assert_eq!(items.len(), 5);
    let reloaded = InMemoryRankingStore::with_items(items).unwrap();
    assert_eq!(loved_ids(&reloaded), vec!["a", "d", "b", "c"]);

    let key = PartitionKey::new(CategoryId::new("loved"), ItemKind::Track);
    assert_eq!(reloaded.partition(&key), store.partition(&key));
}

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{like, swipe, user, Harness};
use kindred::cache::{CacheCoherence, TtlCache};
use kindred::db::{MemoryMatchStore, MemorySwipeStore};
use kindred::models::{CanonicalPair, Pagination, Swipe, SwipeDirection};
use kindred::services::ledger::SwipeLedger;
use kindred::services::match_detector::MatchDetector;
use kindred::utils::config::CacheTtls;
use kindred::utils::{Clock, ManualClock, RequestContext};
use kindred::DiscoveryError;

#[tokio::test]
async fn test_mutual_like_creates_one_ordered_match() {
    let h = Harness::new();
    h.add_users([1, 2]).await;
    let ctx = RequestContext::new();

    let first = h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    assert!(!first.is_match);
    assert!(first.match_record.is_none());

    let second = h.service.swipe(&ctx, &like(2, 1)).await.unwrap();
    assert!(second.is_match);
    let record = second.match_record.unwrap();
    assert_eq!(record.user_id_1, user(1));
    assert_eq!(record.user_id_2, user(2));
    assert!(record.is_active);

    let again = h.service.swipe(&ctx, &like(2, 1)).await;
    assert!(matches!(again, Err(DiscoveryError::DuplicateSwipe)));
    assert_eq!(h.swipes.len().await, 2);
    assert_eq!(h.matches.all().await.len(), 1);
}

#[tokio::test]
async fn test_pass_then_like_is_not_a_match() {
    let h = Harness::new();
    h.add_users([1, 2]).await;
    let ctx = RequestContext::new();

    h.service.swipe(&ctx, &swipe(1, 2, SwipeDirection::Pass)).await.unwrap();
    let ack = h.service.swipe(&ctx, &like(2, 1)).await.unwrap();
    assert!(!ack.is_match);
    assert!(h.matches.all().await.is_empty());
}

#[tokio::test]
async fn test_super_like_back_creates_match() {
    let h = Harness::new();
    h.add_users([1, 2]).await;
    let ctx = RequestContext::new();

    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    let ack = h.service.super_like(&ctx, user(2), user(1)).await.unwrap();
    assert!(ack.is_match);
    assert_eq!(ack.direction, SwipeDirection::SuperLike);
    assert_eq!(ack.remaining, 4);
}

#[tokio::test]
async fn test_self_swipe_rejected_without_ledger_row() {
    let h = Harness::new();
    h.add_users([1]).await;

    let result = h.service.swipe(&RequestContext::new(), &like(1, 1)).await;
    assert!(matches!(result, Err(DiscoveryError::SelfSwipe)));
    assert!(h.swipes.is_empty().await);
}

#[tokio::test]
async fn test_swipe_on_unknown_user_is_not_found() {
    let h = Harness::new();
    h.add_users([1]).await;

    let result = h.service.swipe(&RequestContext::new(), &like(1, 99)).await;
    assert!(matches!(result, Err(DiscoveryError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_check_and_create_yields_one_winner() {
    let clock = ManualClock::new(chrono::Utc::now());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let cache = CacheCoherence::new(Arc::new(TtlCache::new(shared.clone())), CacheTtls::default());
    let ledger = Arc::new(SwipeLedger::new(Arc::new(MemorySwipeStore::new()), cache, shared.clone()));
    let matches = Arc::new(MemoryMatchStore::new());
    let detector = Arc::new(MatchDetector::new(matches.clone(), ledger.clone(), shared));

    for round in 0..25u128 {
        let (a, b) = (user(2 * round + 1), user(2 * round + 2));
        let ctx = RequestContext::new();
        ledger.record(&ctx, &Swipe::new(a, b, SwipeDirection::Like, clock.now())).await.unwrap();
        ledger.record(&ctx, &Swipe::new(b, a, SwipeDirection::Like, clock.now())).await.unwrap();

        let left = tokio::spawn({
            let detector = detector.clone();
            async move { detector.check_and_create(&RequestContext::new(), a, b).await }
        });
        let right = tokio::spawn({
            let detector = detector.clone();
            async move { detector.check_and_create(&RequestContext::new(), b, a).await }
        });
        let left = left.await.unwrap().unwrap();
        let right = right.await.unwrap().unwrap();

        assert!(left.is_match && right.is_match);
        assert_eq!(u8::from(left.created) + u8::from(right.created), 1, "round {}", round);
        assert_eq!(left.record, right.record);
    }

    let all = matches.all().await;
    assert_eq!(all.len(), 25);
    let pairs: HashSet<CanonicalPair> = all.iter().map(|m| m.pair()).collect();
    assert_eq!(pairs.len(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_swipes_in_parallel_match_once() {
    let h = Harness::new();
    h.add_users(1..=40).await;

    let mut tasks = Vec::new();
    for pair in 0..20u128 {
        let (a, b) = (2 * pair + 1, 2 * pair + 2);
        for (from, to) in [(a, b), (b, a)] {
            let service = h.service.clone();
            tasks.push(tokio::spawn(async move {
                service.swipe(&RequestContext::new(), &like(from, to)).await
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let all = h.matches.all().await;
    assert_eq!(all.len(), 20);
    for record in &all {
        assert!(record.user_id_1 < record.user_id_2);
    }
}

#[tokio::test]
async fn test_unmatch_deactivates_and_keeps_swipes() {
    let h = Harness::new();
    h.add_users([1, 2]).await;
    let ctx = RequestContext::new();
    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    h.service.swipe(&ctx, &like(2, 1)).await.unwrap();

    let listed = h.service.matches(&ctx, user(1), Pagination::new(None, None, 100)).await.unwrap();
    assert_eq!(listed.total, 1);

    let record = h.service.unmatch(&ctx, user(2), user(1)).await.unwrap();
    assert!(!record.is_active);

    let listed = h.service.matches(&ctx, user(1), Pagination::new(None, None, 100)).await.unwrap();
    assert_eq!(listed.total, 0);
    assert!(listed.matches.is_empty());
    assert_eq!(h.swipes.len().await, 2);
    assert_eq!(h.matches.all().await.len(), 1);

    let again = h.service.unmatch(&ctx, user(1), user(2)).await;
    assert!(matches!(again, Err(DiscoveryError::NotFound(_))));
}

#[tokio::test]
async fn test_new_match_refreshes_cached_listing() {
    let h = Harness::new();
    h.add_users([1, 2, 3]).await;
    let ctx = RequestContext::new();
    let page = Pagination::new(None, None, 100);

    assert_eq!(h.service.matches(&ctx, user(1), page).await.unwrap().total, 0);

    h.service.swipe(&ctx, &like(1, 3)).await.unwrap();
    h.service.swipe(&ctx, &like(3, 1)).await.unwrap();

    let listed = h.service.matches(&ctx, user(1), page).await.unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.matches[0].pair(), CanonicalPair::new(user(1), user(3)));
}

#[tokio::test]
async fn test_history_and_stats() {
    let h = Harness::new();
    h.add_users(1..=5).await;
    let ctx = RequestContext::new();

    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    h.advance(chrono::Duration::minutes(1));
    h.service.swipe(&ctx, &swipe(1, 3, SwipeDirection::Pass)).await.unwrap();
    h.advance(chrono::Duration::minutes(1));
    h.service.super_like(&ctx, user(1), user(4)).await.unwrap();

    let history = h.service.history(&ctx, user(1), 0, 0).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].swiped_id, user(4));

    let history = h.service.history(&ctx, user(1), 500, 0).await.unwrap();
    let targets: Vec<_> = history.iter().map(|s| s.swiped_id).collect();
    assert_eq!(targets, vec![user(4), user(3), user(2)]);

    let stats = h.service.stats(&ctx, user(1)).await.unwrap();
    assert_eq!(stats.total_swipes, 3);
    assert_eq!(stats.likes, 1);
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.super_likes, 1);
    assert_eq!(stats.swipes_today, 3);
    assert!((stats.like_rate - 200.0 / 3.0).abs() < 1e-9);

    h.service.swipe(&ctx, &like(1, 5)).await.unwrap();
    assert_eq!(h.service.stats(&ctx, user(1)).await.unwrap().total_swipes, 4);
}

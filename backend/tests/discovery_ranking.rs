mod common;

use chrono::{Duration, NaiveDate};

use common::{adult, like, swipe, user, Harness};
use kindred::models::{
    Coordinates, DiscoveryFilter, DiscoveryPage, Gender, Pagination, SwipeDirection, UserProfile, VerificationLevel,
};
use kindred::utils::{Clock, RequestContext};
use kindred::Uuid;

fn ids(page: &DiscoveryPage) -> Vec<Uuid> {
    page.candidates.iter().map(|c| c.user_id).collect()
}

fn first_page() -> Pagination {
    Pagination::new(Some(1), Some(20), 50)
}

/// R plus C1 (premium), C2 (same, not premium) and C3 (basic, 72 h idle).
async fn ranking_fixture(premium_on_c1: bool) -> Harness {
    let h = Harness::new();
    let now = h.clock.now();
    h.add(adult(100)).await;

    for (n, premium) in [(1, premium_on_c1), (2, !premium_on_c1)] {
        let mut c = adult(n);
        c.last_name = Some("Lovelace".to_string());
        c.interested_in = vec![Gender::Male];
        c.profile_complete = true;
        c.verification_level = VerificationLevel::Document;
        c.last_active_at = Some(now - Duration::hours(1));
        c.is_premium = premium;
        h.add(c).await;
    }

    let mut basic = UserProfile::new(user(3));
    basic.birth_date = NaiveDate::from_ymd_opt(1990, 1, 1);
    basic.gender = Some(Gender::Female);
    basic.last_active_at = Some(now - Duration::hours(72));
    h.add(basic).await;
    h
}

#[tokio::test]
async fn test_ranking_prefers_premium_then_activity() {
    let h = ranking_fixture(true).await;
    let page = h
        .service
        .discover(&RequestContext::new(), user(100), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();

    assert_eq!(ids(&page), vec![user(1), user(2), user(3)]);
    assert!((page.candidates[0].score - 70.0).abs() < 1e-9);
    assert!((page.candidates[1].score - 55.0).abs() < 1e-9);
    assert!(page.candidates[0].distance_km.is_none());
}

#[tokio::test]
async fn test_swapping_premium_swaps_order() {
    let h = ranking_fixture(false).await;
    let page = h
        .service
        .discover(&RequestContext::new(), user(100), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();

    assert_eq!(ids(&page), vec![user(2), user(1), user(3)]);
}

#[tokio::test]
async fn test_ranking_is_identical_across_runs() {
    let mut orders = Vec::new();
    for _ in 0..3 {
        let h = Harness::new();
        h.add_users(1..=30).await;
        let page = h
            .service
            .discover(&RequestContext::new(), user(1), &DiscoveryFilter::default(), first_page())
            .await
            .unwrap();
        orders.push(ids(&page));
    }
    assert_eq!(orders[0].len(), 20);
    assert!(orders.windows(2).all(|w| w[0] == w[1]));

    let mut sorted = orders[0].clone();
    sorted.sort();
    assert_eq!(orders[0], sorted, "equal scores fall back to ID order");
}

#[tokio::test]
async fn test_discover_excludes_self_swiped_banned_and_inactive() {
    let h = Harness::new();
    h.add_users([1, 2, 5]).await;
    let mut banned = adult(3);
    banned.is_banned = true;
    h.add(banned).await;
    let mut inactive = adult(4);
    inactive.is_active = false;
    h.add(inactive).await;

    let ctx = RequestContext::new();
    h.service.swipe(&ctx, &swipe(1, 2, SwipeDirection::Pass)).await.unwrap();

    let page = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![user(5)]);
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_swiped_user_disappears_from_next_discover() {
    let h = Harness::new();
    h.add_users(1..=4).await;
    let ctx = RequestContext::new();

    let before = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert!(ids(&before).contains(&user(2)));

    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();

    let after = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert!(!after.from_cache);
    assert!(!ids(&after).contains(&user(2)));
    assert_eq!(after.total, 2);
}

#[tokio::test]
async fn test_cached_page_drops_newly_banned_candidate() {
    let h = Harness::new();
    h.add_users(1..=3).await;
    let ctx = RequestContext::new();

    h.service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();

    let mut banned = adult(2);
    banned.is_banned = true;
    h.add(banned).await;

    let cached = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert!(cached.from_cache);
    assert_eq!(ids(&cached), vec![user(3)]);
}

#[tokio::test]
async fn test_caller_exclusions_and_gender_filter() {
    let h = Harness::new();
    h.add_users([1, 2, 3]).await;
    let mut male = adult(4);
    male.gender = Some(Gender::Male);
    h.add(male).await;

    let filter = DiscoveryFilter {
        interested_in: vec![Gender::Female],
        excluded_ids: vec![user(2)],
        ..Default::default()
    };
    let page = h
        .service
        .discover(&RequestContext::new(), user(1), &filter, first_page())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![user(3)]);
}

#[tokio::test]
async fn test_location_search_ranks_nearest_first() {
    let h = Harness::new();
    let london = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };
    let mut requester = adult(1);
    requester.location = Some(london);
    h.add(requester).await;

    for (n, latitude) in [(2, 51.60), (3, 51.52), (4, 53.48)] {
        let mut c = adult(n);
        c.location = Some(Coordinates {
            latitude,
            longitude: -0.1278,
        });
        h.add(c).await;
    }

    let page = h
        .service
        .discover(&RequestContext::new(), user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();

    // 53.48 N is ~220 km away, outside the default 50 km radius.
    assert_eq!(ids(&page), vec![user(3), user(2)]);
    let nearest = page.candidates[0].distance_km.unwrap();
    assert!(nearest > 1.0 && nearest < 2.0);
}

#[tokio::test]
async fn test_pages_slice_the_ranking() {
    let h = Harness::new();
    h.add_users(1..=26).await;
    let ctx = RequestContext::new();

    let first = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), Pagination::new(Some(1), Some(10), 50))
        .await
        .unwrap();
    let third = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), Pagination::new(Some(3), Some(10), 50))
        .await
        .unwrap();

    assert_eq!(first.total, 25);
    assert_eq!(first.candidates.len(), 10);
    assert_eq!(third.candidates.len(), 5);
    assert_eq!(third.page, 3);
    assert!(ids(&third).iter().all(|id| !ids(&first).contains(id)));
}

#[tokio::test]
async fn test_cancelled_discover_leaves_no_cache_entry() {
    let h = Harness::new();
    h.add_users(1..=3).await;
    let ctx = RequestContext::new();
    ctx.token().cancel();

    let result = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await;
    assert!(matches!(result, Err(kindred::DiscoveryError::Cancelled)));
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_profile_change_drops_cached_pages() {
    let h = Harness::new();
    h.add_users(1..=3).await;
    let ctx = RequestContext::new();

    let first = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert!(!first.from_cache);
    let cached = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert!(cached.from_cache);

    h.service.on_profile_updated(user(1)).await;

    let rebuilt = h
        .service
        .discover(&ctx, user(1), &DiscoveryFilter::default(), first_page())
        .await
        .unwrap();
    assert!(!rebuilt.from_cache);
    assert_eq!(ids(&rebuilt), ids(&first));
}

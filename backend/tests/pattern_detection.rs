mod common;

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{like, swipe, user, Harness};
use kindred::models::SwipeDirection;
use kindred::services::pattern_analyzer::SuspicionReason;
use kindred::utils::RequestContext;

#[tokio::test]
async fn test_metronomic_liker_is_flagged() {
    let h = Harness::new();
    h.add_users(1..=13).await;
    let ctx = RequestContext::new();

    let jitter = [0, 30, -30, 10, -20, 25, -5, 15, -25, 5, 20];
    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    for (i, offset) in jitter.iter().enumerate() {
        h.advance(Duration::milliseconds(200 + offset));
        h.service.swipe(&ctx, &like(1, i as u128 + 3)).await.unwrap();
    }

    let report = h.service.analyse_pattern(&ctx, user(1)).await.unwrap();
    assert_eq!(report.total, 12);
    assert!(report.suspicious);
    assert!(report.reasons.contains(&SuspicionReason::RapidSwiping));
    assert!(report.reasons.contains(&SuspicionReason::MechanicalPeriodicity));
    assert!(report.avg_interval_seconds < 0.25);
}

#[tokio::test]
async fn test_irregular_mixed_swiper_is_not_flagged() {
    let h = Harness::new();
    h.add_users(1..=13).await;
    let ctx = RequestContext::new();

    let gaps_ms = [3_000, 7_500, 4_200, 12_000, 5_100, 19_000, 8_300, 3_600, 15_000, 6_400, 10_000];
    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    for (i, gap) in gaps_ms.iter().enumerate() {
        h.advance(Duration::milliseconds(*gap));
        let direction = if i % 2 == 0 {
            SwipeDirection::Pass
        } else {
            SwipeDirection::Like
        };
        h.service.swipe(&ctx, &swipe(1, i as u128 + 3, direction)).await.unwrap();
    }

    let report = h.service.analyse_pattern(&ctx, user(1)).await.unwrap();
    assert_eq!(report.total, 12);
    assert!(!report.suspicious, "reasons: {:?}", report.reasons);
    assert!(report.reasons.is_empty());
    assert!((report.like_rate - 50.0).abs() < 1e-9);
    assert_eq!(report.time_pattern, "clustered_12");
}

#[tokio::test]
async fn test_uniform_random_intervals_are_not_flagged() {
    let h = Harness::new();
    h.add_users(1..=13).await;
    let ctx = RequestContext::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    let mut previous: i64 = 0;
    for i in 0..11u128 {
        // Redraw near-repeats so no two consecutive gaps look mechanical.
        let mut gap = rng.random_range(3_000..=20_000);
        while (gap - previous).abs() < 100 {
            gap = rng.random_range(3_000..=20_000);
        }
        previous = gap;
        h.advance(Duration::milliseconds(gap));

        let direction = if i % 3 == 0 {
            SwipeDirection::Pass
        } else {
            SwipeDirection::Like
        };
        h.service.swipe(&ctx, &swipe(1, i + 3, direction)).await.unwrap();
    }

    let report = h.service.analyse_pattern(&ctx, user(1)).await.unwrap();
    assert_eq!(report.total, 12);
    assert!(!report.suspicious, "reasons: {:?}", report.reasons);
    assert!(report.avg_interval_seconds >= 3.0);
}

#[tokio::test]
async fn test_random_jitter_around_200ms_is_flagged() {
    let h = Harness::new();
    h.add_users(1..=13).await;
    let ctx = RequestContext::new();
    let mut rng = StdRng::seed_from_u64(42);

    h.service.swipe(&ctx, &like(1, 2)).await.unwrap();
    for target in 3..=13 {
        h.advance(Duration::milliseconds(200 + rng.random_range(-30..=30)));
        h.service.swipe(&ctx, &like(1, target)).await.unwrap();
    }

    let report = h.service.analyse_pattern(&ctx, user(1)).await.unwrap();
    assert!(report.suspicious);
    assert!(report.reasons.contains(&SuspicionReason::MechanicalPeriodicity));
}

#[tokio::test]
async fn test_short_history_is_never_flagged() {
    let h = Harness::new();
    h.add_users(1..=10).await;
    let ctx = RequestContext::new();

    for target in 2..=10 {
        h.advance(Duration::milliseconds(50));
        h.service.swipe(&ctx, &like(1, target)).await.unwrap();
    }

    let report = h.service.analyse_pattern(&ctx, user(1)).await.unwrap();
    assert_eq!(report.total, 9);
    assert!(!report.suspicious);
}

#[tokio::test]
async fn test_user_without_swipes_gets_empty_report() {
    let h = Harness::new();
    h.add_users([1]).await;

    let report = h.service.analyse_pattern(&RequestContext::new(), user(1)).await.unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(report.like_rate, 0.0);
    assert!(!report.suspicious);
}

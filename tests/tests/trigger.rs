//! Invocation trigger throttling.

use chrono::Duration;
use integration_tests::fixtures::{at, date, daily, owner, OWNER_ID};
use integration_tests::setup::TestContext;
use rollup_core::{Layer, SkipReason};

/// Fires within the interval are throttled; the interval is five minutes.
#[tokio::test]
async fn test_trigger_throttles_within_interval() {
    let ctx = TestContext::new(at(2024, 1, 20));
    let trigger = ctx.trigger(Layer::Weekly);

    let first = trigger.fire(&owner()).await;
    assert_ne!(first.skipped, Some(SkipReason::Throttled));
    assert_eq!(trigger.last_checked_at(), Some(at(2024, 1, 20)));

    ctx.clock.advance(Duration::minutes(4));
    let second = trigger.fire(&owner()).await;
    assert_eq!(second.skipped, Some(SkipReason::Throttled));
    assert_eq!(trigger.last_checked_at(), Some(at(2024, 1, 20)));

    ctx.clock.advance(Duration::minutes(1));
    let third = trigger.fire(&owner()).await;
    assert_ne!(third.skipped, Some(SkipReason::Throttled));
    assert_eq!(
        trigger.last_checked_at(),
        Some(at(2024, 1, 20) + Duration::minutes(5))
    );
}

/// A throttled fire never reaches the store or the generator.
#[tokio::test]
async fn test_throttled_fire_does_no_work() {
    let ctx = TestContext::new(at(2024, 1, 10));
    ctx.seed([daily(OWNER_ID, date(2024, 1, 2), "enc:Tuesday")]);
    let trigger = ctx.trigger(Layer::Weekly);

    // Week not closed yet: the pass runs but creates nothing.
    assert!(!trigger.fire(&owner()).await.created);

    ctx.clock.advance(Duration::minutes(1));
    assert_eq!(
        trigger.fire(&owner()).await.skipped,
        Some(SkipReason::Throttled)
    );
    assert_eq!(ctx.generator.request_count(), 0);

    ctx.clock.set(at(2024, 1, 15));
    assert!(trigger.fire(&owner()).await.created);
    assert_eq!(ctx.generator.request_count(), 1);
}

/// The timestamp advances even when the pass fails.
#[tokio::test]
async fn test_failed_pass_still_claims_interval() {
    let ctx = TestContext::new(at(2024, 1, 20));
    ctx.seed([daily(OWNER_ID, date(2024, 1, 2), "enc:Tuesday")]);
    ctx.generator.set_should_fail(true);
    let trigger = ctx.trigger(Layer::Weekly);

    assert!(trigger.fire(&owner()).await.is_error());
    assert_eq!(trigger.last_checked_at(), Some(at(2024, 1, 20)));

    ctx.generator.set_should_fail(false);
    assert_eq!(
        trigger.fire(&owner()).await.skipped,
        Some(SkipReason::Throttled)
    );
}

/// Triggers for different layers keep separate timestamps.
#[tokio::test]
async fn test_layers_throttle_independently() {
    let ctx = TestContext::new(at(2024, 1, 20));
    let weekly = ctx.trigger(Layer::Weekly);
    let monthly = ctx.trigger(Layer::Monthly);

    weekly.fire(&owner()).await;
    let outcome = monthly.fire(&owner()).await;

    assert_ne!(outcome.skipped, Some(SkipReason::Throttled));
    assert!(monthly.last_checked_at().is_some());
}

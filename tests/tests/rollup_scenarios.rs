//! End-to-end rollup passes against the in-memory store.
//!
//! Each test builds its own context with the clock stopped at a fixed instant.

use integration_tests::fixtures::{self, at, at_hm, date, daily, owner, weekly, OWNER_ID};
use integration_tests::setup::TestContext;
use rollup_core::{Layer, OwnerContext, SkipReason};
use worker::EngineConfig;

fn first_week_of_2024() -> Vec<rollup_core::PeriodSummary> {
    vec![
        daily(OWNER_ID, date(2024, 1, 1), "enc:Monday"),
        daily(OWNER_ID, date(2024, 1, 2), "enc:Tuesday"),
        daily(OWNER_ID, date(2024, 1, 3), "enc:Wednesday"),
    ]
}

/// Three days in a long-closed week produce one weekly summary.
#[tokio::test]
async fn test_closed_week_is_summarized() {
    let ctx = TestContext::new(at(2024, 1, 20));
    ctx.seed(first_week_of_2024());

    let outcome = ctx.run(Layer::Weekly, &owner()).await;

    assert!(outcome.created, "expected a summary, got {:?}", outcome);
    assert!(outcome.error.is_none());
    let period = outcome.period.expect("created outcome carries its period");
    assert_eq!(period.start, date(2024, 1, 1));
    assert_eq!(period.end, date(2024, 1, 7));

    let weekly = ctx.summaries(OWNER_ID, Layer::Weekly).await;
    assert_eq!(weekly.len(), 1);
    assert_eq!(Some(weekly[0].id), outcome.summary_id);
    assert_eq!(weekly[0].period_start, date(2024, 1, 1));
    assert_eq!(weekly[0].period_end, date(2024, 1, 7));
    assert_eq!(weekly[0].created_at, at(2024, 1, 20));

    let dailies = ctx.summaries(OWNER_ID, Layer::Daily).await;
    let expected: Vec<_> = dailies.iter().map(|d| d.id).collect();
    assert_eq!(weekly[0].source_child_ids, expected);
}

/// The generation service sees decrypted children in chronological order.
#[tokio::test]
async fn test_generation_receives_plaintext_in_order() {
    let ctx = TestContext::new(at(2024, 1, 20));
    let mut days = first_week_of_2024();
    days.reverse();
    ctx.seed(days);

    let personal = owner().with_personalization(serde_json::json!({ "name": "Sam" }));
    ctx.run(Layer::Weekly, &personal).await;

    let requests = ctx.generator.captured_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.layer, Layer::Weekly);
    assert_eq!(request.period_start, date(2024, 1, 1));
    assert_eq!(request.period_end, date(2024, 1, 7));
    assert_eq!(request.personalization["name"], "Sam");

    let contents: Vec<&str> = request.children.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["Monday", "Tuesday", "Wednesday"]);
}

/// Stored content is the encrypted form of what the service generated.
#[tokio::test]
async fn test_content_is_encrypted_before_persisting() {
    let ctx = TestContext::new(at(2024, 1, 20));
    ctx.seed(first_week_of_2024());
    ctx.generator.set_supplementary(Some("Keep going"));

    ctx.run(Layer::Weekly, &owner()).await;

    let weekly = ctx.summaries(OWNER_ID, Layer::Weekly).await;
    assert_eq!(
        weekly[0].content,
        "enc:weekly 2024-01-01: Monday | Tuesday | Wednesday"
    );
    assert_eq!(
        weekly[0].supplementary_content.as_deref(),
        Some("enc:Keep going")
    );
}

/// A week that ended two days ago is still inside its buffer.
#[tokio::test]
async fn test_recent_week_is_not_closed() {
    let ctx = TestContext::new(at(2024, 1, 10));
    ctx.seed(first_week_of_2024());

    let outcome = ctx.run(Layer::Weekly, &owner()).await;

    assert!(!outcome.created);
    assert_eq!(outcome.skipped, Some(SkipReason::NoGap));
    assert_eq!(outcome.period.map(|p| p.start), Some(date(2024, 1, 1)));
    assert!(ctx.summaries(OWNER_ID, Layer::Weekly).await.is_empty());
    assert_eq!(ctx.generator.request_count(), 0);
}

/// The week closes exactly one full week after it ends.
#[tokio::test]
async fn test_week_closes_at_buffer_boundary() {
    let ctx = TestContext::new(at_hm(2024, 1, 14, 23, 59));
    ctx.seed(first_week_of_2024());

    assert!(!ctx.run(Layer::Weekly, &owner()).await.created);

    ctx.clock.set(at(2024, 1, 15));
    assert!(ctx.run(Layer::Weekly, &owner()).await.created);
}

/// A missing adjacent week blocks later weeks that do have data.
#[tokio::test]
async fn test_empty_adjacent_week_stalls_layer() {
    let ctx = TestContext::new(at(2024, 2, 1));
    ctx.seed([
        weekly(OWNER_ID, date(2024, 1, 1)),
        daily(OWNER_ID, date(2024, 1, 16), "enc:Tuesday"),
        daily(OWNER_ID, date(2024, 1, 17), "enc:Wednesday"),
    ]);

    let outcome = ctx.run(Layer::Weekly, &owner()).await;

    assert!(!outcome.created);
    assert_eq!(outcome.skipped, Some(SkipReason::NoGap));
    assert_eq!(outcome.period.map(|p| p.start), Some(date(2024, 1, 8)));
    assert_eq!(ctx.summaries(OWNER_ID, Layer::Weekly).await.len(), 1);
    assert_eq!(ctx.generator.request_count(), 0);
}

/// A second pass never re-summarizes a period.
#[tokio::test]
async fn test_repeated_pass_is_idempotent() {
    let ctx = TestContext::new(at(2024, 1, 20));
    ctx.seed(first_week_of_2024());

    assert!(ctx.run(Layer::Weekly, &owner()).await.created);
    let second = ctx.run(Layer::Weekly, &owner()).await;

    assert!(!second.created);
    assert_eq!(second.skipped, Some(SkipReason::NoGap));
    assert_eq!(ctx.summaries(OWNER_ID, Layer::Weekly).await.len(), 1);
    assert_eq!(ctx.generator.request_count(), 1);
}

/// Successive passes walk forward one contiguous week at a time.
#[tokio::test]
async fn test_passes_advance_one_week_at_a_time() {
    let ctx = TestContext::new(at(2024, 2, 1));
    ctx.seed([
        daily(OWNER_ID, date(2024, 1, 15), "enc:third"),
        daily(OWNER_ID, date(2024, 1, 2), "enc:first"),
        daily(OWNER_ID, date(2024, 1, 9), "enc:second"),
    ]);

    for expected in [date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)] {
        let outcome = ctx.run(Layer::Weekly, &owner()).await;
        assert!(outcome.created);
        assert_eq!(outcome.period.map(|p| p.start), Some(expected));
    }
    assert!(!ctx.run(Layer::Weekly, &owner()).await.created);

    let starts: Vec<_> = ctx
        .summaries(OWNER_ID, Layer::Weekly)
        .await
        .iter()
        .map(|s| s.period_start)
        .collect();
    assert_eq!(starts, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
}

/// Weekly summaries roll into a monthly one once the month has matured.
#[tokio::test]
async fn test_weeks_cascade_into_month() {
    let ctx = TestContext::new(at(2024, 3, 15));
    ctx.seed(
        [1, 8, 15, 22, 29]
            .into_iter()
            .map(|d| daily(OWNER_ID, date(2024, 1, d), "enc:day")),
    );

    assert_eq!(ctx.run_until_idle(Layer::Weekly, &owner()).await, 5);

    let outcome = ctx.run(Layer::Monthly, &owner()).await;
    assert!(outcome.created, "expected monthly summary, got {:?}", outcome);
    let period = outcome.period.expect("period");
    assert_eq!(period.start, date(2024, 1, 1));
    assert_eq!(period.end, date(2024, 1, 31));

    let monthly = ctx.summaries(OWNER_ID, Layer::Monthly).await;
    assert_eq!(monthly[0].source_child_ids.len(), 5);

    // Yearly waits for the year plus one more year.
    let yearly = ctx.run(Layer::Yearly, &owner()).await;
    assert!(!yearly.created);
    assert_eq!(yearly.skipped, Some(SkipReason::NoGap));
}

/// Monthly summaries roll into a yearly one a full year after the year ends.
#[tokio::test]
async fn test_months_cascade_into_year() {
    let ctx = TestContext::new(at(2025, 1, 2));
    ctx.seed([
        fixtures::summary(OWNER_ID, Layer::Monthly, date(2023, 1, 1), date(2023, 1, 31), "enc:January"),
        fixtures::summary(OWNER_ID, Layer::Monthly, date(2023, 7, 1), date(2023, 7, 31), "enc:July"),
        fixtures::summary(OWNER_ID, Layer::Monthly, date(2024, 2, 1), date(2024, 2, 29), "enc:February"),
    ]);

    let outcome = ctx.run(Layer::Yearly, &owner()).await;
    assert!(outcome.created, "expected yearly summary, got {:?}", outcome);
    let period = outcome.period.expect("period");
    assert_eq!(period.start, date(2023, 1, 1));
    assert_eq!(period.end, date(2023, 12, 31));

    let yearly = ctx.summaries(OWNER_ID, Layer::Yearly).await;
    assert_eq!(yearly.len(), 1);
    assert_eq!(yearly[0].source_child_ids.len(), 2);
    let request = &ctx.generator.captured_requests()[0];
    let contents: Vec<&str> = request.children.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["January", "July"]);

    // 2024 has data but stays open until 2026.
    let next = ctx.run(Layer::Yearly, &owner()).await;
    assert!(!next.created);
    assert_eq!(next.skipped, Some(SkipReason::NoGap));
    assert_eq!(next.period.map(|p| p.start), Some(date(2024, 1, 1)));
    assert_eq!(ctx.summaries(OWNER_ID, Layer::Yearly).await.len(), 1);
}

/// Weekly periods follow the configured week start.
#[tokio::test]
async fn test_sunday_week_start() {
    let engine = EngineConfig {
        week_start: chrono::Weekday::Sun,
        ..EngineConfig::default()
    };
    let ctx = TestContext::with_engine(at(2024, 1, 20), engine);
    ctx.seed(first_week_of_2024());

    let outcome = ctx.run(Layer::Weekly, &owner()).await;

    let period = outcome.period.expect("period");
    assert_eq!(period.start, date(2023, 12, 31));
    assert_eq!(period.end, date(2024, 1, 6));
}

/// Maturation is judged at local midnight in the owner's zone.
#[tokio::test]
async fn test_maturation_uses_owner_offset() {
    let now = at_hm(2024, 1, 14, 12, 0);

    let ahead = TestContext::new(now);
    ahead.seed(first_week_of_2024());
    let kiribati = OwnerContext::new(OWNER_ID).with_utc_offset_minutes(14 * 60);
    assert!(ahead.run(Layer::Weekly, &kiribati).await.created);

    let utc = TestContext::new(now);
    utc.seed(first_week_of_2024());
    assert!(!utc.run(Layer::Weekly, &owner()).await.created);
}

/// Owners never see each other's children.
#[tokio::test]
async fn test_owners_are_isolated() {
    let ctx = TestContext::new(at(2024, 1, 20));
    ctx.seed(first_week_of_2024());
    ctx.seed([fixtures::daily("owner-2", date(2024, 1, 9), "enc:other")]);

    let outcome = ctx.run(Layer::Weekly, &OwnerContext::new("owner-2")).await;

    // owner-2's only week ends Jan 14 and closes Jan 22.
    assert!(!outcome.created);
    assert_eq!(outcome.period.map(|p| p.start), Some(date(2024, 1, 8)));
    assert!(ctx.summaries("owner-2", Layer::Weekly).await.is_empty());
    assert!(ctx.summaries(OWNER_ID, Layer::Weekly).await.is_empty());
}

/// One sweep runs every rollup layer once per owner.
#[tokio::test]
async fn test_sweep_runs_each_layer_once() {
    let ctx = TestContext::new(at(2024, 1, 20));
    ctx.seed(first_week_of_2024());

    let scheduler = ctx.scheduler(vec![owner()]);
    let report = scheduler.sweep_once(&[owner()]).await;

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(ctx.summaries(OWNER_ID, Layer::Weekly).await.len(), 1);
}

//! Feature gate tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerSettings;
use crate::error::ErrorKind;
use crate::feature::{
    adapters::memory::{InMemoryCacheStore, StaticFeatureFlags},
    domain::{FEATURE_FLAGS_CACHE_KEY, FeatureEvaluationResult},
    ports::{CacheStore, FeatureFlagClient, FeatureFlagResult, MockFeatureFlagClient},
    services::{FeatureGate, FeatureGateError},
};
use crate::test_support::FixedClock;
use rstest::{fixture, rstest};

struct Harness {
    clock: Arc<FixedClock>,
    flags: Arc<StaticFeatureFlags>,
    cache: Arc<InMemoryCacheStore<FixedClock>>,
    gate: FeatureGate<StaticFeatureFlags, InMemoryCacheStore<FixedClock>>,
}

#[fixture]
fn harness() -> Harness {
    let settings = SchedulerSettings::default();
    let clock = Arc::new(FixedClock::at_secs(1_767_268_800));
    let flags = Arc::new(
        StaticFeatureFlags::new()
            .with_flag(settings.flags.scheduler.as_str(), true)
            .with_flag(settings.flags.history.as_str(), true),
    );
    let cache = Arc::new(InMemoryCacheStore::new(Arc::clone(&clock)));
    let gate = FeatureGate::new(Arc::clone(&flags), Arc::clone(&cache), &settings);
    Harness {
        clock,
        flags,
        cache,
        gate,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn flags_are_evaluated_once_per_cache_lifetime(harness: Harness) {
    let token = CancellationToken::new();

    let first = harness.gate.get_flags(&token).await.expect("flags evaluate");
    harness.clock.advance_secs(29);
    let second = harness.gate.get_flags(&token).await.expect("flags cached");

    assert_eq!(first, second);
    assert!(first.scheduler_enabled);
    assert!(first.history_enabled);
    assert!(!first.calculation_detail_enabled);
    assert!(!first.force_recalculate_enabled);
    assert_eq!(harness.flags.evaluation_count(), 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_bundle_is_re_evaluated(harness: Harness) {
    let token = CancellationToken::new();
    harness.gate.get_flags(&token).await.expect("flags evaluate");
    harness
        .flags
        .set_flag(SchedulerSettings::default().flags.scheduler, false);

    harness.clock.advance_secs(30);
    let refreshed = harness.gate.get_flags(&token).await.expect("flags refresh");

    assert!(!refreshed.scheduler_enabled);
    assert_eq!(harness.flags.evaluation_count(), 8);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undecodable_cache_entry_counts_as_a_miss(harness: Harness) {
    harness
        .cache
        .set(FEATURE_FLAGS_CACHE_KEY, b"{not json".to_vec(), Duration::from_secs(30))
        .await
        .expect("cache write");

    let flags = harness
        .gate
        .get_flags(&CancellationToken::new())
        .await
        .expect("flags evaluate");

    assert!(flags.scheduler_enabled);
    assert_eq!(harness.flags.evaluation_count(), 4);
    let cached = harness
        .cache
        .get(FEATURE_FLAGS_CACHE_KEY)
        .await
        .expect("cache read")
        .expect("bundle cached");
    let decoded: FeatureEvaluationResult =
        serde_json::from_slice(&cached).expect("cached bundle decodes");
    assert_eq!(decoded, flags);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_flag_service_fails_and_caches_nothing(harness: Harness) {
    harness.flags.set_unavailable(true);

    let result = harness.gate.get_flags(&CancellationToken::new()).await;

    let error = result.expect_err("flag failure must propagate");
    assert_eq!(error.kind(), ErrorKind::Unavailable);
    assert!(
        harness
            .cache
            .get(FEATURE_FLAGS_CACHE_KEY)
            .await
            .expect("cache read")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancellation_before_evaluation_is_reported(harness: Harness) {
    let token = CancellationToken::new();
    token.cancel();

    let result = harness.gate.get_flags(&token).await;

    assert!(matches!(result, Err(FeatureGateError::Cancelled)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn each_configured_key_is_evaluated_exactly_once() {
    let settings = SchedulerSettings::default();
    let history_key = settings.flags.history.clone();
    let mut client = MockFeatureFlagClient::new();
    client
        .expect_evaluate()
        .times(4)
        .returning(move |key| Ok(key == history_key));
    let clock = Arc::new(FixedClock::at_secs(0));
    let gate = FeatureGate::new(
        Arc::new(client),
        Arc::new(InMemoryCacheStore::new(clock)),
        &settings,
    );

    let flags = gate
        .get_flags(&CancellationToken::new())
        .await
        .expect("flags evaluate");

    assert_eq!(
        flags,
        FeatureEvaluationResult {
            history_enabled: true,
            ..FeatureEvaluationResult::default()
        }
    );
}

/// Flag client whose evaluations only complete once four are in flight.
struct RendezvousFlags {
    barrier: Barrier,
}

#[async_trait]
impl FeatureFlagClient for RendezvousFlags {
    async fn evaluate(&self, _flag_key: &str) -> FeatureFlagResult<bool> {
        self.barrier.wait().await;
        Ok(true)
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn flags_are_evaluated_concurrently() {
    let clock = Arc::new(FixedClock::at_secs(0));
    let gate = FeatureGate::new(
        Arc::new(RendezvousFlags {
            barrier: Barrier::new(4),
        }),
        Arc::new(InMemoryCacheStore::new(clock)),
        &SchedulerSettings::default(),
    );

    let flags = tokio::time::timeout(
        Duration::from_secs(5),
        gate.get_flags(&CancellationToken::new()),
    )
    .await
    .expect("sequential evaluation would never pass the barrier")
    .expect("flags evaluate");

    assert_eq!(flags, FeatureEvaluationResult::all_enabled());
}

//! Behavior-driven tests for the conversion policy
//!
//! These tests verify HOW the policy picks between live and cached rates as
//! connectivity changes, and what the user sees as a result.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fxrate_core::{
    run_policy, ConversionPolicy, Currency, MemoryKeyValueStore, PolicyEvent, PolicyState,
    Preference, ProviderId, RateError, RateSnapshot, RateSource, RateStore, UtcDateTime,
};
use time::Duration;
use tokio::sync::{mpsc, watch};

// =============================================================================
// Test doubles
// =============================================================================

/// Source that always answers with the same outcome and counts calls.
struct FixedSource {
    outcome: Result<RateSnapshot, RateError>,
    calls: AtomicUsize,
}

impl FixedSource {
    fn serving(snapshot: RateSnapshot) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(snapshot),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: RateError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RateSource for FixedSource {
    fn fetch<'a>(
        &'a self,
        _provider: ProviderId,
    ) -> Pin<Box<dyn Future<Output = Result<RateSnapshot, RateError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}

/// Source that replays a fixed sequence of outcomes, one per call.
struct SequenceSource {
    outcomes: Mutex<VecDeque<Result<RateSnapshot, RateError>>>,
}

impl SequenceSource {
    fn new(outcomes: Vec<Result<RateSnapshot, RateError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
        })
    }
}

impl RateSource for SequenceSource {
    fn fetch<'a>(
        &'a self,
        _provider: ProviderId,
    ) -> Pin<Box<dyn Future<Output = Result<RateSnapshot, RateError>> + Send + 'a>> {
        let outcome = self
            .outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| Err(RateError::transport("no scripted outcome left")));
        Box::pin(async move { outcome })
    }
}

fn usd_table(fetched_at: UtcDateTime) -> RateSnapshot {
    let rates = BTreeMap::from([
        (Currency::Usd, 1.0),
        (Currency::Eur, 0.85),
        (Currency::Gbp, 0.75),
    ]);
    RateSnapshot::new(Currency::Usd, rates, fetched_at).expect("valid table")
}

fn empty_store() -> RateStore {
    RateStore::new(Arc::new(MemoryKeyValueStore::new()))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// =============================================================================
// Conversion Policy: Online
// =============================================================================

#[tokio::test]
async fn when_online_without_cache_policy_fetches_and_converts() {
    // Given: An empty cache and a reachable provider
    let store = empty_store();
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));

    // When: The policy starts connected and the user enters 100 USD -> EUR
    let mut policy =
        ConversionPolicy::start(store.clone(), source.clone(), ProviderId::Fixer, true).await;
    policy.set_pair(Preference::new(Currency::Usd, Currency::Eur));
    policy.set_amount(100.0).expect("valid amount");

    // Then: Live rates are used, cached, and the result is 85 EUR
    assert_eq!(policy.state(), &PolicyState::Online);
    assert_eq!(source.calls(), 1);
    assert_close(policy.converted(), 85.0);
    assert!(store.load().is_some(), "fetched rates should be cached");
}

#[tokio::test]
async fn when_amount_is_zero_conversion_is_zero() {
    // Given: A policy with rates loaded
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let mut policy = ConversionPolicy::start(empty_store(), source, ProviderId::Fixer, true).await;
    policy.set_amount(40.0).expect("valid amount");

    // When: The user clears the amount
    policy.set_amount(0.0).expect("zero is valid");

    // Then: The converted value is exactly zero
    assert_eq!(policy.converted(), 0.0);
}

#[tokio::test]
async fn when_user_swaps_currencies_result_uses_inverted_ratio() {
    // Given: 85 USD -> EUR
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let mut policy = ConversionPolicy::start(empty_store(), source, ProviderId::Fixer, true).await;
    policy.set_pair(Preference::new(Currency::Usd, Currency::Eur));
    policy.set_amount(85.0).expect("valid amount");

    // When: The pair is swapped
    policy.swap();

    // Then: 85 EUR -> USD is 100
    assert_eq!(policy.preference(), Preference::new(Currency::Eur, Currency::Usd));
    assert_close(policy.converted(), 100.0);
}

#[tokio::test]
async fn when_fetch_fails_but_cache_is_valid_policy_serves_cache() {
    // Given: A valid cache and a provider that returns garbage
    let store = empty_store();
    store
        .save(&usd_table(UtcDateTime::now() - Duration::hours(2)))
        .expect("cache write");
    let source = FixedSource::failing(RateError::invalid_data("bad payload"));
    let mut policy = ConversionPolicy::start(store, source, ProviderId::Fixer, true).await;

    // When: The user explicitly refreshes
    let state = policy.fetch().await.clone();

    // Then: The error is masked by the cache
    assert_eq!(state, PolicyState::OfflineValidCache);
    let view = policy.view();
    assert!(view.warning.is_some(), "cached data should be flagged");
}

// =============================================================================
// Conversion Policy: Offline
// =============================================================================

#[tokio::test]
async fn when_offline_with_valid_cache_conversions_still_work() {
    // Given: Rates cached one hour ago and no network
    let store = empty_store();
    store
        .save(&usd_table(UtcDateTime::now() - Duration::hours(1)))
        .expect("cache write");
    let source = FixedSource::failing(RateError::no_connection());

    // When: The policy starts disconnected and the user converts
    let mut policy =
        ConversionPolicy::start(store, source.clone(), ProviderId::OpenExchangeRates, false).await;
    policy.set_pair(Preference::new(Currency::Usd, Currency::Gbp));
    policy.set_amount(10.0).expect("valid amount");

    // Then: Cached rates are used and no request is attempted
    assert_eq!(policy.state(), &PolicyState::OfflineValidCache);
    assert_close(policy.converted(), 7.5);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn when_offline_without_cache_policy_reports_error_and_freezes_value() {
    // Given: No cache and no network
    let source = FixedSource::failing(RateError::no_connection());
    let mut policy =
        ConversionPolicy::start(empty_store(), source, ProviderId::OpenExchangeRates, false).await;

    // When: The user types an amount
    policy.set_amount(100.0).expect("valid amount");

    // Then: The policy is in Error and the converted value does not move
    assert!(policy.state().is_error());
    assert_eq!(policy.converted(), 0.0);
    match policy.state() {
        PolicyState::Error(message) => assert!(!message.is_empty()),
        other => panic!("expected error state, got {other:?}"),
    }
}

#[tokio::test]
async fn when_policy_falls_into_error_converted_value_stays_at_last_result() {
    // Given: 100 USD -> EUR converted from a table whose cache entry is already expired
    let source = SequenceSource::new(vec![
        Ok(usd_table(UtcDateTime::now() - Duration::hours(25))),
        Err(RateError::transport("connection reset")),
    ]);
    let store = empty_store();
    let mut policy = ConversionPolicy::start(store.clone(), source, ProviderId::Fixer, true).await;
    policy.set_pair(Preference::new(Currency::Usd, Currency::Eur));
    policy.set_amount(100.0).expect("valid amount");
    assert_eq!(policy.state(), &PolicyState::Online);
    assert_close(policy.converted(), 85.0);
    assert_eq!(store.load(), None, "cached entry is expired");

    // When: A refresh fails with nothing valid to fall back to, and the user edits the amount
    let state = policy.fetch().await.clone();
    policy.set_amount(50.0).expect("valid amount");

    // Then: The error carries the fetch failure and the output keeps its last value
    assert!(matches!(&state, PolicyState::Error(message) if message.contains("connection reset")));
    assert_close(policy.amount(), 50.0);
    assert_close(policy.converted(), 85.0);
}

#[tokio::test]
async fn when_fetch_is_requested_offline_with_valid_cache_no_request_is_made() {
    // Given: A disconnected policy with rates cached an hour ago
    let store = empty_store();
    store
        .save(&usd_table(UtcDateTime::now() - Duration::hours(1)))
        .expect("cache write");
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let mut policy = ConversionPolicy::start(store, source.clone(), ProviderId::Fixer, false).await;
    policy.set_pair(Preference::new(Currency::Usd, Currency::Eur));
    policy.set_amount(100.0).expect("valid amount");

    // When: The user asks for a refresh
    let state = policy.fetch().await.clone();

    // Then: The cache keeps serving and the provider is never contacted
    assert_eq!(state, PolicyState::OfflineValidCache);
    assert_eq!(source.calls(), 0);
    assert_close(policy.converted(), 85.0);
}

#[tokio::test]
async fn when_fetch_is_requested_offline_without_cache_policy_reports_error() {
    // Given: A disconnected policy with an empty cache
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let mut policy =
        ConversionPolicy::start(empty_store(), source.clone(), ProviderId::Fixer, false).await;

    // When: The user asks for a refresh
    let state = policy.fetch().await.clone();

    // Then: No request is attempted and the no-connection error is shown
    assert_eq!(state, PolicyState::Error(String::from("no connection and no cache")));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn when_connection_drops_with_expired_cache_policy_goes_stale() {
    // Given: An online policy whose only cache entry is 25 hours old
    let store = empty_store();
    store
        .save(&usd_table(UtcDateTime::now() - Duration::hours(25)))
        .expect("cache write");
    let source = FixedSource::serving(usd_table(UtcDateTime::now() - Duration::hours(25)));
    let mut policy = ConversionPolicy::start(store, source, ProviderId::Fixer, true).await;

    // When: Connectivity is lost
    policy.on_connectivity_change(false);

    // Then: The stale state is reported to the user
    assert_eq!(policy.state(), &PolicyState::OfflineStaleCache);
    assert!(!policy.is_connected());
}

#[tokio::test]
async fn when_connection_returns_policy_is_online_without_fetching() {
    // Given: An offline policy with a valid cache
    let store = empty_store();
    store
        .save(&usd_table(UtcDateTime::now()))
        .expect("cache write");
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let mut policy = ConversionPolicy::start(store, source.clone(), ProviderId::Fixer, false).await;

    // When: The device reconnects
    policy.on_connectivity_change(true);

    // Then: The state flips to Online and no request is made until asked
    assert_eq!(policy.state(), &PolicyState::Online);
    assert_eq!(source.calls(), 0);
}

// =============================================================================
// Conversion Policy: Event loop
// =============================================================================

#[tokio::test]
async fn when_events_arrive_driver_publishes_each_resulting_view() {
    // Given: A running policy driver
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let policy = ConversionPolicy::start(empty_store(), source, ProviderId::Fixer, true).await;
    let (events_tx, events_rx) = mpsc::channel(8);
    let (views_tx, views_rx) = watch::channel(policy.view());
    let driver = tokio::spawn(run_policy(policy, events_rx, views_tx));

    // When: The user picks a pair, types an amount, then the network drops
    events_tx
        .send(PolicyEvent::PairChanged(Preference::new(Currency::Usd, Currency::Eur)))
        .await
        .expect("driver alive");
    events_tx
        .send(PolicyEvent::AmountChanged(100.0))
        .await
        .expect("driver alive");
    events_tx
        .send(PolicyEvent::Connectivity(false))
        .await
        .expect("driver alive");
    drop(events_tx);
    let policy = driver.await.expect("driver finished");

    // Then: The final view reflects every event in order
    let view = views_rx.borrow().clone();
    assert_eq!(view.state, PolicyState::OfflineValidCache);
    assert!(!view.connected);
    assert_close(view.converted, 85.0);
    assert_eq!(view, policy.view());
}

#[tokio::test]
async fn when_negative_amount_is_sent_driver_keeps_previous_value() {
    // Given: A driver with 100 USD -> EUR converted
    let source = FixedSource::serving(usd_table(UtcDateTime::now()));
    let mut policy = ConversionPolicy::start(empty_store(), source, ProviderId::Fixer, true).await;
    policy.set_pair(Preference::new(Currency::Usd, Currency::Eur));
    policy.set_amount(100.0).expect("valid amount");
    let (events_tx, events_rx) = mpsc::channel(4);
    let (views_tx, _views_rx) = watch::channel(policy.view());
    let driver = tokio::spawn(run_policy(policy, events_rx, views_tx));

    // When: An invalid amount arrives
    events_tx
        .send(PolicyEvent::AmountChanged(-5.0))
        .await
        .expect("driver alive");
    drop(events_tx);
    let policy = driver.await.expect("driver finished");

    // Then: The event is rejected and the result is unchanged
    assert_close(policy.amount(), 100.0);
    assert_close(policy.converted(), 85.0);
}

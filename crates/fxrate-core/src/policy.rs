//! Cache/network decision policy and the conversion state it drives.
//!
//! The policy is a small state machine re-evaluated on every connectivity
//! transition and every explicit fetch:
//!
//! | State | Meaning |
//! |-------|---------|
//! | [`PolicyState::Online`] | connected; rates come from the last fetch or a valid cache |
//! | [`PolicyState::OfflineValidCache`] | offline or fetch failed; a valid cache is in use |
//! | [`PolicyState::OfflineStaleCache`] | offline and the cache has expired |
//! | [`PolicyState::Error`] | no live data and no valid cache |
//!
//! Mutations arrive as [`PolicyEvent`]s. [`run_policy`] owns the policy and
//! applies events strictly in arrival order, so at most one fetch is in
//! flight at any time.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::providers::{ProviderId, RateSource};
use crate::store::RateStore;
use crate::{
    convert, validate_amount, Currency, Preference, RateError, RateSnapshot, UtcDateTime,
    ValidationError,
};

/// Where the displayed rates come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum PolicyState {
    Online,
    OfflineValidCache,
    OfflineStaleCache,
    Error(String),
}

impl PolicyState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::OfflineValidCache => "offline_valid_cache",
            Self::OfflineStaleCache => "offline_stale_cache",
            Self::Error(_) => "error",
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Inputs the policy reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyEvent {
    Connectivity(bool),
    FetchRequested,
    AmountChanged(f64),
    PairChanged(Preference),
    Swap,
}

/// Read-only projection of the policy for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyView {
    pub state: PolicyState,
    pub connected: bool,
    pub provider: ProviderId,
    pub from: Currency,
    pub to: Currency,
    pub amount: f64,
    pub converted: f64,
    pub base: Option<Currency>,
    pub fetched_at: Option<UtcDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Coordinates connectivity, cache freshness, and fetches, and keeps the
/// converted amount current.
pub struct ConversionPolicy {
    store: RateStore,
    source: Arc<dyn RateSource>,
    provider: ProviderId,
    connected: bool,
    state: PolicyState,
    snapshot: Option<RateSnapshot>,
    preference: Preference,
    amount: f64,
    converted: f64,
}

impl ConversionPolicy {
    /// Build a policy and resolve its initial state.
    ///
    /// A valid cache is used as-is whether or not we are connected; without
    /// one, a connected start fetches and a disconnected start is an error.
    pub async fn start(
        store: RateStore,
        source: Arc<dyn RateSource>,
        provider: ProviderId,
        connected: bool,
    ) -> Self {
        let preference = store.load_preference().unwrap_or_default();
        let mut policy = Self {
            store,
            source,
            provider,
            connected,
            state: PolicyState::Error(RateError::no_connection().message().to_owned()),
            snapshot: None,
            preference,
            amount: 0.0,
            converted: 0.0,
        };

        match policy.store.load() {
            Some(snapshot) => {
                policy.snapshot = Some(snapshot);
                policy.state = if connected {
                    PolicyState::Online
                } else {
                    PolicyState::OfflineValidCache
                };
                policy.recompute();
            }
            None if connected => {
                policy.fetch().await;
            }
            None => {
                tracing::info!("starting offline without a valid cache");
            }
        }

        tracing::info!(state = policy.state.label(), connected, "conversion policy started");
        policy
    }

    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.snapshot.as_ref()
    }

    pub const fn preference(&self) -> Preference {
        self.preference
    }

    pub const fn amount(&self) -> f64 {
        self.amount
    }

    pub const fn converted(&self) -> f64 {
        self.converted
    }

    /// Explicit refresh.
    ///
    /// Fetch errors are masked by a valid cache; only when neither live nor
    /// cached data exists does the state become [`PolicyState::Error`].
    pub async fn fetch(&mut self) -> &PolicyState {
        if !self.connected {
            self.fall_back_to_cache(RateError::no_connection());
            self.recompute();
            return &self.state;
        }

        match self.source.fetch(self.provider).await {
            Ok(snapshot) => {
                if let Err(error) = self.store.save(&snapshot) {
                    tracing::warn!(%error, "failed to cache fetched rates");
                }
                self.snapshot = Some(snapshot);
                self.transition(PolicyState::Online);
            }
            Err(error) => {
                tracing::warn!(provider = %self.provider, %error, "rate fetch failed");
                self.fall_back_to_cache(error);
            }
        }

        self.recompute();
        &self.state
    }

    /// React to a reachability change. Reconnecting does not fetch.
    pub fn on_connectivity_change(&mut self, connected: bool) {
        self.connected = connected;

        if connected {
            self.transition(PolicyState::Online);
        } else {
            match self.store.load() {
                Some(snapshot) => {
                    self.snapshot = Some(snapshot);
                    self.transition(PolicyState::OfflineValidCache);
                }
                None => self.transition(PolicyState::OfflineStaleCache),
            }
        }

        self.recompute();
    }

    pub fn set_amount(&mut self, amount: f64) -> Result<(), ValidationError> {
        self.amount = validate_amount(amount)?;
        self.recompute();
        Ok(())
    }

    /// Change the pair, persist it, and recompute.
    pub fn set_pair(&mut self, preference: Preference) {
        self.preference = preference;
        self.persist_preference();
        self.recompute();
    }

    /// Exchange source and target currencies. The rate table is untouched.
    pub fn swap(&mut self) {
        self.set_pair(self.preference.swapped());
    }

    pub async fn handle(&mut self, event: PolicyEvent) -> Result<(), ValidationError> {
        match event {
            PolicyEvent::Connectivity(connected) => self.on_connectivity_change(connected),
            PolicyEvent::FetchRequested => {
                self.fetch().await;
            }
            PolicyEvent::AmountChanged(amount) => self.set_amount(amount)?,
            PolicyEvent::PairChanged(preference) => self.set_pair(preference),
            PolicyEvent::Swap => self.swap(),
        }
        Ok(())
    }

    pub fn view(&self) -> PolicyView {
        let warning = match &self.state {
            PolicyState::Online => None,
            PolicyState::OfflineValidCache => Some(match &self.snapshot {
                Some(snapshot) => format!(
                    "showing cached rates fetched at {}",
                    snapshot.fetched_at()
                ),
                None => String::from("showing cached rates"),
            }),
            PolicyState::OfflineStaleCache => {
                Some(String::from("offline and cached rates have expired; values may be out of date"))
            }
            PolicyState::Error(_) => Some(String::from("no rates available; retry the fetch once connected")),
        };

        PolicyView {
            state: self.state.clone(),
            connected: self.connected,
            provider: self.provider,
            from: self.preference.from,
            to: self.preference.to,
            amount: self.amount,
            converted: self.converted,
            base: self.snapshot.as_ref().map(RateSnapshot::base),
            fetched_at: self.snapshot.as_ref().map(RateSnapshot::fetched_at),
            warning,
        }
    }

    fn fall_back_to_cache(&mut self, error: RateError) {
        match self.store.load() {
            Some(snapshot) => {
                self.snapshot = Some(snapshot);
                self.transition(PolicyState::OfflineValidCache);
            }
            None => self.transition(PolicyState::Error(error.message().to_owned())),
        }
    }

    fn transition(&mut self, next: PolicyState) {
        if self.state != next {
            tracing::info!(from = self.state.label(), to = next.label(), "policy state changed");
        }
        self.state = next;
    }

    fn persist_preference(&self) {
        if let Err(error) = self
            .store
            .save_preference(self.preference.from, self.preference.to)
        {
            tracing::warn!(%error, "failed to persist currency preference");
        }
    }

    // Error freezes the converted value. A missing rate for either side also
    // leaves the previous value in place rather than zeroing it.
    fn recompute(&mut self) {
        if self.state.is_error() {
            return;
        }

        let Some(snapshot) = &self.snapshot else {
            self.converted = 0.0;
            return;
        };

        let Preference { from, to } = self.preference;
        match convert(self.amount, from, to, snapshot) {
            Some(converted) => self.converted = converted,
            None => tracing::debug!(%from, %to, "no rate for pair; keeping previous value"),
        }
    }
}

/// Drive `policy` from `events`, publishing a fresh view after each one.
///
/// Returns the policy once every event sender has been dropped.
pub async fn run_policy(
    mut policy: ConversionPolicy,
    mut events: mpsc::Receiver<PolicyEvent>,
    views: watch::Sender<PolicyView>,
) -> ConversionPolicy {
    views.send_replace(policy.view());

    while let Some(event) = events.recv().await {
        if let Err(error) = policy.handle(event).await {
            tracing::warn!(%error, "rejected policy event");
        }
        views.send_replace(policy.view());
    }

    policy
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use time::Duration;

    use super::*;
    use crate::store::MemoryKeyValueStore;

    struct ScriptedSource {
        results: Mutex<VecDeque<Result<RateSnapshot, RateError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(results: Vec<Result<RateSnapshot, RateError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RateSource for ScriptedSource {
        fn fetch<'a>(
            &'a self,
            _provider: ProviderId,
        ) -> Pin<Box<dyn Future<Output = Result<RateSnapshot, RateError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .results
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Err(RateError::transport("script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn usd_snapshot(age: Duration) -> RateSnapshot {
        let rates = BTreeMap::from([(Currency::Eur, 0.85), (Currency::Gbp, 0.73)]);
        RateSnapshot::new(Currency::Usd, rates, UtcDateTime::now() - age).expect("valid")
    }

    fn empty_store() -> RateStore {
        RateStore::new(Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn connected_start_without_cache_fetches_and_caches() {
        let store = empty_store();
        let source = ScriptedSource::new(vec![Ok(usd_snapshot(Duration::ZERO))]);

        let policy =
            ConversionPolicy::start(store.clone(), source.clone(), ProviderId::Fixer, true).await;

        assert_eq!(policy.state(), &PolicyState::Online);
        assert_eq!(source.calls(), 1);
        assert!(store.load().is_some());
    }

    #[tokio::test]
    async fn valid_cache_skips_the_network_at_start() {
        let store = empty_store();
        store.save(&usd_snapshot(Duration::hours(1))).expect("seed");
        let source = ScriptedSource::new(vec![]);

        let policy = ConversionPolicy::start(store, source.clone(), ProviderId::Fixer, true).await;

        assert_eq!(policy.state(), &PolicyState::Online);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn failed_fetch_without_cache_surfaces_the_error() {
        let source = ScriptedSource::new(vec![Err(RateError::invalid_response(
            "fixer returned status 500",
        ))]);

        let policy =
            ConversionPolicy::start(empty_store(), source, ProviderId::Fixer, true).await;

        assert_eq!(
            policy.state(),
            &PolicyState::Error(String::from("fixer returned status 500"))
        );
    }

    #[tokio::test]
    async fn reconnecting_goes_online_without_fetching() {
        let source = ScriptedSource::new(vec![]);
        let mut policy =
            ConversionPolicy::start(empty_store(), source.clone(), ProviderId::Fixer, false).await;
        assert!(policy.state().is_error());

        policy.on_connectivity_change(true);

        assert_eq!(policy.state(), &PolicyState::Online);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn missing_target_rate_keeps_previous_value() {
        let store = empty_store();
        store.save(&usd_snapshot(Duration::hours(1))).expect("seed");
        let mut policy =
            ConversionPolicy::start(store, ScriptedSource::new(vec![]), ProviderId::Fixer, true)
                .await;

        policy.set_amount(100.0).expect("valid amount");
        assert!((policy.converted() - 85.0).abs() < 1e-9);

        policy.set_pair(Preference::new(Currency::Usd, Currency::Jpy));
        assert!((policy.converted() - 85.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn run_policy_applies_events_in_order() {
        let store = empty_store();
        store.save(&usd_snapshot(Duration::hours(1))).expect("seed");
        let policy =
            ConversionPolicy::start(store, ScriptedSource::new(vec![]), ProviderId::Fixer, true)
                .await;

        let (events_tx, events_rx) = mpsc::channel(8);
        let (views_tx, views_rx) = watch::channel(policy.view());
        let driver = tokio::spawn(run_policy(policy, events_rx, views_tx));

        events_tx.send(PolicyEvent::AmountChanged(10.0)).await.expect("send");
        events_tx.send(PolicyEvent::Swap).await.expect("send");
        events_tx.send(PolicyEvent::Connectivity(false)).await.expect("send");
        drop(events_tx);

        let policy = driver.await.expect("driver joins");
        let view = views_rx.borrow().clone();

        assert_eq!(view.from, Currency::Eur);
        assert_eq!(view.to, Currency::Usd);
        assert_eq!(view.state, PolicyState::OfflineValidCache);
        assert!((view.converted - 10.0 / 0.85).abs() < 1e-9);
        assert_eq!(policy.amount(), 10.0);
    }
}

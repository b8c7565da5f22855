use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::store::{KeyValueStore, StoreError};
use crate::{
    CachedSnapshot, Currency, Preference, RateError, RateSnapshot, UtcDateTime, DEFAULT_CACHE_TTL,
};

pub const SNAPSHOT_KEY: &str = "rates.snapshot";
pub const PREFERENCE_KEY: &str = "preference.pair";

// Codes stay raw strings on disk so one bad code can be detected and the whole
// pair discarded instead of failing the deserializer half-way.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    from: String,
    to: String,
}

/// Cache for the last fetched snapshot and the user's currency pair.
#[derive(Clone)]
pub struct RateStore {
    backend: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl RateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(backend, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(backend: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stamp `snapshot` with its expiry and overwrite the stored entry.
    pub fn save(&self, snapshot: &RateSnapshot) -> Result<CachedSnapshot, StoreError> {
        let cached = CachedSnapshot::new(snapshot.clone(), self.ttl).map_err(StoreError::Expiry)?;
        let body = serde_json::to_string(&cached).map_err(|source| StoreError::Serialization {
            key: SNAPSHOT_KEY,
            source,
        })?;
        self.backend.set(SNAPSHOT_KEY, body)?;
        tracing::debug!(expires_at = %cached.expires_at, "cached rate snapshot");
        Ok(cached)
    }

    /// The stored snapshot if present, readable and not yet expired.
    pub fn load(&self) -> Option<RateSnapshot> {
        self.load_checked().ok()
    }

    /// Like [`load`](Self::load) but reports why nothing usable was found.
    pub fn load_checked(&self) -> Result<RateSnapshot, RateError> {
        self.load_checked_at(UtcDateTime::now())
    }

    pub fn load_checked_at(&self, now: UtcDateTime) -> Result<RateSnapshot, RateError> {
        let cached = self.read_cached()?;
        if !cached.is_valid(now) {
            return Err(RateError::expired(format!(
                "cached rates expired at {}",
                cached.expires_at
            )));
        }
        Ok(cached.snapshot)
    }

    /// The stored entry regardless of expiry.
    pub fn peek(&self) -> Option<CachedSnapshot> {
        self.read_cached().ok()
    }

    pub fn save_preference(&self, from: Currency, to: Currency) -> Result<(), StoreError> {
        let stored = StoredPreference {
            from: from.code().to_owned(),
            to: to.code().to_owned(),
        };
        let body = serde_json::to_string(&stored).map_err(|source| StoreError::Serialization {
            key: PREFERENCE_KEY,
            source,
        })?;
        self.backend.set(PREFERENCE_KEY, body)
    }

    /// The stored pair, or `None` when missing or when either code is unknown.
    pub fn load_preference(&self) -> Option<Preference> {
        let body = match self.backend.get(PREFERENCE_KEY) {
            Ok(body) => body?,
            Err(error) => {
                tracing::warn!(%error, "failed to read stored preference");
                return None;
            }
        };

        let stored: StoredPreference = serde_json::from_str(&body).ok()?;
        match (Currency::parse(&stored.from), Currency::parse(&stored.to)) {
            (Ok(from), Ok(to)) => Some(Preference::new(from, to)),
            _ => {
                tracing::debug!(from = %stored.from, to = %stored.to, "ignoring unparseable preference");
                None
            }
        }
    }

    fn read_cached(&self) -> Result<CachedSnapshot, RateError> {
        let body = self
            .backend
            .get(SNAPSHOT_KEY)
            .map_err(|e| RateError::invalid_data(format!("failed to read cached rates: {e}")))?
            .ok_or_else(|| RateError::no_data("no cached rates"))?;

        serde_json::from_str(&body)
            .map_err(|e| RateError::invalid_data(format!("cached rates are unreadable: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::store::MemoryKeyValueStore;
    use crate::RateErrorKind;

    fn snapshot_fetched(ago: Duration) -> RateSnapshot {
        let rates = BTreeMap::from([(Currency::Eur, 0.85), (Currency::Gbp, 0.73)]);
        RateSnapshot::new(Currency::Usd, rates, UtcDateTime::now() - ago).expect("valid snapshot")
    }

    #[test]
    fn fresh_snapshot_round_trips() {
        let store = RateStore::new(Arc::new(MemoryKeyValueStore::new()));
        let snapshot = snapshot_fetched(Duration::hours(1));

        store.save(&snapshot).expect("save");
        assert_eq!(store.load(), Some(snapshot));
    }

    #[test]
    fn snapshot_older_than_a_day_is_expired() {
        let store = RateStore::new(Arc::new(MemoryKeyValueStore::new()));
        store.save(&snapshot_fetched(Duration::hours(25))).expect("save");

        assert_eq!(store.load(), None);
        let error = store.load_checked().expect_err("must be expired");
        assert_eq!(error.kind(), RateErrorKind::Expired);
        assert!(store.peek().is_some(), "expired entry is still on disk");
    }

    #[test]
    fn corrupt_entry_is_absent() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set(SNAPSHOT_KEY, String::from("{\"snapshot\":42}"))
            .expect("seed");
        let store = RateStore::new(backend);

        let error = store.load_checked().expect_err("must fail");
        assert_eq!(error.kind(), RateErrorKind::InvalidData);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn preference_with_one_bad_code_is_absent() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set(PREFERENCE_KEY, String::from(r#"{"from":"EUR","to":"ZZZ"}"#))
            .expect("seed");

        assert_eq!(RateStore::new(backend).load_preference(), None);
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{Currency, UtcDateTime, ValidationError};

/// Default lifetime of a cached rate table.
pub const DEFAULT_CACHE_TTL: Duration = Duration::hours(24);

/// One fetched set of exchange rates, all expressed against `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRateSnapshot")]
pub struct RateSnapshot {
    base: Currency,
    rates: BTreeMap<Currency, f64>,
    fetched_at: UtcDateTime,
}

impl RateSnapshot {
    pub fn new(
        base: Currency,
        rates: BTreeMap<Currency, f64>,
        fetched_at: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        for (currency, rate) in &rates {
            validate_rate(*currency, *rate)?;
        }

        Ok(Self {
            base,
            rates,
            fetched_at,
        })
    }

    pub const fn base(&self) -> Currency {
        self.base
    }

    pub fn rates(&self) -> &BTreeMap<Currency, f64> {
        &self.rates
    }

    pub const fn fetched_at(&self) -> UtcDateTime {
        self.fetched_at
    }

    /// Rate of `currency` relative to the base. The base itself is 1.0 even
    /// when the provider left it out of the table.
    pub fn rate(&self, currency: Currency) -> Option<f64> {
        match self.rates.get(&currency) {
            Some(rate) => Some(*rate),
            None if currency == self.base => Some(1.0),
            None => None,
        }
    }
}

#[derive(Deserialize)]
struct RawRateSnapshot {
    base: Currency,
    rates: BTreeMap<Currency, f64>,
    fetched_at: UtcDateTime,
}

impl TryFrom<RawRateSnapshot> for RateSnapshot {
    type Error = ValidationError;

    fn try_from(raw: RawRateSnapshot) -> Result<Self, Self::Error> {
        Self::new(raw.base, raw.rates, raw.fetched_at)
    }
}

/// A snapshot as persisted, with its expiry stamped at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub snapshot: RateSnapshot,
    pub expires_at: UtcDateTime,
}

impl CachedSnapshot {
    pub fn new(snapshot: RateSnapshot, ttl: Duration) -> Result<Self, ValidationError> {
        let expires_at = snapshot
            .fetched_at()
            .checked_add(ttl)
            .ok_or(ValidationError::TtlOutOfRange {
                hours: ttl.whole_hours(),
            })?;
        Ok(Self {
            snapshot,
            expires_at,
        })
    }

    pub fn is_valid(&self, now: UtcDateTime) -> bool {
        now < self.expires_at
    }
}

/// The user's currency pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub from: Currency,
    pub to: Currency,
}

impl Preference {
    pub const fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    pub const fn swapped(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl Default for Preference {
    fn default() -> Self {
        Self::new(Currency::Usd, Currency::Eur)
    }
}

/// Convert `amount` of `from` into `to` using the snapshot's table.
///
/// A zero amount converts to zero regardless of the table. Returns `None`
/// when either side has no rate.
pub fn convert(amount: f64, from: Currency, to: Currency, snapshot: &RateSnapshot) -> Option<f64> {
    if amount == 0.0 {
        return Some(0.0);
    }

    let from_rate = snapshot.rate(from)?;
    let to_rate = snapshot.rate(to)?;
    Some((amount / from_rate) * to_rate)
}

/// Amounts entered by the user must be finite and non-negative.
pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "amount" });
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeValue { field: "amount" });
    }
    Ok(amount)
}

fn validate_rate(currency: Currency, rate: f64) -> Result<(), ValidationError> {
    if !rate.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "rate" });
    }
    if rate <= 0.0 {
        return Err(ValidationError::NonPositiveRate {
            code: currency.code(),
        });
    }
    Ok(())
}

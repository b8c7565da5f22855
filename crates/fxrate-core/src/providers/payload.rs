use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{Currency, RateError, RateSnapshot, UtcDateTime};

/// Base assumed when a provider names a base currency we do not know.
const FALLBACK_BASE: Currency = Currency::Usd;

// Shape shared by Open Exchange Rates and Fixer. Error bodies reuse the same
// object with `rates` missing and an `error`/`description` field instead.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

impl LatestRatesResponse {
    fn error_text(&self) -> Option<String> {
        if let Some(description) = &self.description {
            return Some(description.clone());
        }
        match self.error.as_ref()? {
            Value::Object(fields) => fields
                .get("info")
                .or_else(|| fields.get("type"))
                .and_then(Value::as_str)
                .map(str::to_owned),
            Value::String(message) => Some(message.clone()),
            _ => None,
        }
    }
}

/// Decode a provider body into a snapshot stamped with `fetched_at`.
///
/// Codes outside [`Currency::ALL`] and non-positive rates are dropped; an
/// unknown or missing base falls back to USD.
pub fn decode_rates(body: &str, fetched_at: UtcDateTime) -> Result<RateSnapshot, RateError> {
    if body.trim().is_empty() {
        return Err(RateError::no_data("provider returned an empty body"));
    }

    let response: LatestRatesResponse = serde_json::from_str(body)
        .map_err(|e| RateError::invalid_data(format!("failed to decode rates body: {e}")))?;

    let Some(raw_rates) = response.rates.as_ref() else {
        let reason = response
            .error_text()
            .unwrap_or_else(|| String::from("body has no 'rates' object"));
        return Err(RateError::invalid_data(format!(
            "provider returned no rates: {reason}"
        )));
    };

    let base = match response.base.as_deref().map(Currency::parse) {
        Some(Ok(base)) => base,
        Some(Err(error)) => {
            tracing::warn!(%error, fallback = %FALLBACK_BASE, "unknown base currency in rates body");
            FALLBACK_BASE
        }
        None => {
            tracing::warn!(fallback = %FALLBACK_BASE, "rates body has no base currency");
            FALLBACK_BASE
        }
    };

    let mut rates = BTreeMap::new();
    let mut dropped = 0_usize;
    for (code, rate) in raw_rates {
        match Currency::parse(code) {
            Ok(currency) if rate.is_finite() && *rate > 0.0 => {
                rates.insert(currency, *rate);
            }
            Ok(_) => {
                tracing::debug!(code = %code, rate, "dropping non-positive rate");
                dropped += 1;
            }
            Err(_) => {
                tracing::debug!(code = %code, "dropping unrecognized currency code");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(kept = rates.len(), dropped, "filtered provider rate table");
    }

    RateSnapshot::new(base, rates, fetched_at).map_err(RateError::from)
}

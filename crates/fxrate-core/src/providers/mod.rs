//! Exchange-rate providers and the fetch contract the policy depends on.
//!
//! | Provider | Endpoint | Key parameter |
//! |----------|----------|---------------|
//! | [`ProviderId::OpenExchangeRates`] | `openexchangerates.org/api/latest.json` | `app_id` |
//! | [`ProviderId::Fixer`] | `data.fixer.io/api/latest` | `access_key` |
//!
//! Both answer with a flat JSON object carrying a `base` code and a `rates`
//! object; [`payload::decode_rates`] turns either into a [`RateSnapshot`].

mod fetcher;
mod payload;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{RateError, RateSnapshot, ValidationError};

pub use fetcher::NetworkFetcher;
pub use payload::decode_rates;

/// The two interchangeable rate providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    OpenExchangeRates,
    Fixer,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::OpenExchangeRates, Self::Fixer];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenExchangeRates => "open_exchange_rates",
            Self::Fixer => "fixer",
        }
    }

    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::OpenExchangeRates => "https://openexchangerates.org/api/latest.json",
            Self::Fixer => "https://data.fixer.io/api/latest",
        }
    }

    /// Query parameter that carries the API key.
    pub const fn key_param(self) -> &'static str {
        match self {
            Self::OpenExchangeRates => "app_id",
            Self::Fixer => "access_key",
        }
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::OpenExchangeRates
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "open_exchange_rates" | "openexchangerates" | "oxr" => Ok(Self::OpenExchangeRates),
            "fixer" => Ok(Self::Fixer),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}

/// Endpoint and credential for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccess {
    pub base_url: String,
    pub api_key: String,
}

impl ProviderAccess {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_default_endpoint(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self::new(provider.default_endpoint(), api_key)
    }
}

/// Access settings for both providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccessSet {
    pub open_exchange_rates: ProviderAccess,
    pub fixer: ProviderAccess,
}

impl ProviderAccessSet {
    pub fn get(&self, provider: ProviderId) -> &ProviderAccess {
        match provider {
            ProviderId::OpenExchangeRates => &self.open_exchange_rates,
            ProviderId::Fixer => &self.fixer,
        }
    }
}

/// Source of fresh rate snapshots.
///
/// One call issues at most one upstream request. Implementations must be
/// `Send + Sync`; the policy holds them behind an `Arc`.
pub trait RateSource: Send + Sync {
    /// Fetches the latest table from `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`RateError`] with a kind describing where the fetch broke:
    /// URL construction, transport, HTTP status, or body decoding.
    fn fetch<'a>(
        &'a self,
        provider: ProviderId,
    ) -> Pin<Box<dyn Future<Output = Result<RateSnapshot, RateError>> + Send + 'a>>;
}

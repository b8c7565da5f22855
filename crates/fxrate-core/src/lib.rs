//! # fxrate Core
//!
//! Rate fetching, caching, and the conversion policy behind the `fxrate` CLI.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Settings file and environment overrides |
//! | [`connectivity`] | Reachability monitor and TCP probe |
//! | [`domain`] | Currency, rate snapshot, preference, timestamps |
//! | [`error`] | Validation and rate error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`policy`] | Cache/network decision state machine and conversion |
//! | [`providers`] | Open Exchange Rates and Fixer fetching and decoding |
//! | [`store`] | Key-value persistence for rates and the currency pair |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────────┐
//! │  CLI / User     │────▶│ ConnectivityMonitor  │
//! └────────┬────────┘     └──────────┬───────────┘
//!          │ PolicyEvent             │ Connectivity(bool)
//!          ▼                         ▼
//! ┌──────────────────────────────────────────────┐
//! │ ConversionPolicy                             │
//! └────────┬──────────────────────────┬──────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌─────────────────┐     ┌──────────────────────┐
//! │ RateSource      │     │ RateStore            │
//! │ (NetworkFetcher)│     │ (KeyValueStore)      │
//! └────────┬────────┘     └──────────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ HttpClient      │
//! └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxrate_core::{
//!     ConversionPolicy, FileKeyValueStore, NetworkFetcher, ProviderId, RateStore,
//!     ReqwestHttpClient, AppConfig,
//! };
//!
//! let config = AppConfig::load()?;
//! let store = RateStore::with_ttl(Arc::new(FileKeyValueStore::new(&config.store_path)), config.cache_ttl);
//! let fetcher = NetworkFetcher::new(Arc::new(ReqwestHttpClient::new()), config.providers.clone());
//! let connected = config.probe().probe_once().await;
//!
//! let mut policy = ConversionPolicy::start(store, Arc::new(fetcher), config.default_provider, connected).await;
//! policy.set_amount(100.0)?;
//! println!("{} {}", policy.converted(), policy.preference().to);
//! ```
//!
//! ## Security
//!
//! API keys travel only in request query strings; error messages and logs
//! strip query strings before rendering URLs.

pub mod config;
pub mod connectivity;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod policy;
pub mod providers;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use connectivity::{ConnectivityMonitor, ReachabilityProbe};
pub use domain::{
    convert, validate_amount, CachedSnapshot, Currency, Preference, RateSnapshot, UtcDateTime,
    DEFAULT_CACHE_TTL,
};
pub use error::{RateError, RateErrorKind, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
};
pub use policy::{run_policy, ConversionPolicy, PolicyEvent, PolicyState, PolicyView};
pub use providers::{
    decode_rates, NetworkFetcher, ProviderAccess, ProviderAccessSet, ProviderId, RateSource,
};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, RateStore, StoreError};

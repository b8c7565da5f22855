//! Settings file loading.
//!
//! Settings live in `<config_dir>/fxrate/config.toml`. Both provider API keys
//! are required; environment variables override the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `FXRATE_OPENEXCHANGERATES_API_KEY` | `api_keys.open_exchange_rates` |
//! | `FXRATE_FIXER_API_KEY` | `api_keys.fixer` |

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::connectivity::ReachabilityProbe;
use crate::providers::{ProviderAccess, ProviderAccessSet, ProviderId};
use crate::store::FileKeyValueStore;

pub const OPEN_EXCHANGE_RATES_KEY_ENV: &str = "FXRATE_OPENEXCHANGERATES_API_KEY";
pub const FIXER_KEY_ENV: &str = "FXRATE_FIXER_API_KEY";

/// Longest accepted cache lifetime: one leap year.
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 366;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{path}' not found; create it with an [api_keys] table")]
    NotFound { path: PathBuf },

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing API key for {provider} (set api_keys.{provider} or {env})")]
    MissingApiKey {
        provider: ProviderId,
        env: &'static str,
    },

    #[error("config validation failed: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    api_keys: RawProviderStrings,
    endpoints: RawProviderStrings,
    defaults: RawDefaults,
    cache: RawCache,
    connectivity: RawConnectivity,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawProviderStrings {
    open_exchange_rates: Option<String>,
    fixer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawDefaults {
    provider: Option<ProviderId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawCache {
    path: Option<PathBuf>,
    ttl_hours: i64,
}

impl Default for RawCache {
    fn default() -> Self {
        Self {
            path: None,
            ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawConnectivity {
    probe_addr: String,
    probe_timeout_ms: u64,
    probe_interval_ms: u64,
}

impl Default for RawConnectivity {
    fn default() -> Self {
        Self {
            probe_addr: String::from("1.1.1.1:53"),
            probe_timeout_ms: 1_500,
            probe_interval_ms: 5_000,
        }
    }
}

/// Validated application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub providers: ProviderAccessSet,
    pub default_provider: ProviderId,
    pub store_path: PathBuf,
    pub cache_ttl: time::Duration,
    pub probe_addr: String,
    pub probe_timeout: Duration,
    pub probe_interval: Duration,
}

impl AppConfig {
    /// `<config_dir>/fxrate/config.toml`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("fxrate").join("config.toml")
    }

    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load and validate `path`, applying environment overrides.
    ///
    /// A missing file is an error: the API keys have no usable default.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content, path, |name| std::env::var(name).ok())
    }

    /// Settings for `--mock` runs: placeholder keys, real defaults otherwise.
    pub fn mock() -> Self {
        let raw = RawConfig::default();
        Self {
            providers: ProviderAccessSet {
                open_exchange_rates: ProviderAccess::with_default_endpoint(
                    ProviderId::OpenExchangeRates,
                    "mock",
                ),
                fixer: ProviderAccess::with_default_endpoint(ProviderId::Fixer, "mock"),
            },
            default_provider: ProviderId::default(),
            store_path: FileKeyValueStore::default_path(),
            cache_ttl: time::Duration::hours(raw.cache.ttl_hours),
            probe_addr: raw.connectivity.probe_addr,
            probe_timeout: Duration::from_millis(raw.connectivity.probe_timeout_ms),
            probe_interval: Duration::from_millis(raw.connectivity.probe_interval_ms),
        }
    }

    pub fn probe(&self) -> ReachabilityProbe {
        ReachabilityProbe::new(
            self.probe_addr.clone(),
            self.probe_timeout,
            self.probe_interval,
        )
    }

    fn from_toml_str(
        content: &str,
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let open_exchange_rates_key = resolve_key(
            ProviderId::OpenExchangeRates,
            OPEN_EXCHANGE_RATES_KEY_ENV,
            raw.api_keys.open_exchange_rates,
            &env,
        )?;
        let fixer_key = resolve_key(ProviderId::Fixer, FIXER_KEY_ENV, raw.api_keys.fixer, &env)?;

        if !(1..=MAX_CACHE_TTL_HOURS).contains(&raw.cache.ttl_hours) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "cache.ttl_hours must be between 1 and {MAX_CACHE_TTL_HOURS}, got {}",
                    raw.cache.ttl_hours
                ),
            });
        }
        if raw.connectivity.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                message: String::from("connectivity.probe_timeout_ms must be positive"),
            });
        }
        if raw.connectivity.probe_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: String::from("connectivity.probe_interval_ms must be positive"),
            });
        }
        if raw.connectivity.probe_addr.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: String::from("connectivity.probe_addr must not be empty"),
            });
        }

        let endpoint = |provider: ProviderId, configured: Option<String>| {
            configured.unwrap_or_else(|| provider.default_endpoint().to_owned())
        };

        Ok(Self {
            providers: ProviderAccessSet {
                open_exchange_rates: ProviderAccess::new(
                    endpoint(
                        ProviderId::OpenExchangeRates,
                        raw.endpoints.open_exchange_rates,
                    ),
                    open_exchange_rates_key,
                ),
                fixer: ProviderAccess::new(
                    endpoint(ProviderId::Fixer, raw.endpoints.fixer),
                    fixer_key,
                ),
            },
            default_provider: raw.defaults.provider.unwrap_or_default(),
            store_path: raw
                .cache
                .path
                .unwrap_or_else(FileKeyValueStore::default_path),
            cache_ttl: time::Duration::hours(raw.cache.ttl_hours),
            probe_addr: raw.connectivity.probe_addr,
            probe_timeout: Duration::from_millis(raw.connectivity.probe_timeout_ms),
            probe_interval: Duration::from_millis(raw.connectivity.probe_interval_ms),
        })
    }
}

fn resolve_key(
    provider: ProviderId,
    env_name: &'static str,
    from_file: Option<String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    env(env_name)
        .or(from_file)
        .map(|key| key.trim().to_owned())
        .filter(|key| !key.is_empty())
        .ok_or(ConfigError::MissingApiKey {
            provider,
            env: env_name,
        })
}

mod cache;
mod convert;
mod currencies;
mod fetch;
mod pair;
mod rates;
mod watch;

use std::sync::Arc;

use fxrate_core::{
    AppConfig, ConversionPolicy, Currency, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    NetworkFetcher, PolicyView, ProviderId, RateSource, RateStore, ReqwestHttpClient,
    StaticHttpClient,
};

use crate::cli::{Cli, Command, ProviderSelector};
use crate::error::CliError;
use crate::output;

/// Canned USD table served by `--mock`.
const MOCK_RATES: &str = r#"{
  "base": "USD",
  "rates": {
    "USD": 1.0, "EUR": 0.85, "GBP": 0.73, "JPY": 149.2, "CHF": 0.88,
    "CAD": 1.36, "AUD": 1.52, "SEK": 10.61, "PLN": 3.98, "INR": 83.1
  }
}"#;

/// Services shared by every command.
pub struct Context {
    pub store: RateStore,
    pub source: Arc<dyn RateSource>,
    pub provider: ProviderId,
    pub config: AppConfig,
    pub connected: bool,
    pub pretty: bool,
}

impl Context {
    async fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let config = if cli.mock {
            AppConfig::mock()
        } else {
            match &cli.config {
                Some(path) => AppConfig::load_from(path)?,
                None => AppConfig::load()?,
            }
        };

        let backend: Arc<dyn KeyValueStore> = match (&cli.store, cli.mock) {
            (Some(path), _) => Arc::new(FileKeyValueStore::new(path)),
            (None, true) => Arc::new(MemoryKeyValueStore::new()),
            (None, false) => Arc::new(FileKeyValueStore::new(&config.store_path)),
        };
        let store = RateStore::with_ttl(backend, config.cache_ttl);

        let source: Arc<dyn RateSource> = if cli.mock {
            Arc::new(NetworkFetcher::new(
                Arc::new(StaticHttpClient::ok_json(MOCK_RATES)),
                config.providers.clone(),
            ))
        } else {
            Arc::new(NetworkFetcher::new(
                Arc::new(ReqwestHttpClient::new()),
                config.providers.clone(),
            ))
        };

        let provider = cli
            .provider
            .map(to_provider_id)
            .unwrap_or(config.default_provider);

        let connected = if cli.offline {
            false
        } else if cli.mock {
            true
        } else {
            config.probe().probe_once().await
        };
        tracing::debug!(connected, %provider, "resolved command context");

        Ok(Self {
            store,
            source,
            provider,
            config,
            connected,
            pretty: cli.pretty,
        })
    }

    async fn start_policy(&self) -> ConversionPolicy {
        ConversionPolicy::start(
            self.store.clone(),
            Arc::clone(&self.source),
            self.provider,
            self.connected,
        )
        .await
    }
}

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    // Listing currencies needs neither config nor network.
    if let Command::Currencies = cli.command {
        return currencies::run(cli.pretty);
    }

    let context = Context::from_cli(cli).await?;

    match &cli.command {
        Command::Convert(args) => convert::run(args, &context).await,
        Command::Fetch => fetch::run(&context).await,
        Command::Rates => rates::run(&context).await,
        Command::Swap(args) => pair::swap(args, &context).await,
        Command::Pair(args) => pair::set(args, &context),
        Command::Cache => cache::run(&context),
        Command::Watch => watch::run(cli, &context).await,
        Command::Currencies => currencies::run(cli.pretty),
    }
}

/// Print the view; an error state becomes a non-zero exit.
fn finish(view: &PolicyView, pretty: bool) -> Result<(), CliError> {
    output::render(view, pretty)?;
    match &view.state {
        fxrate_core::PolicyState::Error(message) => Err(CliError::NoRates {
            message: message.clone(),
        }),
        _ => Ok(()),
    }
}

fn parse_currency(raw: &str) -> Result<Currency, CliError> {
    Currency::parse(raw).map_err(CliError::from)
}

const fn to_provider_id(selector: ProviderSelector) -> ProviderId {
    match selector {
        ProviderSelector::OpenExchangeRates => ProviderId::OpenExchangeRates,
        ProviderSelector::Fixer => ProviderId::Fixer,
    }
}

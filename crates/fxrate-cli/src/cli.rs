//! CLI argument definitions for fxrate.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `convert` | Convert an amount with the current or given pair |
//! | `fetch` | Refresh rates from the provider |
//! | `rates` | Show the active rate table |
//! | `swap` | Swap the stored currency pair |
//! | `pair` | Store a new currency pair |
//! | `currencies` | List supported currencies |
//! | `cache` | Show the cached snapshot status |
//! | `watch` | Interactive mode: amounts from stdin, live connectivity |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--provider` | from config | Rate provider |
//! | `--offline` | `false` | Skip the reachability probe and act disconnected |
//! | `--mock` | `false` | Canned rates, in-memory store, no config needed |
//! | `--config` | `<config_dir>/fxrate/config.toml` | Settings file |
//! | `--store` | from config | Store file override |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! fxrate convert 100 --from usd --to eur
//! fxrate fetch --provider fixer --pretty
//! fxrate --offline rates
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Currency converter with a 24h offline rate cache.
#[derive(Debug, Parser)]
#[command(
    name = "fxrate",
    author,
    version,
    about = "Currency converter with a 24h offline rate cache",
    long_about = "fxrate converts amounts between currencies using rates from Open Exchange \
Rates or Fixer. The last fetched table is cached for 24 hours so conversions keep \
working offline.\n\
\n\
Use 'fxrate <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Rate provider to fetch from.
    #[arg(long, global = true, value_enum)]
    pub provider: Option<ProviderSelector>,

    /// Act as if the network were unreachable.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Use canned rates and an in-memory store; no config file needed.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Path to the settings file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the store file, overriding the settings file.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderSelector {
    /// openexchangerates.org
    OpenExchangeRates,
    /// fixer.io
    Fixer,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert an amount.
    ///
    /// Uses the stored pair unless --from/--to are given; a given pair is
    /// stored for next time.
    ///
    ///   fxrate convert 100
    ///   fxrate convert 12.5 --from gbp --to jpy
    Convert(ConvertArgs),

    /// Fetch fresh rates and cache them.
    Fetch,

    /// Show the rate table in use.
    Rates,

    /// Swap the stored from/to currencies.
    Swap(AmountArgs),

    /// Store a new currency pair.
    Pair(PairArgs),

    /// List supported currencies.
    Currencies,

    /// Show the cached snapshot and whether it is still valid.
    Cache,

    /// Read amounts from stdin and print a view after every change.
    ///
    /// Lines: a number sets the amount, `swap` swaps, `fetch` refreshes,
    /// `pair FROM TO` changes the pair, `online`/`offline` override the
    /// reachability probe until its next differing result, `quit` exits.
    Watch,
}

/// Arguments for the `convert` command.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Amount in the source currency.
    pub amount: f64,

    /// Source currency code.
    #[arg(long)]
    pub from: Option<String>,

    /// Target currency code.
    #[arg(long)]
    pub to: Option<String>,
}

/// Optional amount to convert after the command runs.
#[derive(Debug, Args)]
pub struct AmountArgs {
    /// Amount to convert with the resulting pair.
    #[arg(long, default_value_t = 1.0)]
    pub amount: f64,
}

/// Arguments for the `pair` command.
#[derive(Debug, Args)]
pub struct PairArgs {
    /// Source currency code.
    pub from: String,

    /// Target currency code.
    pub to: String,
}

use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] fxrate_core::ValidationError),

    #[error(transparent)]
    Config(#[from] fxrate_core::ConfigError),

    #[error(transparent)]
    Store(#[from] fxrate_core::StoreError),

    #[error("unrecognized input '{input}'; expected an amount, swap, fetch, pair FROM TO, online, offline, or quit")]
    UnknownInput { input: String },

    #[error("{message}; run 'fxrate fetch' to retry")]
    NoRates { message: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::UnknownInput { .. } => 2,
            Self::NoRates { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Config(_) => 5,
            Self::Store(_) => 6,
            Self::Io(_) => 10,
        }
    }
}

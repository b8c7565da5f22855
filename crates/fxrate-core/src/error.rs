use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Validation and contract errors exposed by `fxrate-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown currency code '{value}'")]
    InvalidCurrency { value: String },
    #[error("invalid provider '{value}', expected one of open_exchange_rates, fixer")]
    InvalidProvider { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("rate for {code} must be greater than zero")]
    NonPositiveRate { code: &'static str },
    #[error("cache lifetime of {hours}h puts the expiry out of range")]
    TtlOutOfRange { hours: i64 },
}

/// Rate acquisition error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateErrorKind {
    NoConnection,
    InvalidUrl,
    InvalidResponse,
    InvalidData,
    NoData,
    Transport,
    Expired,
    InvalidCurrency,
}

/// Structured error produced while fetching, decoding, or loading rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateError {
    kind: RateErrorKind,
    message: String,
}

impl RateError {
    pub fn no_connection() -> Self {
        Self {
            kind: RateErrorKind::NoConnection,
            message: String::from("no connection and no cache"),
        }
    }

    pub fn invalid_url(url: impl AsRef<str>) -> Self {
        Self {
            kind: RateErrorKind::InvalidUrl,
            message: format!("invalid provider url '{}'", redact_query(url.as_ref())),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: RateErrorKind::InvalidResponse,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self {
            kind: RateErrorKind::InvalidData,
            message: message.into(),
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: RateErrorKind::NoData,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: RateErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn expired(message: impl Into<String>) -> Self {
        Self {
            kind: RateErrorKind::Expired,
            message: message.into(),
        }
    }

    pub fn invalid_currency(message: impl Into<String>) -> Self {
        Self {
            kind: RateErrorKind::InvalidCurrency,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> RateErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            RateErrorKind::NoConnection => "rates.no_connection",
            RateErrorKind::InvalidUrl => "rates.invalid_url",
            RateErrorKind::InvalidResponse => "rates.invalid_response",
            RateErrorKind::InvalidData => "rates.invalid_data",
            RateErrorKind::NoData => "rates.no_data",
            RateErrorKind::Transport => "rates.transport",
            RateErrorKind::Expired => "rates.expired",
            RateErrorKind::InvalidCurrency => "rates.invalid_currency",
        }
    }
}

impl Display for RateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for RateError {}

impl From<ValidationError> for RateError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::InvalidCurrency { .. } => Self::invalid_currency(error.to_string()),
            other => Self::invalid_data(other.to_string()),
        }
    }
}

/// Strips the query string so API keys never reach error messages or logs.
pub(crate) fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(head, _)| head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_message_does_not_leak_api_key() {
        let error = RateError::invalid_url("ht!tp://rates.test/latest?app_id=secret");
        assert_eq!(error.kind(), RateErrorKind::InvalidUrl);
        assert!(!error.message().contains("secret"));
    }

    #[test]
    fn currency_validation_maps_to_invalid_currency_kind() {
        let error = RateError::from(ValidationError::InvalidCurrency {
            value: String::from("XYZ"),
        });
        assert_eq!(error.kind(), RateErrorKind::InvalidCurrency);
        assert_eq!(error.code(), "rates.invalid_currency");
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Closed set of ISO-4217 currencies the converter understands.
///
/// Codes outside this set are rejected at every parsing boundary; rate tables
/// drop them instead of carrying them around as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Chf,
    Cad,
    Aud,
    Nzd,
    Cny,
    Hkd,
    Sgd,
    Krw,
    Inr,
    Idr,
    Myr,
    Php,
    Thb,
    Sek,
    Nok,
    Dkk,
    Pln,
    Czk,
    Huf,
    Ron,
    Try,
    Ils,
    Aed,
    Sar,
    Zar,
    Brl,
    Mxn,
}

impl Currency {
    pub const ALL: [Self; 31] = [
        Self::Usd,
        Self::Eur,
        Self::Gbp,
        Self::Jpy,
        Self::Chf,
        Self::Cad,
        Self::Aud,
        Self::Nzd,
        Self::Cny,
        Self::Hkd,
        Self::Sgd,
        Self::Krw,
        Self::Inr,
        Self::Idr,
        Self::Myr,
        Self::Php,
        Self::Thb,
        Self::Sek,
        Self::Nok,
        Self::Dkk,
        Self::Pln,
        Self::Czk,
        Self::Huf,
        Self::Ron,
        Self::Try,
        Self::Ils,
        Self::Aed,
        Self::Sar,
        Self::Zar,
        Self::Brl,
        Self::Mxn,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Chf => "CHF",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Nzd => "NZD",
            Self::Cny => "CNY",
            Self::Hkd => "HKD",
            Self::Sgd => "SGD",
            Self::Krw => "KRW",
            Self::Inr => "INR",
            Self::Idr => "IDR",
            Self::Myr => "MYR",
            Self::Php => "PHP",
            Self::Thb => "THB",
            Self::Sek => "SEK",
            Self::Nok => "NOK",
            Self::Dkk => "DKK",
            Self::Pln => "PLN",
            Self::Czk => "CZK",
            Self::Huf => "HUF",
            Self::Ron => "RON",
            Self::Try => "TRY",
            Self::Ils => "ILS",
            Self::Aed => "AED",
            Self::Sar => "SAR",
            Self::Zar => "ZAR",
            Self::Brl => "BRL",
            Self::Mxn => "MXN",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Usd => "US Dollar",
            Self::Eur => "Euro",
            Self::Gbp => "British Pound",
            Self::Jpy => "Japanese Yen",
            Self::Chf => "Swiss Franc",
            Self::Cad => "Canadian Dollar",
            Self::Aud => "Australian Dollar",
            Self::Nzd => "New Zealand Dollar",
            Self::Cny => "Chinese Yuan",
            Self::Hkd => "Hong Kong Dollar",
            Self::Sgd => "Singapore Dollar",
            Self::Krw => "South Korean Won",
            Self::Inr => "Indian Rupee",
            Self::Idr => "Indonesian Rupiah",
            Self::Myr => "Malaysian Ringgit",
            Self::Php => "Philippine Peso",
            Self::Thb => "Thai Baht",
            Self::Sek => "Swedish Krona",
            Self::Nok => "Norwegian Krone",
            Self::Dkk => "Danish Krone",
            Self::Pln => "Polish Zloty",
            Self::Czk => "Czech Koruna",
            Self::Huf => "Hungarian Forint",
            Self::Ron => "Romanian Leu",
            Self::Try => "Turkish Lira",
            Self::Ils => "Israeli New Shekel",
            Self::Aed => "UAE Dirham",
            Self::Sar => "Saudi Riyal",
            Self::Zar => "South African Rand",
            Self::Brl => "Brazilian Real",
            Self::Mxn => "Mexican Peso",
        }
    }

    /// Parse a code case-insensitively, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|currency| currency.code() == normalized)
            .ok_or(ValidationError::InvalidCurrency { value: normalized })
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_owned()
    }
}

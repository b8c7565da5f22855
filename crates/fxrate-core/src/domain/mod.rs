//! # Domain Models
//!
//! Canonical domain types for fxrate.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Currency`] | Closed set of supported ISO-4217 codes |
//! | [`RateSnapshot`] | One fetched rate table tied to a timestamp |
//! | [`CachedSnapshot`] | A snapshot plus its expiry, as persisted |
//! | [`Preference`] | The user's from/to currency pair |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Construction validates invariants: rate tables only hold known
//! currencies with finite, positive rates.

mod currency;
mod models;
mod timestamp;

pub use currency::Currency;
pub use models::{
    convert, validate_amount, CachedSnapshot, Preference, RateSnapshot, DEFAULT_CACHE_TTL,
};
pub use timestamp::UtcDateTime;

use serde::Serialize;

use fxrate_core::{Currency, UtcDateTime};

use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Debug, Serialize)]
struct CacheStatus {
    present: bool,
    valid: bool,
    ttl_hours: i64,
    base: Option<Currency>,
    currencies: usize,
    fetched_at: Option<UtcDateTime>,
    expires_at: Option<UtcDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

pub fn run(context: &Context) -> Result<(), CliError> {
    let cached = context.store.peek();
    let reason = context.store.load_checked().err().map(|error| error.code());

    let status = CacheStatus {
        present: cached.is_some(),
        valid: reason.is_none(),
        ttl_hours: context.store.ttl().whole_hours(),
        base: cached.as_ref().map(|entry| entry.snapshot.base()),
        currencies: cached
            .as_ref()
            .map_or(0, |entry| entry.snapshot.rates().len()),
        fetched_at: cached.as_ref().map(|entry| entry.snapshot.fetched_at()),
        expires_at: cached.as_ref().map(|entry| entry.expires_at),
        reason,
    };

    output::render(&status, context.pretty)
}

use serde::Serialize;

use fxrate_core::Currency;

use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CurrencyEntry {
    code: &'static str,
    name: &'static str,
}

pub fn run(pretty: bool) -> Result<(), CliError> {
    let currencies = Currency::ALL
        .into_iter()
        .map(|currency| CurrencyEntry {
            code: currency.code(),
            name: currency.name(),
        })
        .collect::<Vec<_>>();

    output::render(&currencies, pretty)
}

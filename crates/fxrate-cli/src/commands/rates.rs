use std::collections::BTreeMap;

use serde::Serialize;

use fxrate_core::{Currency, PolicyView};

use crate::error::CliError;
use crate::output;

use super::{finish, Context};

#[derive(Debug, Serialize)]
struct RatesResponseData {
    view: PolicyView,
    rates: BTreeMap<Currency, f64>,
}

pub async fn run(context: &Context) -> Result<(), CliError> {
    let policy = context.start_policy().await;
    let view = policy.view();

    if view.state.is_error() {
        return finish(&view, context.pretty);
    }

    let rates = policy
        .snapshot()
        .map(|snapshot| snapshot.rates().clone())
        .unwrap_or_default();
    output::render(&RatesResponseData { view, rates }, context.pretty)
}

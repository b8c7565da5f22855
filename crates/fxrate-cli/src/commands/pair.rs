use fxrate_core::Preference;

use crate::cli::{AmountArgs, PairArgs};
use crate::error::CliError;
use crate::output;

use super::{finish, parse_currency, Context};

pub async fn swap(args: &AmountArgs, context: &Context) -> Result<(), CliError> {
    let mut policy = context.start_policy().await;
    policy.set_amount(args.amount)?;
    policy.swap();
    finish(&policy.view(), context.pretty)
}

pub fn set(args: &PairArgs, context: &Context) -> Result<(), CliError> {
    let preference = Preference::new(parse_currency(&args.from)?, parse_currency(&args.to)?);
    context
        .store
        .save_preference(preference.from, preference.to)?;
    output::render(&preference, context.pretty)
}

use fxrate_core::Preference;

use crate::cli::ConvertArgs;
use crate::error::CliError;

use super::{finish, parse_currency, Context};

pub async fn run(args: &ConvertArgs, context: &Context) -> Result<(), CliError> {
    let from = args.from.as_deref().map(parse_currency).transpose()?;
    let to = args.to.as_deref().map(parse_currency).transpose()?;

    let mut policy = context.start_policy().await;
    policy.set_amount(args.amount)?;

    if from.is_some() || to.is_some() {
        let current = policy.preference();
        policy.set_pair(Preference::new(
            from.unwrap_or(current.from),
            to.unwrap_or(current.to),
        ));
    }

    finish(&policy.view(), context.pretty)
}

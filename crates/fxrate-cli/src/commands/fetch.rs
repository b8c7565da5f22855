use crate::error::CliError;

use super::{finish, Context};

pub async fn run(context: &Context) -> Result<(), CliError> {
    // Without a valid cache, start-up already performed the fetch (or failed
    // for lack of a connection); only refresh when start-up used the cache.
    let had_cache = context.store.load().is_some();

    let mut policy = context.start_policy().await;
    if had_cache {
        policy.fetch().await;
    }

    finish(&policy.view(), context.pretty)
}

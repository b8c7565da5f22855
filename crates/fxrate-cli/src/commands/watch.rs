use fxrate_core::{
    run_policy, validate_amount, ConnectivityMonitor, PolicyEvent, PolicyView, Preference,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output;

use super::{parse_currency, Context};

enum Input {
    Event(PolicyEvent),
    Connectivity(bool),
    Quit,
}

pub async fn run(cli: &Cli, context: &Context) -> Result<(), CliError> {
    let monitor = ConnectivityMonitor::new(context.connected);
    let probe_task = if cli.offline || cli.mock {
        None
    } else {
        Some(context.config.probe().spawn(monitor.clone()))
    };

    let policy = context.start_policy().await;
    let (events_tx, events_rx) = mpsc::channel(32);
    let (views_tx, views_rx) = watch::channel(policy.view());

    let forward_task = monitor.forward_to(events_tx.clone());
    let driver = tokio::spawn(run_policy(policy, events_rx, views_tx));

    let printer = tokio::spawn(print_views(views_rx, |view| {
        if let Err(error) = output::render_line(view) {
            tracing::warn!(%error, "failed to write view");
        }
    }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_input(line) {
            Ok(Input::Quit) => break,
            // Through the monitor, so later probe results are compared
            // against what the policy was last told.
            Ok(Input::Connectivity(connected)) => {
                monitor.set(connected);
            }
            Ok(Input::Event(event)) => {
                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(error) => eprintln!("error: {error}"),
        }
    }

    // Stop every producer so the driver sees a closed channel and returns.
    if let Some(task) = probe_task {
        task.abort();
    }
    forward_task.abort();
    drop(events_tx);

    if let Err(error) = driver.await {
        tracing::warn!(%error, "policy driver stopped abnormally");
    }
    if let Err(error) = printer.await {
        tracing::warn!(%error, "view printer stopped abnormally");
    }
    Ok(())
}

/// Hand every published view to `write` until the driver goes away.
///
/// The driver publishes the starting view itself, so only changes are
/// written; the value the channel was created with is never printed.
async fn print_views<W>(mut views: watch::Receiver<PolicyView>, mut write: W)
where
    W: FnMut(&PolicyView),
{
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        write(&view);
    }
}

fn parse_input(line: &str) -> Result<Input, CliError> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();

    match head.to_ascii_lowercase().as_str() {
        "quit" | "exit" => Ok(Input::Quit),
        "swap" => Ok(Input::Event(PolicyEvent::Swap)),
        "fetch" => Ok(Input::Event(PolicyEvent::FetchRequested)),
        "online" => Ok(Input::Connectivity(true)),
        "offline" => Ok(Input::Connectivity(false)),
        "pair" => {
            let from = parse_currency(parts.next().unwrap_or_default())?;
            let to = parse_currency(parts.next().unwrap_or_default())?;
            Ok(Input::Event(PolicyEvent::PairChanged(Preference::new(from, to))))
        }
        _ => {
            let amount = head.parse::<f64>().map_err(|_| CliError::UnknownInput {
                input: line.to_owned(),
            })?;
            Ok(Input::Event(PolicyEvent::AmountChanged(validate_amount(amount)?)))
        }
    }
}

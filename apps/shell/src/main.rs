#![allow(clippy::print_stdout)]

mod cli;
mod config;
mod scopes;
mod telemetry;

use crate::cli::{Cli, Command};
use crate::config::{DispatchMode, load_config};
use crate::scopes::{Navigation, Notification, Scopes};
use anyhow::{Context, anyhow};
use arbor_event_bus::{Dispatch, EventBus, dispatcher};
use arbor_runtime::RuntimePool;
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(mode) = cli.dispatch {
        config.dispatch = mode;
    }
    telemetry::init(&config.log, cli.verbose)?;
    debug!(config = ?config, "Shell configured");

    let pool = match config.dispatch {
        DispatchMode::Immediate => None,
        DispatchMode::WorkerPool => Some(RuntimePool::shared(&config.pool)?),
    };
    let dispatch: Arc<dyn Dispatch> = pool.as_ref().map_or_else(dispatcher::immediate, |pool| {
        dispatcher::worker_pool(Arc::clone(pool))
    });

    let scopes = Scopes::build(dispatch).context("Failed to wire scope tree")?;
    let outcome = run(&cli.command, &scopes);

    if let Some(pool) = &pool {
        if !pool.wait_idle(IDLE_TIMEOUT) {
            info!(pending = pool.pending(), "Dispatch pool still busy at exit");
        }
        pool.shutdown();
    }
    if !matches!(cli.command, Command::Tree {}) {
        println!("{}", scopes.tally());
    }
    scopes.shutdown();

    outcome
}

fn run(command: &Command, scopes: &Scopes) -> anyhow::Result<()> {
    match command {
        Command::Tree {} => {
            for line in scopes.describe() {
                println!("{line}");
            }
        }
        Command::Open { route, scope } => {
            let state = find(scopes, scope)?.publisher::<dyn Navigation>().open(route.clone());
            println!("open {route} from {scope}: {state}");
        }
        Command::Notify { message, scope, urgent } => {
            let state = find(scopes, scope)?.publisher::<dyn Notification>().notify(message.clone(), *urgent);
            println!("notify from {scope}: {state}");
        }
        Command::Stress { events } => stress(scopes.deepest(), *events),
    }
    Ok(())
}

fn find<'a>(scopes: &'a Scopes, name: &str) -> anyhow::Result<&'a EventBus> {
    scopes
        .scope(name)
        .ok_or_else(|| anyhow!("Unknown scope `{name}`; expected one of {:?}", Scopes::NAMES))
}

#[allow(clippy::cast_precision_loss)]
fn stress(bus: &EventBus, events: usize) {
    let open = bus.publisher::<dyn Navigation>();
    let started = Instant::now();

    let resolved = (0..events)
        .map(|n| if n % 2 == 0 { format!("/file/{n}.rs") } else { format!("/view/{n}") })
        .filter(|route| open.open(route.clone()).is_resolved())
        .count();

    let elapsed = started.elapsed();
    let rate = events as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(events, resolved, ?elapsed, "Stress run finished");
    println!("published {events} events in {elapsed:?} ({rate:.0}/s), {resolved} resolved");
}

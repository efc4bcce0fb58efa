//! # CLI Argument Definitions

use crate::config::DispatchMode;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "arbor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Publishes events through a demo tree of nested scopes")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON; the extension may be omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured dispatch strategy
    #[arg(long, value_enum, global = true)]
    pub dispatch: Option<DispatchMode>,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the scope tree and what each scope listens to
    Tree {},
    /// Ask the given scope to open a route
    Open {
        route: String,
        /// Scope to publish from
        #[arg(short, long, default_value = "editor")]
        scope: String,
    },
    /// Raise a notification from the given scope
    Notify {
        message: String,
        #[arg(short, long, default_value = "sidebar")]
        scope: String,
        /// Mark the notification as urgent
        #[arg(long)]
        urgent: bool,
    },
    /// Publish many routes from the deepest scope and report throughput
    Stress {
        #[arg(short = 'n', long, default_value_t = 10_000)]
        events: usize,
    },
}

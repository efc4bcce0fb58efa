use crate::config::LogConfig;
use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Resolves the default level: the configured one, raised by each `-v`.
pub fn effective_level(configured: &str, verbosity: u8) -> anyhow::Result<LevelFilter> {
    let level = configured
        .parse::<LevelFilter>()
        .with_context(|| format!("Invalid log level `{configured}`"))?;

    Ok(match verbosity {
        0 => level,
        1 => level.max(LevelFilter::DEBUG),
        _ => LevelFilter::TRACE,
    })
}

/// Installs the global subscriber: an `EnvFilter` plus a compact or JSON console layer.
///
/// Directives come from `config.filter` when set, otherwise from `RUST_LOG`.
pub fn init(config: &LogConfig, verbosity: u8) -> anyhow::Result<()> {
    let level = effective_level(&config.level, verbosity)?;
    let builder = EnvFilter::builder().with_default_directive(level.into());
    let env_filter = match &config.filter {
        Some(directives) => builder.parse(directives).context("Invalid log filter")?,
        None => builder.from_env_lossy(),
    };

    let console = if config.json {
        layer().json().with_current_span(false).boxed()
    } else {
        layer().compact().with_ansi(true).with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .try_init()
        .context("Failed to install tracing subscriber")
}

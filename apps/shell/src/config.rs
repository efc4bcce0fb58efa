use arbor_runtime::PoolConfig;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// File looked up in the working directory when no `--config` is given.
const DEFAULT_CONFIG_FILE: &str = "arbor";
const ENV_PREFIX: &str = "ARBOR";

#[arbor_derive::arbor_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// How publisher calls reach the scope tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// On the publishing thread; the caller sees the real outcome.
    #[default]
    Immediate,
    /// On the runtime pool; the caller only learns the call was scheduled.
    WorkerPool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` does not say otherwise.
    pub level: String,
    pub json: bool,
    /// Explicit directives (e.g. `"arbor_event_bus=trace"`); replaces `RUST_LOG`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), json: false, filter: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub dispatch: DispatchMode,
    pub pool: PoolConfig,
    pub log: LogConfig,
}

/// Loads [`ShellConfig`] from `path` (or an optional `arbor.*` file) overlaid with `ARBOR__*`
/// environment variables, e.g. `ARBOR__POOL__WORKER_THREADS=8`.
///
/// # Errors
/// Fails if an explicit `path` does not exist or any source does not match [`ShellConfig`].
pub fn load_config(path: Option<&Path>) -> Result<ShellConfig, ConfigError> {
    load_config_with_env(path, None)
}

fn load_config_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<ShellConfig, ConfigError> {
    let file = path.map_or_else(
        || File::with_name(DEFAULT_CONFIG_FILE).required(false),
        |path| File::from(path).required(true),
    );

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(env),
    );

    info!(path = ?path, "Loading shell config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<ShellConfig>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

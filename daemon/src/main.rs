//! examcert daemon: command-line entry point for an examcert ledger.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use examcert_node::{init_logging, NodeConfig};
use examcert_types::WalletAddress;

use crate::commands::Command;

#[derive(Parser)]
#[command(name = "examcert", version, about = "Exam certificate ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "EXAMCERT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "EXAMCERT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "EXAMCERT_MAP_SIZE_MB", global = true)]
    map_size_mb: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "EXAMCERT_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "EXAMCERT_LOG_FORMAT", global = true)]
    log_format: Option<String>,

    /// Wallet to act as. Administrative commands default to the current
    /// administrator; student commands default to the student's own wallet.
    #[arg(long = "as", env = "EXAMCERT_CALLER", global = true)]
    caller: Option<WalletAddress>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// File settings first, then CLI flags and env vars on top.
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => NodeConfig::default(),
        };

        Ok(NodeConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            map_size_mb: self.map_size_mb.unwrap_or(base.map_size_mb),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            ..base
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    init_logging(config.log_format(), &config.log_level);
    if let Some(path) = &cli.config {
        tracing::debug!(path = %path.display(), "loaded config file");
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "resolved configuration");

    commands::run(cli.command, &config, cli.caller)
}

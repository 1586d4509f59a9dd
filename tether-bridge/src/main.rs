use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use tether_bridge::config::Config;
use tether_bridge::{app, util};

/// Local line editing in front of your shell.
#[derive(Debug, Parser)]
#[command(name = "tether", version, about)]
struct Cli {
    /// Config file (defaults to $TETHER_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Program to run instead of the configured shell
    #[arg(short, long)]
    shell: Option<String>,

    /// Give up on the first keystroke sequence the editor can't handle
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.shell.is_some() {
        config.shell = cli.shell;
    }
    if cli.strict {
        config.error_policy = tether_core::ErrorPolicy::Strict;
    }

    let _log_guard = util::init_tracing(&config.log_path())?;
    util::install_panic_hook();
    tracing::info!(?config, "tether starting");

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(app::run(config));

    if let Err(e) = &result {
        tracing::error!(error = %e, "tether exited with error");
    }
    result
}

//! CLI startup: env, tracing, config, dispatch.

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;
use txshield_types::AppConfig;

use crate::cli::{Cli, Command};
use crate::commands;

pub async fn run() -> Result<i32, Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "txshield=debug,txshield_analyzer=debug,txshield_proxy=debug,txshield_decoder=debug"
    } else if cli.quiet {
        "error"
    } else {
        "txshield=info,txshield_proxy=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Scan(args) => commands::scan::run(args, config).await,
        Command::Safe(args) => commands::safe::run(args, config).await,
        Command::Approval(args) => commands::approval::run(args, config).await,
        Command::Proxy(args) => commands::proxy::run(args, config).await,
    }
}

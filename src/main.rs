mod archive;
mod cli;
mod commands;
mod config;
mod extract;
mod ledger;
mod mime;
mod model;
mod ocr;
mod pdf;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::Config;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli);
    config.setup()?;

    match cli.command {
        Commands::Import(args) => commands::import::run(&config, args),
        Commands::RescanAll(args) => commands::rescan::run(&config, args),
        Commands::Search => commands::search::run(&config),
        Commands::DockerRebuild => commands::docker::run(&config),
        Commands::Status => commands::status::run(&config),
        Commands::ParsePreview(args) => commands::preview::run(&config, args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

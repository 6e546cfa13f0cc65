mod cli;
mod commands;
mod cues;
mod terminal;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they stay out of the game screen
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reflex=warn,reflex_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(&args)?;

    match args.command {
        None => commands::play::run(config, args.seed, args.bell, false),
        Some(Command::Play { json }) => commands::play::run(config, args.seed, args.bell, json),
        Some(Command::Tiers) => commands::tiers::run(&config),
        Some(Command::Config) => commands::config::run(&config),
    }
}

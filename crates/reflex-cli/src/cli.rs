//! CLI argument definitions for reflex.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reflex_core::RatingPreset;

#[derive(Parser, Debug)]
#[command(name = "reflex")]
#[command(about = "Reaction time game for the terminal", version)]
pub struct Args {
    /// Path to config file (TOML)
    #[arg(short, long, global = true, default_value = "reflex.toml", env = "REFLEX_CONFIG")]
    pub config: PathBuf,

    /// Rating scheme (overrides the config file)
    #[arg(long, global = true)]
    pub rating: Option<RatingPreset>,

    /// Seed for the random wait (for reproducible sessions)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Start the next round on its own after showing the result
    #[arg(long, global = true)]
    pub auto_advance: bool,

    /// Ring the terminal bell on color change and early clicks
    #[arg(long, global = true)]
    pub bell: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Play (default)
    Play {
        /// Print the session summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the active rating tiers
    Tiers,
    /// Print the effective configuration as TOML
    Config,
}

pub mod config;
pub mod play;
pub mod tiers;

use std::io::ErrorKind;

use anyhow::{Context, Result};
use reflex_core::{Error, GameConfig, RatingConfig};
use tracing::{info, warn};

use crate::cli::Args;

/// Config file (or defaults when it does not exist) with CLI overrides applied.
pub fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match GameConfig::load(&args.config) {
        Ok(config) => {
            info!("Loaded config from {:?}", args.config);
            config
        }
        Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!("Config {:?} not found, using defaults", args.config);
            GameConfig::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load config {:?}", args.config));
        }
    };

    if let Some(preset) = args.rating {
        config.rating = RatingConfig::Preset(preset);
    }
    if args.auto_advance {
        config.auto_advance = true;
    }
    config.validate()?;
    Ok(config)
}

//! Print the effective configuration.

use anyhow::Result;
use reflex_core::GameConfig;

pub fn run(config: &GameConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

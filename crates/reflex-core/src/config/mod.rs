//! Game configuration.
//!
//! Built once at startup (defaults, optionally overlaid by a TOML file) and
//! handed to the game by reference. Nothing reads configuration from global
//! state.

mod color;

pub use color::Rgb;

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rating::{RatingPreset, RatingScheme, RatingTier};

/// Idle (red) and active (green) panel colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub idle: Rgb,
    pub active: Rgb,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            idle: Rgb::new(0xe7, 0x4c, 0x3c),
            active: Rgb::new(0x2e, 0xcc, 0x71),
        }
    }
}

/// Inclusive bounds of the random wait before the color change, in ms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for WaitRange {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 5000,
        }
    }
}

/// Either a preset name or an explicit tier list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingConfig {
    Preset(RatingPreset),
    Custom(Vec<RatingTier>),
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self::Preset(RatingPreset::default())
    }
}

impl RatingConfig {
    pub fn scheme(&self) -> Result<RatingScheme> {
        match self {
            Self::Preset(preset) => Ok(RatingScheme::preset(*preset)),
            Self::Custom(tiers) => RatingScheme::new(tiers.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// How long the early-click notice stays up before a new round
    pub early_click_notice_ms: u64,
    /// Delay before the next round starts on its own (with `auto_advance`)
    pub round_interval_ms: u64,
    pub auto_advance: bool,
    pub rating: RatingConfig,
    pub colors: Colors,
    pub wait_range: WaitRange,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            early_click_notice_ms: 2000,
            round_interval_ms: 1000,
            auto_advance: false,
            rating: RatingConfig::default(),
            colors: Colors::default(),
            wait_range: WaitRange::default(),
        }
    }
}

impl GameConfig {
    /// Load and validate a TOML config file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ConfigParseError(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let WaitRange { min_ms, max_ms } = self.wait_range;
        if min_ms == 0 {
            return Err(Error::InvalidConfig("wait_range.min_ms must be positive".into()));
        }
        if min_ms > max_ms {
            return Err(Error::InvalidConfig(format!(
                "wait_range.min_ms ({}) exceeds max_ms ({})",
                min_ms, max_ms
            )));
        }
        if self.early_click_notice_ms == 0 {
            return Err(Error::InvalidConfig(
                "early_click_notice_ms must be positive".into(),
            ));
        }
        self.rating.scheme()?;
        Ok(())
    }

    pub fn early_click_notice(&self) -> Duration {
        Duration::from_millis(self.early_click_notice_ms)
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_millis(self.round_interval_ms)
    }
}

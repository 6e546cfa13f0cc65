use thiserror::Error;

use crate::state::GamePhase;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Illegal phase transition: {from} -> {to}")]
    IllegalTransition { from: GamePhase, to: GamePhase },

    #[error("Anomalous round data: {0}")]
    AnomalousRoundData(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParseError(e.to_string())
    }
}

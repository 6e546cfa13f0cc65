use std::time::Duration;

use rand::Rng;

use crate::clock::Timestamp;
use crate::config::WaitRange;
use crate::error::{Error, Result};

/// Timing data of a single round.
///
/// A fresh `Round` is built for every round. The color change and the click
/// are each recorded at most once, and the reaction time is derived from them
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    scheduled_delay: Duration,
    color_change_at: Option<Timestamp>,
    click_at: Option<Timestamp>,
    reaction_ms: Option<f64>,
}

impl Round {
    pub fn new(scheduled_delay: Duration) -> Self {
        Self {
            scheduled_delay,
            color_change_at: None,
            click_at: None,
            reaction_ms: None,
        }
    }

    /// Start a round with a delay drawn uniformly from `range` (inclusive,
    /// whole milliseconds).
    pub fn random<R: Rng>(rng: &mut R, range: &WaitRange) -> Self {
        Self::new(draw_delay(rng, range))
    }

    pub fn scheduled_delay(&self) -> Duration {
        self.scheduled_delay
    }

    pub fn color_change_at(&self) -> Option<Timestamp> {
        self.color_change_at
    }

    pub fn click_at(&self) -> Option<Timestamp> {
        self.click_at
    }

    pub fn reaction_ms(&self) -> Option<f64> {
        self.reaction_ms
    }

    pub fn is_complete(&self) -> bool {
        self.reaction_ms.is_some()
    }

    /// Record when the active color appeared.
    pub fn mark_color_change(&mut self, at: Timestamp) -> Result<()> {
        if let Some(existing) = self.color_change_at {
            return Err(Error::AnomalousRoundData(format!(
                "color change already recorded at {}",
                existing
            )));
        }
        self.color_change_at = Some(at);
        Ok(())
    }

    /// Record the accepted click and derive the reaction time.
    ///
    /// Fails without touching the round if no color change was recorded. A
    /// second call returns the reaction time derived by the first.
    pub fn record_click(&mut self, at: Timestamp) -> Result<f64> {
        if let Some(reaction) = self.reaction_ms {
            return Ok(reaction);
        }
        let Some(changed) = self.color_change_at else {
            return Err(Error::AnomalousRoundData(
                "click recorded before any color change".into(),
            ));
        };
        let reaction = at - changed;
        self.click_at = Some(at);
        self.reaction_ms = Some(reaction);
        Ok(reaction)
    }
}

pub fn draw_delay<R: Rng>(rng: &mut R, range: &WaitRange) -> Duration {
    Duration::from_millis(rng.random_range(range.min_ms..=range.max_ms))
}

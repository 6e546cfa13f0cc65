//! Reaction time rating.
//!
//! A scheme is an ordered list of tiers. Every tier but the last has an
//! exclusive upper bound in milliseconds; the last tier catches everything
//! slower. Bounds must be strictly increasing, so the tiers partition
//! `[0, inf)` without gaps or overlaps.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// Built-in rating schemes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RatingPreset {
    /// 4 tiers: 200 / 300 / 400 ms
    #[default]
    Classic,
    /// 7 tiers: 180 / 250 / 320 / 400 / 500 / 600 ms
    Goose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTier {
    pub label: String,
    #[serde(default)]
    pub feedback: String,
    /// Exclusive upper bound in milliseconds; `None` for the slowest tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below_ms: Option<u32>,
}

impl RatingTier {
    pub fn new(label: &str, feedback: &str, below_ms: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            feedback: feedback.to_string(),
            below_ms,
        }
    }
}

/// Validated, ordered tier list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingScheme {
    tiers: Vec<RatingTier>,
}

impl RatingScheme {
    pub fn new(tiers: Vec<RatingTier>) -> Result<Self> {
        let Some((last, bounded)) = tiers.split_last() else {
            return Err(Error::InvalidConfig("rating scheme has no tiers".into()));
        };
        if last.below_ms.is_some() {
            return Err(Error::InvalidConfig(format!(
                "slowest tier '{}' must not have an upper bound",
                last.label
            )));
        }

        let mut previous: Option<u32> = None;
        for tier in bounded {
            let Some(bound) = tier.below_ms else {
                return Err(Error::InvalidConfig(format!(
                    "tier '{}' is missing its upper bound",
                    tier.label
                )));
            };
            if bound == 0 {
                return Err(Error::InvalidConfig(format!(
                    "tier '{}' has an empty range",
                    tier.label
                )));
            }
            if let Some(prev) = previous
                && bound <= prev
            {
                return Err(Error::InvalidConfig(format!(
                    "tier bounds must increase: {} then {}",
                    prev, bound
                )));
            }
            previous = Some(bound);
        }

        Ok(Self { tiers })
    }

    /// Build from bare thresholds and labels. `labels` has one more entry
    /// than `thresholds`.
    pub fn from_thresholds(thresholds: &[u32], labels: &[&str]) -> Result<Self> {
        if labels.len() != thresholds.len() + 1 {
            return Err(Error::InvalidConfig(format!(
                "{} thresholds need {} labels, got {}",
                thresholds.len(),
                thresholds.len() + 1,
                labels.len()
            )));
        }
        let tiers = labels
            .iter()
            .enumerate()
            .map(|(i, label)| RatingTier::new(label, "", thresholds.get(i).copied()))
            .collect();
        Self::new(tiers)
    }

    pub fn preset(preset: RatingPreset) -> Self {
        let tiers = match preset {
            RatingPreset::Classic => vec![
                RatingTier::new("Excellent", "Blazing fast!", Some(200)),
                RatingTier::new("Good", "Nice!", Some(300)),
                RatingTier::new("Average", "Keep it up!", Some(400)),
                RatingTier::new("Needs Improvement", "Keep practicing!", None),
            ],
            RatingPreset::Goose => vec![
                RatingTier::new("Godlike Goose", "This goose is cheating!", Some(180)),
                RatingTier::new("Lightning Goose", "Honk, that was quick!", Some(250)),
                RatingTier::new("Agile Goose", "Nice moves.", Some(320)),
                RatingTier::new("Steady Goose", "Steady as a goose.", Some(400)),
                RatingTier::new("Leisurely Goose", "No rush, huh?", Some(500)),
                RatingTier::new("Sleepy Goose", "Is the goose napping?", Some(600)),
                RatingTier::new("Clumsy Goose", "That was a slow goose.", None),
            ],
        };
        Self { tiers }
    }

    pub fn tiers(&self) -> &[RatingTier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for RatingScheme {
    fn default() -> Self {
        Self::preset(RatingPreset::default())
    }
}

/// Maps a reaction time onto a tier of its scheme.
#[derive(Debug, Clone, Default)]
pub struct RatingClassifier {
    scheme: RatingScheme,
}

impl RatingClassifier {
    pub fn new(scheme: RatingScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &RatingScheme {
        &self.scheme
    }

    /// Index of the tier for `reaction_ms`; 0 is the fastest.
    ///
    /// Bounds are exclusive: a value exactly on a bound belongs to the next
    /// tier. Anything that is not below a bound (NaN included) lands in the
    /// slowest tier.
    pub fn rank(&self, reaction_ms: f64) -> usize {
        self.scheme
            .tiers
            .iter()
            .position(|tier| tier.below_ms.is_some_and(|b| reaction_ms < f64::from(b)))
            .unwrap_or(self.scheme.tiers.len() - 1)
    }

    pub fn classify(&self, reaction_ms: f64) -> &RatingTier {
        &self.scheme.tiers[self.rank(reaction_ms)]
    }
}

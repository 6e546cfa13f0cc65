//! Print the active rating tiers.

use anyhow::Result;
use owo_colors::OwoColorize;
use reflex_core::GameConfig;

use crate::terminal::tier_color;

pub fn run(config: &GameConfig) -> Result<()> {
    let scheme = config.rating.scheme()?;
    let count = scheme.len();
    let mut lower = 0;

    for (rank, tier) in scheme.tiers().iter().enumerate() {
        let range = match tier.below_ms {
            Some(upper) => format!("{:>4} - {:<4} ms", lower, upper),
            None => format!("{:>4}+        ms", lower),
        };
        let (r, g, b) = tier_color(rank, count);
        println!(
            "  {}  {}  {}",
            range.dimmed(),
            format!("{:<20}", tier.label).truecolor(r, g, b).bold(),
            tier.feedback
        );
        if let Some(upper) = tier.below_ms {
            lower = upper;
        }
    }
    Ok(())
}

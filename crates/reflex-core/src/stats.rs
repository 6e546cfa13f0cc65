use serde::Serialize;

/// Per-session counters and reaction time summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Every round begun, including the ones started after an early click
    pub rounds_started: u32,
    pub rounds_completed: u32,
    pub early_clicks: u32,
    /// Rounds discarded because their timing data was inconsistent
    pub anomalies: u32,
    pub best_ms: Option<f64>,
    pub last_ms: Option<f64>,
    pub mean_ms: Option<f64>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reaction(&mut self, reaction_ms: f64) {
        self.rounds_completed += 1;
        let n = f64::from(self.rounds_completed);
        self.mean_ms = Some(match self.mean_ms {
            Some(mean) => mean + (reaction_ms - mean) / n,
            None => reaction_ms,
        });
        self.last_ms = Some(reaction_ms);
        self.best_ms = Some(match self.best_ms {
            Some(best) => best.min(reaction_ms),
            None => reaction_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let stats = SessionStats::new();
        assert_eq!(stats.mean_ms, None);
        assert_eq!(stats.best_ms, None);
    }

    #[test]
    fn test_record_reaction() {
        let mut stats = SessionStats::new();
        stats.record_reaction(300.0);
        stats.record_reaction(200.0);
        stats.record_reaction(250.0);
        assert_eq!(stats.rounds_completed, 3);
        assert_eq!(stats.best_ms, Some(200.0));
        assert_eq!(stats.last_ms, Some(250.0));
        assert_eq!(stats.mean_ms, Some(250.0));
    }
}

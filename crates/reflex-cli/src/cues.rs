use std::io::{self, Write};

use reflex_core::{Cue, CuePlayer};
use tracing::warn;

/// Rings the terminal bell for cues that need the player's attention.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl TerminalBell {
    pub fn new() -> Self {
        Self
    }
}

impl CuePlayer for TerminalBell {
    fn play(&mut self, cue: Cue) {
        if !matches!(cue, Cue::ColorChange | Cue::EarlyClick) {
            return;
        }
        let mut out = io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            warn!("Failed to ring bell: {}", e);
        }
    }
}

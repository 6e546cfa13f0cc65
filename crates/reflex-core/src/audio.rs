//! Sound cues. The game only says which cue to play; producing the sound is
//! up to the player.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cue {
    Click,
    ColorChange,
    /// Result shown; carries the tier rank (0 = fastest)
    Success(usize),
    EarlyClick,
}

pub trait CuePlayer {
    fn play(&mut self, cue: Cue);
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl CuePlayer for Silent {
    fn play(&mut self, _cue: Cue) {}
}

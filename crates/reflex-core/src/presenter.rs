//! Presentation surface driven by the game.
//!
//! Calls are one-way: the game never waits on them and never reads anything
//! back. A surface that fails to draw should log and carry on.

use crate::config::Rgb;
use crate::rating::RatingTier;

pub trait Presenter {
    fn set_color(&mut self, color: Rgb);

    /// Toggle the idle ("click to start") styling of the panel
    fn set_idle_style(&mut self, on: bool);

    fn show_instructions(&mut self);

    fn show_message(&mut self, text: &str);

    fn clear_message(&mut self);

    /// `rank` is the tier index, 0 being the fastest
    fn show_result(&mut self, reaction_ms: f64, tier: &RatingTier, rank: usize);

    fn clear_result(&mut self);

    /// Start delivering clicks. Called once per game, on initialize.
    fn attach_click_listener(&mut self);
}

/// One recorded presenter call.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    SetColor(Rgb),
    SetIdleStyle(bool),
    ShowInstructions,
    ShowMessage(String),
    ClearMessage,
    ShowResult {
        reaction_ms: f64,
        label: String,
        rank: usize,
    },
    ClearResult,
    AttachClickListener,
}

/// Presenter that records every call, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    calls: Vec<PresenterCall>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PresenterCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Last color set on the panel
    pub fn color(&self) -> Option<Rgb> {
        self.calls.iter().rev().find_map(|call| match call {
            PresenterCall::SetColor(color) => Some(*color),
            _ => None,
        })
    }

    /// Message currently on screen, if any
    pub fn message(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|call| match call {
            PresenterCall::ShowMessage(text) => Some(Some(text.as_str())),
            PresenterCall::ClearMessage => Some(None),
            _ => None,
        })?
    }

    pub fn count(&self, pred: impl Fn(&PresenterCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(*call)).count()
    }
}

impl Presenter for RecordingPresenter {
    fn set_color(&mut self, color: Rgb) {
        self.calls.push(PresenterCall::SetColor(color));
    }

    fn set_idle_style(&mut self, on: bool) {
        self.calls.push(PresenterCall::SetIdleStyle(on));
    }

    fn show_instructions(&mut self) {
        self.calls.push(PresenterCall::ShowInstructions);
    }

    fn show_message(&mut self, text: &str) {
        self.calls.push(PresenterCall::ShowMessage(text.to_string()));
    }

    fn clear_message(&mut self) {
        self.calls.push(PresenterCall::ClearMessage);
    }

    fn show_result(&mut self, reaction_ms: f64, tier: &RatingTier, rank: usize) {
        self.calls.push(PresenterCall::ShowResult {
            reaction_ms,
            label: tier.label.clone(),
            rank,
        });
    }

    fn clear_result(&mut self) {
        self.calls.push(PresenterCall::ClearResult);
    }

    fn attach_click_listener(&mut self) {
        self.calls.push(PresenterCall::AttachClickListener);
    }
}

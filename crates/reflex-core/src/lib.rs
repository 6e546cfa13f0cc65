pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod presenter;
pub mod rating;
pub mod round;
pub mod state;
pub mod stats;

pub use audio::{Cue, CuePlayer, Silent};
pub use clock::{Clock, Fired, ManualSource, MonotonicSource, TimeSource, TimerToken, Timestamp};
pub use config::{Colors, GameConfig, RatingConfig, Rgb, WaitRange};
pub use error::{Error, Result};
pub use game::Game;
pub use presenter::{Presenter, PresenterCall, RecordingPresenter};
pub use rating::{RatingClassifier, RatingPreset, RatingScheme, RatingTier};
pub use round::Round;
pub use state::{GamePhase, StateMachine, SubscriptionId};
pub use stats::SessionStats;

//! Game orchestration.
//!
//! `Game` owns the phase machine, the live round and the clock. It reacts to
//! two kinds of events: clicks ([`Game::handle_click`]) and due timers
//! ([`Game::tick`]). Both run to completion before the next event is looked
//! at, so no locking is involved.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, trace, warn};

use crate::audio::{Cue, CuePlayer, Silent};
use crate::clock::{Clock, TimeSource, TimerToken};
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::presenter::Presenter;
use crate::rating::RatingClassifier;
use crate::round::Round;
use crate::state::{GamePhase, StateMachine, SubscriptionId};
use crate::stats::SessionStats;

pub const WAIT_MESSAGE: &str = "Wait for the panel to change color, then click as fast as you can";
pub const GO_MESSAGE: &str = "Click now!";
pub const EARLY_CLICK_MESSAGE: &str = "Too early! Wait for the color change before clicking.";
pub const CONTINUE_MESSAGE: &str = "Click to start the next round";

/// What a pending timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundTimer {
    /// Show the active color and start measuring
    ColorChange,
    /// Early-click notice is over, start a new round
    EarlyClickNotice,
    /// Auto advance from the result to a new round
    NextRound,
}

pub struct Game<S: TimeSource, P: Presenter, R: Rng = StdRng> {
    config: Arc<GameConfig>,
    classifier: RatingClassifier,
    state: StateMachine,
    clock: Clock<S, RoundTimer>,
    /// Token of the timer this game is waiting for
    armed: Option<TimerToken>,
    presenter: P,
    audio: Box<dyn CuePlayer>,
    rng: R,
    round: Option<Round>,
    stats: SessionStats,
    initialized: bool,
}

impl<S: TimeSource, P: Presenter, R: Rng> Game<S, P, R> {
    pub fn new(config: Arc<GameConfig>, source: S, presenter: P, rng: R) -> Result<Self> {
        config.validate()?;
        let classifier = RatingClassifier::new(config.rating.scheme()?);

        Ok(Self {
            config,
            classifier,
            state: StateMachine::new(),
            clock: Clock::new(source),
            armed: None,
            presenter,
            audio: Box::new(Silent),
            rng,
            round: None,
            stats: SessionStats::new(),
            initialized: false,
        })
    }

    pub fn with_audio<A: CuePlayer + 'static>(mut self, player: A) -> Self {
        self.audio = Box::new(player);
        self
    }

    /// Show the idle panel and instructions, then start taking clicks.
    ///
    /// Only the first call has any effect.
    pub fn initialize(&mut self) {
        if self.initialized {
            warn!("Game already initialized, ignoring");
            return;
        }

        self.presenter.set_color(self.config.colors.idle);
        self.presenter.set_idle_style(true);
        self.presenter.show_instructions();
        self.presenter.attach_click_listener();
        self.state.subscribe(|phase| {
            trace!("Entered {}", phase);
            Ok(())
        });
        self.initialized = true;
        debug!("Game initialized");
    }

    /// Register a side-effect hook run after every phase change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(GamePhase) -> anyhow::Result<()> + 'static,
    {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    /// React to a click on the panel.
    ///
    /// Errors only on an illegal internal transition, which means the game
    /// logic itself is broken.
    pub fn handle_click(&mut self) -> Result<()> {
        if !self.initialized {
            warn!("Click before initialize, ignoring");
            return Ok(());
        }

        match self.state.current() {
            GamePhase::Initial => {
                self.presenter.set_idle_style(false);
                self.audio.play(Cue::Click);
                self.begin_round()
            }
            GamePhase::Waiting => self.early_click(),
            GamePhase::Ready => self.valid_click(),
            GamePhase::Result => {
                self.audio.play(Cue::Click);
                self.begin_round()
            }
            GamePhase::EarlyClick => {
                debug!("Click during early-click notice, ignoring");
                Ok(())
            }
        }
    }

    /// Fire the pending timer if it is due. Returns whether one fired.
    pub fn tick(&mut self) -> Result<bool> {
        let Some(fired) = self.clock.take_due() else {
            return Ok(false);
        };
        if self.armed != Some(fired.token) {
            warn!("Stale timer {:?} fired, ignoring", fired.token);
            return Ok(false);
        }
        self.armed = None;

        match (fired.payload, self.state.current()) {
            (RoundTimer::ColorChange, GamePhase::Waiting) => self.color_change()?,
            (RoundTimer::EarlyClickNotice, GamePhase::EarlyClick)
            | (RoundTimer::NextRound, GamePhase::Result) => self.begin_round()?,
            (timer, phase) => warn!("Timer {:?} fired in phase {}, ignoring", timer, phase),
        }
        Ok(true)
    }

    /// Back to the pre-game screen: timer cancelled, phase `Initial`, no
    /// round. Click delivery and phase listeners stay attached, session
    /// stats are kept.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.state.reset();
        self.round = None;

        self.presenter.set_color(self.config.colors.idle);
        self.presenter.clear_result();
        self.presenter.clear_message();
        self.presenter.set_idle_style(true);
        self.presenter.show_instructions();
        info!("Game reset");
    }

    pub fn phase(&self) -> GamePhase {
        self.state.current()
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn classifier(&self) -> &RatingClassifier {
        &self.classifier
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_pending_timer(&self) -> bool {
        self.armed.is_some()
    }

    /// How long until the pending timer is due, for event loops that poll.
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.clock.time_until_due()
    }

    fn begin_round(&mut self) -> Result<()> {
        let round = Round::random(&mut self.rng, &self.config.wait_range);
        let delay = round.scheduled_delay();
        self.round = Some(round);
        self.stats.rounds_started += 1;

        self.presenter.set_color(self.config.colors.idle);
        self.presenter.clear_result();
        self.presenter.show_message(WAIT_MESSAGE);

        self.transition(GamePhase::Waiting)?;
        self.arm(delay, RoundTimer::ColorChange);
        debug!(
            "Round {} started, color change in {}ms",
            self.stats.rounds_started,
            delay.as_millis()
        );
        Ok(())
    }

    fn color_change(&mut self) -> Result<()> {
        let now = self.clock.now();
        let marked = match self.round.as_mut() {
            Some(round) => round.mark_color_change(now),
            None => Err(Error::AnomalousRoundData("no round while waiting".into())),
        };
        if let Err(e) = marked {
            // A click in Waiting still recovers through the early-click path.
            error!("Skipping color change: {}", e);
            self.stats.anomalies += 1;
            return Ok(());
        }

        self.presenter.set_color(self.config.colors.active);
        self.presenter.show_message(GO_MESSAGE);
        self.audio.play(Cue::ColorChange);
        self.transition(GamePhase::Ready)
    }

    fn early_click(&mut self) -> Result<()> {
        self.cancel_timer();
        self.transition(GamePhase::EarlyClick)?;
        self.stats.early_clicks += 1;

        self.presenter.show_message(EARLY_CLICK_MESSAGE);
        self.audio.play(Cue::EarlyClick);
        self.arm(self.config.early_click_notice(), RoundTimer::EarlyClickNotice);
        info!("Early click");
        Ok(())
    }

    fn valid_click(&mut self) -> Result<()> {
        let now = self.clock.now();
        let recorded = match self.round.as_mut() {
            Some(round) => round.record_click(now),
            None => Err(Error::AnomalousRoundData("no round while ready".into())),
        };
        let reaction_ms = match recorded {
            Ok(ms) => ms,
            Err(e) => {
                error!("Discarding round: {}", e);
                self.stats.anomalies += 1;
                // Ready -> Waiting is not allowed, so pass through Result.
                self.transition(GamePhase::Result)?;
                return self.begin_round();
            }
        };

        let rank = self.classifier.rank(reaction_ms);
        let tier = self.classifier.classify(reaction_ms);
        self.presenter.show_result(reaction_ms, tier, rank);
        self.stats.record_reaction(reaction_ms);
        info!("Reaction time {:.1}ms: {}", reaction_ms, tier.label);

        self.transition(GamePhase::Result)?;
        self.presenter.show_message(CONTINUE_MESSAGE);
        self.audio.play(Cue::Success(rank));

        if self.config.auto_advance {
            self.arm(self.config.round_interval(), RoundTimer::NextRound);
        }
        Ok(())
    }

    fn transition(&mut self, to: GamePhase) -> Result<()> {
        self.state.transition(to).inspect_err(|e| {
            error!("Internal transition rejected: {}", e);
        })
    }

    fn arm(&mut self, delay: Duration, timer: RoundTimer) {
        self.armed = Some(self.clock.schedule_after(delay, timer));
    }

    fn cancel_timer(&mut self) {
        self.clock.cancel();
        self.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualSource, Timestamp};
    use crate::config::RatingConfig;
    use crate::presenter::{PresenterCall, RecordingPresenter};
    use crate::rating::RatingPreset;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    type TestGame = Game<ManualSource, RecordingPresenter, StdRng>;

    fn game_with(config: GameConfig) -> (TestGame, ManualSource) {
        let source = ManualSource::new();
        let mut game = Game::new(
            Arc::new(config),
            source.clone(),
            RecordingPresenter::new(),
            StdRng::seed_from_u64(42),
        )
        .unwrap();
        game.initialize();
        (game, source)
    }

    fn game() -> (TestGame, ManualSource) {
        game_with(GameConfig::default())
    }

    fn delay_of(game: &TestGame) -> Duration {
        game.round().unwrap().scheduled_delay()
    }

    /// Click to start and let the color change fire.
    fn reach_ready(game: &mut TestGame, source: &ManualSource) {
        game.handle_click().unwrap();
        source.advance(delay_of(game));
        assert!(game.tick().unwrap());
        assert_eq!(game.phase(), GamePhase::Ready);
    }

    #[derive(Clone, Default)]
    struct CueLog(Rc<RefCell<Vec<Cue>>>);

    impl CuePlayer for CueLog {
        fn play(&mut self, cue: Cue) {
            self.0.borrow_mut().push(cue);
        }
    }

    #[test]
    fn test_initialize_presents_idle_state() {
        let (game, _) = game();
        let idle = game.config().colors.idle;
        assert_eq!(
            game.presenter().calls(),
            &[
                PresenterCall::SetColor(idle),
                PresenterCall::SetIdleStyle(true),
                PresenterCall::ShowInstructions,
                PresenterCall::AttachClickListener,
            ]
        );
        assert_eq!(game.phase(), GamePhase::Initial);
        assert!(game.round().is_none());
    }

    #[test]
    fn test_initialize_twice_attaches_once() {
        let (mut game, _) = game();
        game.initialize();
        assert_eq!(
            game.presenter()
                .count(|c| *c == PresenterCall::AttachClickListener),
            1
        );
    }

    #[test]
    fn test_click_before_initialize_ignored() {
        let mut game = Game::new(
            Arc::new(GameConfig::default()),
            ManualSource::new(),
            RecordingPresenter::new(),
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::Initial);
        assert!(game.presenter().calls().is_empty());
    }

    #[test]
    fn test_first_click_starts_round() {
        let (mut game, _) = game();
        game.presenter_mut().clear();
        game.handle_click().unwrap();

        assert_eq!(game.phase(), GamePhase::Waiting);
        let round = game.round().unwrap();
        assert!((1000..=5000).contains(&round.scheduled_delay().as_millis()));
        assert!(round.color_change_at().is_none());
        assert!(game.has_pending_timer());
        assert_eq!(game.time_until_next_timer(), Some(round.scheduled_delay()));
        assert_eq!(game.presenter().calls()[0], PresenterCall::SetIdleStyle(false));
        assert_eq!(game.presenter().message(), Some(WAIT_MESSAGE));
        assert!(!WAIT_MESSAGE.contains("green"));
        assert_eq!(game.stats().rounds_started, 1);
    }

    #[test]
    fn test_color_change_fires_after_delay() {
        let (mut game, source) = game();
        game.handle_click().unwrap();
        let delay = delay_of(&game);

        source.advance(delay - Duration::from_millis(1));
        assert!(!game.tick().unwrap());
        assert_eq!(game.phase(), GamePhase::Waiting);

        source.advance_millis(1);
        assert!(game.tick().unwrap());
        assert_eq!(game.phase(), GamePhase::Ready);
        assert_eq!(game.presenter().color(), Some(game.config().colors.active));
        assert_eq!(game.presenter().message(), Some(GO_MESSAGE));
        let changed = game.round().unwrap().color_change_at().unwrap();
        assert_eq!(changed, Timestamp(delay.as_millis() as f64));
    }

    #[test]
    fn test_valid_click_measures_reaction() {
        let (mut game, source) = game();
        reach_ready(&mut game, &source);

        source.advance_millis(230);
        game.handle_click().unwrap();

        assert_eq!(game.phase(), GamePhase::Result);
        assert_eq!(game.round().unwrap().reaction_ms(), Some(230.0));
        assert!(game.presenter().calls().contains(&PresenterCall::ShowResult {
            reaction_ms: 230.0,
            label: "Good".into(),
            rank: 1,
        }));
        assert_eq!(game.presenter().message(), Some(CONTINUE_MESSAGE));
        assert_eq!(game.stats().rounds_completed, 1);
        assert_eq!(game.stats().best_ms, Some(230.0));
        assert!(!game.has_pending_timer());
    }

    #[test]
    fn test_result_click_replaces_round() {
        let (mut game, source) = game();
        reach_ready(&mut game, &source);
        source.advance_millis(300);
        game.handle_click().unwrap();

        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::Waiting);
        let round = game.round().unwrap();
        assert!(round.color_change_at().is_none());
        assert!(round.reaction_ms().is_none());
        assert_eq!(game.stats().rounds_started, 2);
        assert_eq!(
            game.presenter().calls().last(),
            Some(&PresenterCall::ShowMessage(WAIT_MESSAGE.into()))
        );
    }

    #[test]
    fn test_early_click_cancels_color_change() {
        let config = GameConfig {
            early_click_notice_ms: 6000,
            ..GameConfig::default()
        };
        let (mut game, source) = game_with(config);
        game.handle_click().unwrap();
        let delay = delay_of(&game);

        source.advance_millis(500);
        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::EarlyClick);
        assert_eq!(game.presenter().message(), Some(EARLY_CLICK_MESSAGE));
        assert_eq!(game.stats().early_clicks, 1);

        source.advance(delay);
        game.tick().unwrap();
        assert_eq!(game.phase(), GamePhase::EarlyClick);
        assert!(game.round().unwrap().color_change_at().is_none());
        assert_ne!(game.presenter().color(), Some(game.config().colors.active));
    }

    #[test]
    fn test_click_during_notice_ignored() {
        let (mut game, source) = game();
        game.handle_click().unwrap();
        game.handle_click().unwrap();
        let before = game.presenter().calls().len();

        source.advance_millis(100);
        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::EarlyClick);
        assert_eq!(game.presenter().calls().len(), before);
        assert_eq!(game.stats().early_clicks, 1);
    }

    #[test]
    fn test_notice_elapses_into_new_round() {
        let (mut game, source) = game();
        game.handle_click().unwrap();
        game.handle_click().unwrap();

        source.advance_millis(1999);
        assert!(!game.tick().unwrap());
        source.advance_millis(1);
        assert!(game.tick().unwrap());

        assert_eq!(game.phase(), GamePhase::Waiting);
        assert!(game.round().unwrap().color_change_at().is_none());
        assert_eq!(game.stats().rounds_started, 2);
        assert!(game.has_pending_timer());
    }

    #[test]
    fn test_anomalous_ready_click_starts_new_round() {
        let (mut game, source) = game();
        reach_ready(&mut game, &source);
        game.round = Some(Round::new(Duration::from_millis(1000)));
        game.presenter_mut().clear();

        source.advance_millis(200);
        game.handle_click().unwrap();

        assert_eq!(game.phase(), GamePhase::Waiting);
        assert_eq!(game.stats().anomalies, 1);
        assert_eq!(game.stats().rounds_completed, 0);
        assert_eq!(
            game.presenter()
                .count(|c| matches!(c, PresenterCall::ShowResult { .. })),
            0
        );
    }

    #[test]
    fn test_missing_round_on_color_change() {
        let (mut game, source) = game();
        game.handle_click().unwrap();
        let delay = delay_of(&game);
        game.round = None;

        source.advance(delay);
        assert!(game.tick().unwrap());
        assert_eq!(game.phase(), GamePhase::Waiting);
        assert_eq!(game.stats().anomalies, 1);

        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::EarlyClick);
    }

    #[test]
    fn test_auto_advance() {
        let config = GameConfig {
            auto_advance: true,
            round_interval_ms: 1500,
            ..GameConfig::default()
        };
        let (mut game, source) = game_with(config);
        reach_ready(&mut game, &source);
        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::Result);
        assert!(game.has_pending_timer());

        source.advance_millis(1500);
        assert!(game.tick().unwrap());
        assert_eq!(game.phase(), GamePhase::Waiting);
        assert_eq!(game.stats().rounds_started, 2);
    }

    #[test]
    fn test_click_supersedes_auto_advance() {
        let config = GameConfig {
            auto_advance: true,
            round_interval_ms: 500,
            ..GameConfig::default()
        };
        let (mut game, source) = game_with(config);
        reach_ready(&mut game, &source);
        game.handle_click().unwrap();
        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::Waiting);

        source.advance_millis(600);
        game.tick().unwrap();
        assert_eq!(game.phase(), GamePhase::Waiting);
        assert_eq!(game.stats().rounds_started, 2);
    }

    #[test]
    fn test_reset_from_waiting() {
        let (mut game, source) = game();
        game.handle_click().unwrap();
        let delay = delay_of(&game);

        game.reset();
        assert_eq!(game.phase(), GamePhase::Initial);
        assert!(game.round().is_none());
        assert!(!game.has_pending_timer());
        assert_eq!(game.presenter().color(), Some(game.config().colors.idle));
        assert_eq!(game.presenter().message(), None);

        source.advance(delay);
        assert!(!game.tick().unwrap());
        assert_eq!(game.phase(), GamePhase::Initial);

        game.handle_click().unwrap();
        assert_eq!(game.phase(), GamePhase::Waiting);
        assert_eq!(
            game.presenter()
                .count(|c| *c == PresenterCall::AttachClickListener),
            1
        );
    }

    #[test]
    fn test_listeners_see_phase_changes() {
        let (mut game, source) = game();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        game.subscribe(move |phase| {
            log.borrow_mut().push(phase);
            Ok(())
        });

        reach_ready(&mut game, &source);
        game.handle_click().unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![GamePhase::Waiting, GamePhase::Ready, GamePhase::Result]
        );
    }

    #[test]
    fn test_cues() {
        let cues = CueLog::default();
        let source = ManualSource::new();
        let mut game = Game::new(
            Arc::new(GameConfig::default()),
            source.clone(),
            RecordingPresenter::new(),
            StdRng::seed_from_u64(3),
        )
        .unwrap()
        .with_audio(cues.clone());
        game.initialize();

        reach_ready(&mut game, &source);
        source.advance_millis(150);
        game.handle_click().unwrap();
        game.handle_click().unwrap();
        game.handle_click().unwrap();

        assert_eq!(
            *cues.0.borrow(),
            vec![
                Cue::Click,
                Cue::ColorChange,
                Cue::Success(0),
                Cue::Click,
                Cue::EarlyClick,
            ]
        );
    }

    #[test]
    fn test_goose_scheme_from_config() {
        let config = GameConfig {
            rating: RatingConfig::Preset(RatingPreset::Goose),
            ..GameConfig::default()
        };
        let (mut game, source) = game_with(config);
        reach_ready(&mut game, &source);
        source.advance_millis(650);
        game.handle_click().unwrap();
        assert!(game.presenter().calls().contains(&PresenterCall::ShowResult {
            reaction_ms: 650.0,
            label: "Clumsy Goose".into(),
            rank: 6,
        }));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = GameConfig::default();
        config.wait_range.min_ms = 9000;
        let result = Game::new(
            Arc::new(config),
            ManualSource::new(),
            RecordingPresenter::new(),
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}

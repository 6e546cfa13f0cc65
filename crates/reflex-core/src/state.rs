use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Discrete game phase.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum GamePhase {
    /// Instructions shown, nothing scheduled yet
    #[default]
    Initial,
    /// Round started, waiting for the color change
    Waiting,
    /// Color changed, waiting for the click
    Ready,
    /// Reaction time shown
    Result,
    /// Clicked before the color change
    EarlyClick,
}

/// Handle returned by [`StateMachine::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(GamePhase) -> anyhow::Result<()>>;

/// Phase holder with a fixed transition table
///
/// ## Transition table
///
/// - Initial -> Waiting
/// - Waiting -> EarlyClick | Ready
/// - EarlyClick -> Waiting
/// - Ready -> Result
/// - Result -> Waiting
///
/// Everything else is rejected and leaves the phase untouched.
pub struct StateMachine {
    current: GamePhase,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: GamePhase::Initial,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn current(&self) -> GamePhase {
        self.current
    }

    /// Check if a phase change is in the transition table
    pub fn is_valid_transition(from: GamePhase, to: GamePhase) -> bool {
        matches!(
            (from, to),
            (GamePhase::Initial, GamePhase::Waiting)
                | (GamePhase::Waiting, GamePhase::EarlyClick)
                | (GamePhase::Waiting, GamePhase::Ready)
                | (GamePhase::EarlyClick, GamePhase::Waiting)
                | (GamePhase::Ready, GamePhase::Result)
                | (GamePhase::Result, GamePhase::Waiting)
        )
    }

    /// Move to `to`, then notify every listener in subscription order.
    ///
    /// Listener failures are logged and do not stop the remaining listeners.
    pub fn transition(&mut self, to: GamePhase) -> Result<()> {
        let from = self.current;
        if !Self::is_valid_transition(from, to) {
            return Err(Error::IllegalTransition { from, to });
        }

        self.current = to;
        debug!("Phase changed: {} -> {}", from, to);

        for (id, listener) in self.listeners.iter_mut() {
            if let Err(e) = listener(to) {
                warn!("Phase listener {:?} failed on {}: {:#}", id, to, e);
            }
        }
        Ok(())
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(GamePhase) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Put the phase back to `Initial` outside the transition table.
    ///
    /// Listeners are kept and not notified.
    pub fn reset(&mut self) {
        if self.current != GamePhase::Initial {
            debug!("Phase reset: {} -> {}", self.current, GamePhase::Initial);
        }
        self.current = GamePhase::Initial;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use strum::IntoEnumIterator;

    const TABLE: [(GamePhase, GamePhase); 6] = [
        (GamePhase::Initial, GamePhase::Waiting),
        (GamePhase::Waiting, GamePhase::EarlyClick),
        (GamePhase::Waiting, GamePhase::Ready),
        (GamePhase::EarlyClick, GamePhase::Waiting),
        (GamePhase::Ready, GamePhase::Result),
        (GamePhase::Result, GamePhase::Waiting),
    ];

    fn machine_in(phase: GamePhase) -> StateMachine {
        let mut machine = StateMachine::new();
        machine.current = phase;
        machine
    }

    #[test]
    fn test_starts_initial() {
        assert_eq!(StateMachine::new().current(), GamePhase::Initial);
    }

    #[test]
    fn test_illegal_transitions_leave_phase_unchanged() {
        for from in GamePhase::iter() {
            for to in GamePhase::iter() {
                if TABLE.contains(&(from, to)) {
                    continue;
                }
                let mut machine = machine_in(from);
                let calls = Rc::new(RefCell::new(0));
                let seen = Rc::clone(&calls);
                machine.subscribe(move |_| {
                    *seen.borrow_mut() += 1;
                    Ok(())
                });

                let err = machine.transition(to).unwrap_err();
                assert!(matches!(err, Error::IllegalTransition { .. }));
                assert_eq!(machine.current(), from, "{from} -> {to}");
                assert_eq!(*calls.borrow(), 0);
            }
        }
    }

    #[test]
    fn test_legal_transitions_notify_in_order() {
        for (from, to) in TABLE {
            let mut machine = machine_in(from);
            let log = Rc::new(RefCell::new(Vec::new()));
            for n in 0..3 {
                let log = Rc::clone(&log);
                machine.subscribe(move |phase| {
                    log.borrow_mut().push((n, phase));
                    Ok(())
                });
            }

            machine.transition(to).unwrap();
            assert_eq!(machine.current(), to);
            assert_eq!(*log.borrow(), vec![(0, to), (1, to), (2, to)]);
        }
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        let mut machine = StateMachine::new();
        let reached = Rc::new(RefCell::new(false));
        machine.subscribe(|_| anyhow::bail!("listener broke"));
        let flag = Rc::clone(&reached);
        machine.subscribe(move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        assert!(machine.transition(GamePhase::Waiting).is_ok());
        assert!(*reached.borrow());
        assert_eq!(machine.current(), GamePhase::Waiting);
    }

    #[test]
    fn test_unsubscribe() {
        let mut machine = StateMachine::new();
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        let id = machine.subscribe(move |_| {
            *seen.borrow_mut() += 1;
            Ok(())
        });

        assert!(machine.unsubscribe(id));
        assert!(!machine.unsubscribe(id));
        machine.transition(GamePhase::Waiting).unwrap();
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(machine.listener_count(), 0);
    }

    #[test]
    fn test_reset_keeps_listeners() {
        let mut machine = machine_in(GamePhase::Result);
        machine.subscribe(|_| Ok(()));
        machine.reset();
        assert_eq!(machine.current(), GamePhase::Initial);
        assert_eq!(machine.listener_count(), 1);
    }
}

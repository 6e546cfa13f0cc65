//! Timestamps and single-slot delayed events.
//!
//! The clock never runs callbacks itself. Arming stores a payload together with
//! a deadline, and the owner drains it with [`Clock::take_due`] from its event
//! loop. Every arming produces a fresh [`TimerToken`], so the owner can tell a
//! stale firing apart from the one it is waiting for.

use std::cell::Cell;
use std::ops::Sub;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

/// Point in time in milliseconds, with sub-millisecond fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn as_millis(self) -> f64 {
        self.0
    }

    pub fn after(self, delay: Duration) -> Self {
        Self(self.0 + duration_millis(delay))
    }
}

/// Elapsed milliseconds between two timestamps.
impl Sub for Timestamp {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.0 - rhs.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}ms", self.0)
    }
}

/// Milliseconds in `d`, exact down to the microsecond.
pub fn duration_millis(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

pub trait TimeSource {
    fn now(&self) -> Timestamp;
}

/// Process-local monotonic time, measured from construction.
///
/// Falls back to wall-clock time only when the monotonic origin is not
/// available, which is reported once.
#[derive(Debug, Clone)]
pub struct MonotonicSource {
    origin: Option<Instant>,
    last: Cell<f64>,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self {
            origin: Some(Instant::now()),
            last: Cell::new(0.0),
        }
    }

    /// Wall-clock source. Readings are clamped so they never go backwards.
    pub fn wall_clock() -> Self {
        warn!("Using wall-clock time; reaction times may drift on clock adjustments");
        Self {
            origin: None,
            last: Cell::new(0.0),
        }
    }

    pub fn is_monotonic(&self) -> bool {
        self.origin.is_some()
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    fn now(&self) -> Timestamp {
        let raw = match self.origin {
            Some(origin) => origin.elapsed().as_secs_f64() * 1000.0,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64() * 1000.0)
                .unwrap_or(0.0),
        };
        let value = raw.max(self.last.get());
        self.last.set(value);
        Timestamp(value)
    }
}

/// Virtual time that only moves when advanced.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the game.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    now: Rc<Cell<f64>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(millis: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + duration_millis(by));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}

/// Identity of one arming of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A delayed event whose deadline has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub token: TimerToken,
    pub deadline: Timestamp,
    pub payload: T,
}

#[derive(Debug)]
struct Armed<T> {
    token: TimerToken,
    deadline: Timestamp,
    payload: T,
}

/// Time source plus one pending delayed event.
#[derive(Debug)]
pub struct Clock<S, T> {
    source: S,
    armed: Option<Armed<T>>,
    next_token: u64,
}

impl<S: TimeSource, T> Clock<S, T> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            armed: None,
            next_token: 0,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.source.now()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Arm `payload` to fire once `delay` has elapsed.
    ///
    /// Replaces any event that is still pending.
    pub fn schedule_after(&mut self, delay: Duration, payload: T) -> TimerToken {
        if self.armed.is_some() {
            debug!("Replacing pending timer");
        }
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let deadline = self.now().after(delay);
        debug!("Timer {:?} armed for {:?} (deadline {})", token, delay, deadline);
        self.armed = Some(Armed {
            token,
            deadline,
            payload,
        });
        token
    }

    /// Drop the pending event, if any. No-op otherwise.
    pub fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            debug!("Timer {:?} cancelled", armed.token);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn pending_token(&self) -> Option<TimerToken> {
        self.armed.as_ref().map(|a| a.token)
    }

    /// Time left until the pending event is due.
    pub fn time_until_due(&self) -> Option<Duration> {
        let armed = self.armed.as_ref()?;
        let remaining = (armed.deadline - self.now()).max(0.0);
        Some(Duration::from_micros((remaining * 1000.0).round() as u64))
    }

    /// Take the pending event if its deadline has passed.
    ///
    /// Once taken it can no longer be cancelled.
    pub fn take_due(&mut self) -> Option<Fired<T>> {
        let now = self.now();
        match &self.armed {
            Some(armed) if armed.deadline <= now => {}
            _ => return None,
        }
        let armed = self.armed.take()?;
        debug!("Timer {:?} fired at {}", armed.token, now);
        Some(Fired {
            token: armed.token,
            deadline: armed.deadline,
            payload: armed.payload,
        })
    }
}

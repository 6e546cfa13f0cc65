//! Terminal presentation surface.
//!
//! Keeps the last state pushed by the game and redraws the whole screen on
//! every change. Draw failures are logged and otherwise ignored.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use owo_colors::OwoColorize;
use reflex_core::{Presenter, RatingTier, Rgb};
use tracing::warn;

const PANEL_LEFT: u16 = 2;
const PANEL_TOP: u16 = 3;
const PANEL_WIDTH: u16 = 40;
const PANEL_HEIGHT: u16 = 12;

const IDLE_LABEL: &str = "CLICK TO START";

/// Raw mode + alternate screen for the lifetime of the guard.
pub struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        Self::enter_with(
            terminal::enable_raw_mode,
            || execute!(io::stdout(), EnterAlternateScreen, Hide),
            restore_terminal,
        )
    }

    /// The guard exists as soon as `enable` succeeds, so a failing `prepare`
    /// still runs `restore`.
    fn enter_with(
        enable: impl FnOnce() -> io::Result<()>,
        prepare: impl FnOnce() -> io::Result<()>,
        restore: fn(),
    ) -> io::Result<Self> {
        enable()?;
        let guard = Self { restore };
        prepare()?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    let _ = execute!(io::stdout(), DisableMouseCapture, Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Color for a tier, from green (fastest) to red (slowest).
pub fn tier_color(rank: usize, count: usize) -> (u8, u8, u8) {
    if count <= 1 {
        return (46, 204, 113);
    }
    let t = rank.min(count - 1) as f64 / (count - 1) as f64;
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    (lerp(46, 231), lerp(204, 76), lerp(113, 60))
}

pub struct TerminalPresenter {
    out: Stdout,
    color: Rgb,
    idle: bool,
    instructions: bool,
    message: Option<String>,
    result: Option<String>,
    tier_count: usize,
}

impl TerminalPresenter {
    /// `tier_count` is the size of the rating scheme, used to pick result colors
    pub fn new(tier_count: usize) -> Self {
        Self {
            out: io::stdout(),
            color: Rgb::new(0, 0, 0),
            idle: false,
            instructions: false,
            message: None,
            result: None,
            tier_count,
        }
    }

    /// Whether a terminal cell lies on the colored panel
    pub fn panel_contains(&self, column: u16, row: u16) -> bool {
        (PANEL_LEFT..PANEL_LEFT + PANEL_WIDTH).contains(&column)
            && (PANEL_TOP..PANEL_TOP + PANEL_HEIGHT).contains(&row)
    }

    pub fn redraw(&mut self) {
        if let Err(e) = self.draw() {
            warn!("Failed to draw screen: {}", e);
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(PANEL_LEFT, 1))?;
        queue!(self.out, Print("Reflex - reaction time test".bold()))?;

        let background = Color::Rgb {
            r: self.color.r,
            g: self.color.g,
            b: self.color.b,
        };
        let blank = " ".repeat(PANEL_WIDTH as usize);
        for row in 0..PANEL_HEIGHT {
            queue!(
                self.out,
                MoveTo(PANEL_LEFT, PANEL_TOP + row),
                SetBackgroundColor(background),
                Print(&blank)
            )?;
        }
        if self.idle {
            let column = PANEL_LEFT + (PANEL_WIDTH - IDLE_LABEL.len() as u16) / 2;
            queue!(
                self.out,
                MoveTo(column, PANEL_TOP + PANEL_HEIGHT / 2),
                Print(IDLE_LABEL.bold())
            )?;
        }
        queue!(self.out, ResetColor)?;

        let mut line = PANEL_TOP + PANEL_HEIGHT + 1;
        if let Some(result) = &self.result {
            queue!(self.out, MoveTo(PANEL_LEFT, line), Print(result))?;
            line += 1;
        }
        if let Some(message) = &self.message {
            queue!(self.out, MoveTo(PANEL_LEFT, line), Print(message))?;
            line += 1;
        }
        if self.instructions {
            line += 1;
            for text in [
                "Wait for the panel to change color, then click it",
                "(or press Space/Enter) as fast as you can.",
            ] {
                queue!(self.out, MoveTo(PANEL_LEFT, line), Print(text.dimmed()))?;
                line += 1;
            }
        }
        queue!(
            self.out,
            MoveTo(PANEL_LEFT, line + 1),
            Print("click/space: play   r: reset   q: quit".dimmed())
        )?;
        self.out.flush()
    }
}

impl Presenter for TerminalPresenter {
    fn set_color(&mut self, color: Rgb) {
        self.color = color;
        self.redraw();
    }

    fn set_idle_style(&mut self, on: bool) {
        self.idle = on;
        if !on {
            self.instructions = false;
        }
        self.redraw();
    }

    fn show_instructions(&mut self) {
        self.instructions = true;
        self.redraw();
    }

    fn show_message(&mut self, text: &str) {
        self.message = Some(text.to_string());
        self.redraw();
    }

    fn clear_message(&mut self) {
        self.message = None;
        self.redraw();
    }

    fn show_result(&mut self, reaction_ms: f64, tier: &RatingTier, rank: usize) {
        let (r, g, b) = tier_color(rank, self.tier_count);
        self.result = Some(format!(
            "Reaction time: {} - {}  {}",
            format!("{:.1} ms", reaction_ms).bold(),
            tier.label.truecolor(r, g, b).bold(),
            tier.feedback.italic()
        ));
        self.redraw();
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.redraw();
    }

    fn attach_click_listener(&mut self) {
        if let Err(e) = execute!(self.out, EnableMouseCapture) {
            warn!("Mouse capture unavailable, use Space/Enter to click: {}", e);
        }
    }
}

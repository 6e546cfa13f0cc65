//! Interactive game mode.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use owo_colors::OwoColorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reflex_core::{Game, GameConfig, MonotonicSource, SessionStats};
use tracing::{debug, info};

use crate::cues::TerminalBell;
use crate::terminal::{TerminalGuard, TerminalPresenter};

/// Longest wait for input when no timer is close.
const IDLE_POLL: Duration = Duration::from_millis(250);

type TerminalGame = Game<MonotonicSource, TerminalPresenter, StdRng>;

/// Run the interactive game until the player quits.
pub fn run(config: GameConfig, seed: Option<u64>, bell: bool, json: bool) -> Result<()> {
    let rng = match seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let tier_count = config.rating.scheme()?.len();
    let mut game = Game::new(
        Arc::new(config),
        MonotonicSource::new(),
        TerminalPresenter::new(tier_count),
        rng,
    )
    .context("failed to set up the game")?;
    if bell {
        game = game.with_audio(TerminalBell::new());
    }

    let guard = TerminalGuard::enter().context("failed to prepare the terminal")?;
    game.initialize();
    let result = event_loop(&mut game);
    drop(guard);

    print_summary(game.stats(), json)?;
    result
}

fn event_loop(game: &mut TerminalGame) -> Result<()> {
    loop {
        let timeout = game
            .time_until_next_timer()
            .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char(' ') | KeyCode::Enter => game.handle_click()?,
                    KeyCode::Char('r') => game.reset(),
                    _ => {}
                },
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    if game.presenter().panel_contains(column, row) {
                        game.handle_click()?;
                    } else {
                        debug!("Click outside the panel at ({}, {})", column, row);
                    }
                }
                Event::Resize(..) => game.presenter_mut().redraw(),
                _ => {}
            }
        }

        game.tick()?;
    }
    Ok(())
}

fn print_summary(stats: &SessionStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        print!("{}", format_summary(stats));
    }
    Ok(())
}

fn format_summary(stats: &SessionStats) -> String {
    let fmt_ms = |ms: Option<f64>| ms.map_or("-".to_string(), |ms| format!("{:.1} ms", ms));
    let mut out = format!("{}\n", "Session summary".bold());
    out += &format!(
        "  Rounds    : {} started, {} completed\n",
        stats.rounds_started, stats.rounds_completed
    );
    out += &format!("  Early     : {}\n", stats.early_clicks);
    out += &format!("  Anomalies : {}\n", stats.anomalies);
    out += &format!("  Best      : {}\n", fmt_ms(stats.best_ms).green());
    out += &format!("  Average   : {}\n", fmt_ms(stats.mean_ms));
    out += &format!("  Last      : {}\n", fmt_ms(stats.last_ms));
    out
}

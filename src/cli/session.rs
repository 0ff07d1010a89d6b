//! Interactive terminal session driving one countdown.
//!
//! Timer events arrive over a [`ChannelListener`] channel; keyboard controls
//! are read line by line on a plain thread, since a blocking stdin read inside
//! the runtime would keep it from shutting down.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use super::commands::RunArgs;
use super::display::Display;
use crate::timer::{ChannelListener, CountdownTimer, TimerEvent, TokioScheduler};

// ============================================================================
// Control
// ============================================================================

/// A keyboard control entered during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// `p`: pause the countdown
    Pause,
    /// `r`: resume from the paused time
    Resume,
    /// `s`: restart from the configured duration
    Restart,
    /// `q`: leave the session
    Quit,
}

impl Control {
    /// Parses one input line. Returns `None` for anything unrecognized.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "s" | "start" | "restart" => Some(Self::Restart),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The countdown reached 0:00
    Finished,
    /// The user quit first
    Quit,
}

// ============================================================================
// Session
// ============================================================================

/// Spawns a thread forwarding stdin lines. The thread is detached.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("countdown-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        debug!("stdin reader unavailable: {}", e);
    }
    rx
}

/// Applies one control to the timer. Returns true if the session should end.
fn apply_control(timer: &CountdownTimer, control: Control) -> bool {
    match control {
        Control::Pause => {
            timer.pause();
            Display::show_paused(
                timer.minutes_till_count_down(),
                timer.seconds_till_count_down(),
            );
        }
        Control::Resume => {
            Display::show_resumed();
            timer.start(true);
        }
        Control::Restart => {
            Display::show_restarted();
            timer.start(false);
        }
        Control::Quit => return true,
    }
    debug!("Control {:?} applied, timer {}", control, timer.phase().as_str());
    false
}

/// Runs a countdown in the terminal until it finishes or the user quits.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the timer cannot be created.
pub async fn run(args: &RunArgs) -> Result<SessionOutcome> {
    let config = args.to_config()?;
    config.validate()?;

    let (listener, mut events) = ChannelListener::new();
    let scheduler = TokioScheduler::current()?;
    let timer = CountdownTimer::from_config(&config, Arc::new(listener), Arc::new(scheduler))
        .context("タイマーの作成に失敗しました")?;

    let mut controls = spawn_stdin_reader();
    let mut controls_open = true;

    Display::show_controls();
    timer.start(false);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(TimerEvent::Active { time }) => Display::show_tick(&time),
                Some(TimerEvent::Finished) => {
                    Display::show_finished();
                    return Ok(SessionOutcome::Finished);
                }
                // The timer holds the sender, so this only happens on teardown.
                None => return Ok(SessionOutcome::Quit),
            },
            line = controls.recv(), if controls_open => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match Control::parse(&line) {
                    Some(control) => {
                        if apply_control(&timer, control) {
                            Display::show_quit();
                            return Ok(SessionOutcome::Quit);
                        }
                    }
                    None => Display::show_unknown_control(line.trim()),
                },
                None => {
                    debug!("stdin closed, controls disabled");
                    controls_open = false;
                }
            },
        }
    }
}

//! Countdown timer engine.
//!
//! This module provides the countdown itself:
//! - Start, resume and restart from the configured duration
//! - One pending tick at a time on the active execution context
//! - Listener notification per tick and once on finish
//! - A one-way move to a dedicated background thread

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, trace};
use uuid::Uuid;

use super::error::TimerError;
use super::listener::CountDownListener;
use super::pattern::TimePattern;
use super::scheduler::{ExecutionContext, Scheduler, TaskHandle, TokioScheduler};
use crate::types::{PatternStrictness, TickOutcome, TimerConfig, TimerPhase, TimerState};

#[derive(Debug, Clone, Copy)]
struct PendingTick {
    handle: TaskHandle,
    generation: u64,
}

struct Inner {
    state: TimerState,
    tick_interval: Duration,
    pattern: TimePattern,
    strictness: PatternStrictness,
    context: ExecutionContext,
    pending: Option<PendingTick>,
    generation: u64,
    started: bool,
}

impl Inner {
    fn formatted_time(&self) -> String {
        self.pattern.format(self.state.minutes, self.state.seconds)
    }

    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.context.scheduler().cancel(pending.handle);
                true
            }
            None => false,
        }
    }
}

struct Shared {
    id: Uuid,
    listener: Arc<dyn CountDownListener>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Schedules the next tick. The caller holds the lock and has cleared `pending`.
    fn schedule_tick(self: &Arc<Self>, inner: &mut Inner) {
        inner.generation += 1;
        let generation = inner.generation;
        let shared = Arc::downgrade(self);

        let handle = inner.context.scheduler().schedule_after(
            inner.tick_interval,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.on_tick(generation);
                }
            }),
        );

        inner.pending = Some(PendingTick { handle, generation });
    }

    fn on_tick(self: &Arc<Self>, generation: u64) {
        let time = {
            let mut inner = self.lock();

            // A tick dispatched before pause() or a reschedule must not count.
            if inner.pending.map(|pending| pending.generation) != Some(generation) {
                trace!(timer = %self.id, "Discarding stale tick");
                return;
            }
            inner.pending = None;

            match inner.state.tick() {
                TickOutcome::Finished => None,
                TickOutcome::Active => {
                    let time = inner.formatted_time();
                    self.schedule_tick(&mut inner);
                    Some(time)
                }
            }
        };

        match time {
            Some(time) => {
                trace!(timer = %self.id, time = %time, "Tick");
                self.listener.on_count_down_active(&time);
            }
            None => {
                info!(timer = %self.id, "Countdown finished");
                self.listener.on_count_down_finished();
            }
        }
    }
}

// ============================================================================
// CountdownTimer
// ============================================================================

/// A pausable countdown that reports the remaining time to a listener.
///
/// Ticks are scheduled on the caller's tokio runtime by default, or on any
/// [`Scheduler`] passed to [`CountdownTimer::with_scheduler`]. Each tick
/// takes one second off the remaining time, whatever the tick interval.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use countdown::timer::{CountdownTimer, ManualScheduler, MockListener};
///
/// let scheduler = ManualScheduler::new();
/// let listener = Arc::new(MockListener::new());
/// let timer =
///     CountdownTimer::with_scheduler(0, 2, 1, listener.clone(), Arc::new(scheduler.clone()))
///         .unwrap();
///
/// timer.start(false);
/// scheduler.advance_seconds(2);
///
/// assert_eq!(listener.active_times(), vec!["00:02", "00:01"]);
/// assert_eq!(listener.finished_count(), 1);
/// ```
pub struct CountdownTimer {
    shared: Arc<Shared>,
}

impl CountdownTimer {
    /// Creates a timer ticking on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidDuration` for a 0:00 duration and
    /// `TimerError::NoRuntime` outside a tokio runtime.
    pub fn new(
        minutes: u32,
        seconds: u32,
        tick_interval_seconds: u64,
        listener: Arc<dyn CountDownListener>,
    ) -> Result<Self, TimerError> {
        let state = TimerState::new(minutes, seconds)?;
        let scheduler = TokioScheduler::current()?;
        Ok(Self::build(
            state,
            tick_interval_seconds,
            listener,
            Arc::new(scheduler),
        ))
    }

    /// Creates a timer ticking on the given scheduler.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidDuration` for a 0:00 duration.
    pub fn with_scheduler(
        minutes: u32,
        seconds: u32,
        tick_interval_seconds: u64,
        listener: Arc<dyn CountDownListener>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, TimerError> {
        let state = TimerState::new(minutes, seconds)?;
        Ok(Self::build(
            state,
            tick_interval_seconds,
            listener,
            scheduler,
        ))
    }

    /// Creates a timer from a configuration, applying its pattern and context.
    ///
    /// An unacceptable pattern keeps the default one.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidDuration` for a 0:00 duration and
    /// `TimerError::ContextSpawn` if the background thread cannot be started.
    pub fn from_config(
        config: &TimerConfig,
        listener: Arc<dyn CountDownListener>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, TimerError> {
        let timer = Self::with_scheduler(
            config.minutes,
            config.seconds,
            config.tick_interval_seconds,
            listener,
            scheduler,
        )?;

        timer.set_pattern_strictness(config.pattern_strictness);
        timer.set_timer_pattern(&config.pattern);
        if config.background {
            timer.run_on_background_thread()?;
        }

        Ok(timer)
    }

    fn build(
        state: TimerState,
        tick_interval_seconds: u64,
        listener: Arc<dyn CountDownListener>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let id = Uuid::new_v4();
        let tick_interval = Duration::from_secs(tick_interval_seconds.max(1));

        debug!(
            timer = %id,
            minutes = state.minutes,
            seconds = state.seconds,
            interval = ?tick_interval,
            context = scheduler.label(),
            "Countdown timer created"
        );

        Self {
            shared: Arc::new(Shared {
                id,
                listener,
                inner: Mutex::new(Inner {
                    state,
                    tick_interval,
                    pattern: TimePattern::default(),
                    strictness: PatternStrictness::default(),
                    context: ExecutionContext::Default(scheduler),
                    pending: None,
                    generation: 0,
                    started: false,
                }),
            }),
        }
    }

    /// Starts or resumes the countdown.
    ///
    /// Without `resume` the remaining time rewinds to the configured duration
    /// and a finished countdown becomes runnable again. With `resume` it
    /// continues from where it stopped; a finished countdown stays finished
    /// and nothing is reported.
    ///
    /// The current time is reported immediately, on the calling thread.
    pub fn start(&self, resume: bool) {
        let time = {
            let mut inner = self.shared.lock();
            if !resume {
                inner.state.reset();
            }
            inner.started = true;
            inner.cancel_pending();

            if inner.state.finished {
                debug!(timer = %self.shared.id, "Resume ignored, countdown already finished");
                return;
            }

            let time = inner.formatted_time();
            self.shared.schedule_tick(&mut inner);
            time
        };

        debug!(timer = %self.shared.id, resume, time = %time, "Countdown started");
        self.shared.listener.on_count_down_active(&time);
    }

    /// Pauses the countdown. Remaining time is kept.
    pub fn pause(&self) {
        let mut inner = self.shared.lock();
        if inner.cancel_pending() {
            debug!(
                timer = %self.shared.id,
                minutes = inner.state.minutes,
                seconds = inner.state.seconds,
                "Countdown paused"
            );
        }
    }

    /// Applies a new display pattern for subsequent ticks.
    ///
    /// Patterns rejected under the current strictness are ignored.
    pub fn set_timer_pattern(&self, pattern: &str) {
        let mut inner = self.shared.lock();
        match TimePattern::parse(pattern, inner.strictness) {
            Some(parsed) => {
                debug!(timer = %self.shared.id, pattern = %parsed, "Timer pattern applied");
                inner.pattern = parsed;
            }
            None => {
                debug!(
                    timer = %self.shared.id,
                    pattern,
                    strictness = ?inner.strictness,
                    "Timer pattern ignored"
                );
            }
        }
    }

    /// Selects how later `set_timer_pattern` calls are validated.
    pub fn set_pattern_strictness(&self, strictness: PatternStrictness) {
        self.shared.lock().strictness = strictness;
    }

    /// Permanently moves ticking and listener calls to a background thread.
    ///
    /// Calling it again is a no-op. A pending tick is moved to the new thread
    /// and its interval starts over.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::ContextSpawn` if the thread cannot be started.
    pub fn run_on_background_thread(&self) -> Result<(), TimerError> {
        let mut inner = self.shared.lock();
        if inner.context.is_dedicated() {
            debug!(timer = %self.shared.id, "Already running on background thread");
            return Ok(());
        }

        let previous = Arc::clone(inner.context.scheduler());
        let name = format!("CountdownTimer-{}", self.shared.id.simple());
        inner.context.switch_to_dedicated(&name)?;

        if let Some(pending) = inner.pending.take() {
            previous.cancel(pending.handle);
            self.shared.schedule_tick(&mut inner);
        }

        info!(timer = %self.shared.id, thread = %name, "Countdown moved to background thread");
        Ok(())
    }

    /// Returns the remaining minutes.
    pub fn minutes_till_count_down(&self) -> u32 {
        self.shared.lock().state.minutes
    }

    /// Returns the remaining seconds.
    pub fn seconds_till_count_down(&self) -> u32 {
        self.shared.lock().state.seconds
    }

    /// Returns the remaining time rendered with the active pattern.
    pub fn formatted_time(&self) -> String {
        self.shared.lock().formatted_time()
    }

    /// Returns the active display pattern.
    pub fn timer_pattern(&self) -> String {
        self.shared.lock().pattern.as_str().to_string()
    }

    pub fn phase(&self) -> TimerPhase {
        let inner = self.shared.lock();
        if inner.state.finished {
            TimerPhase::Finished
        } else if inner.pending.is_some() {
            TimerPhase::Running
        } else if inner.started {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    pub fn is_finished(&self) -> bool {
        self.shared.lock().state.finished
    }

    pub fn is_running_on_background(&self) -> bool {
        self.shared.lock().context.is_dedicated()
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.lock().tick_interval
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if inner.cancel_pending() {
            trace!(timer = %self.shared.id, "Pending tick cancelled on drop");
        }
    }
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("CountdownTimer")
            .field("id", &self.shared.id)
            .field("minutes", &inner.state.minutes)
            .field("seconds", &inner.state.seconds)
            .field("finished", &inner.state.finished)
            .field("pattern", &inner.pattern.as_str())
            .field("context", &inner.context)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

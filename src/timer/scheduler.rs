//! Execution contexts for countdown ticks.
//!
//! A [`Scheduler`] runs a task after a delay on one execution context and can
//! cancel it before it fires. Three implementations exist:
//! - [`TokioScheduler`]: the caller's tokio runtime (the default context)
//! - [`DedicatedScheduler`]: a thread of its own driving a current-thread runtime
//! - [`ManualScheduler`]: a virtual clock advanced by hand, for tests
//!
//! [`ExecutionContext`] records which one a timer uses. It only ever moves
//! from `Default` to `Dedicated`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::error::TimerError;

/// A unit of work scheduled on an execution context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Runs tasks after a delay on one execution context.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run once after `delay`.
    fn schedule_after(&self, delay: Duration, task: Task) -> TaskHandle;

    /// Cancels a task that has not fired yet. Unknown or fired handles are ignored.
    fn cancel(&self, handle: TaskHandle);

    /// Creates a new independent context named `name`.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::ContextSpawn` if the context cannot be started.
    fn create_dedicated(&self, name: &str) -> Result<Arc<dyn Scheduler>, TimerError>;

    /// Short name used in log output.
    fn label(&self) -> &'static str;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Adds two instants on the virtual clock, pinning at `Duration::MAX`.
fn saturating_add(now: Duration, delay: Duration) -> Duration {
    now.checked_add(delay).unwrap_or(Duration::MAX)
}

// ============================================================================
// TokioScheduler
// ============================================================================

/// Schedules tasks on a tokio runtime.
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<u64, AbortHandle>>>,
    label: &'static str,
}

impl TokioScheduler {
    /// Creates a scheduler spawning onto the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self::with_label(runtime, "default")
    }

    fn with_label(runtime: Handle, label: &'static str) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            label,
        }
    }

    /// Creates a scheduler for the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoRuntime` outside a tokio runtime.
    pub fn current() -> Result<Self, TimerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| TimerError::NoRuntime)
    }

    /// Returns the number of tasks that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(&self.tasks);

        // Hold the map while spawning so the task cannot look itself up first.
        let mut pending = lock(&self.tasks);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let claimed = lock(&tasks).remove(&id).is_some();
            if claimed {
                task();
            }
        });
        pending.insert(id, join.abort_handle());

        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        if let Some(abort) = lock(&self.tasks).remove(&handle.0) {
            abort.abort();
        }
    }

    fn create_dedicated(&self, name: &str) -> Result<Arc<dyn Scheduler>, TimerError> {
        Ok(Arc::new(DedicatedScheduler::spawn(name)?))
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

// ============================================================================
// DedicatedScheduler
// ============================================================================

/// A background thread running its own current-thread tokio runtime.
///
/// The thread lives until the scheduler is dropped. Dropping only signals
/// shutdown; it does not join, since the last reference may be released
/// from a task running on this very thread.
pub struct DedicatedScheduler {
    inner: TokioScheduler,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl DedicatedScheduler {
    /// Starts the background thread.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::ContextSpawn` if the runtime or thread cannot be created.
    pub fn spawn(name: &str) -> Result<Self, TimerError> {
        let runtime = Builder::new_current_thread().enable_time().build()?;
        let handle = runtime.handle().clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
            })?;

        info!("Dedicated timer thread started: {}", name);

        Ok(Self {
            inner: TokioScheduler::with_label(handle, "dedicated"),
            shutdown_tx: Some(shutdown_tx),
        })
    }
}

impl Scheduler for DedicatedScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> TaskHandle {
        self.inner.schedule_after(delay, task)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.inner.cancel(handle);
    }

    fn create_dedicated(&self, name: &str) -> Result<Arc<dyn Scheduler>, TimerError> {
        Ok(Arc::new(DedicatedScheduler::spawn(name)?))
    }

    fn label(&self) -> &'static str {
        self.inner.label()
    }
}

impl Drop for DedicatedScheduler {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            debug!("Dedicated timer thread signalled to stop");
        }
    }
}

// ============================================================================
// ManualScheduler
// ============================================================================

struct ManualEntry {
    id: u64,
    due: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    queue: Vec<ManualEntry>,
    dedicated_created: usize,
}

/// Virtual-clock scheduler for testing.
///
/// Nothing fires until [`ManualScheduler::advance`] moves the clock. Tasks
/// run on the thread calling `advance`. Dedicated contexts created from it
/// share the same clock and queue.
#[derive(Clone)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
    label: &'static str,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState::default())),
            label: "manual",
        }
    }

    /// Moves the clock forward, running every task that falls due in order.
    ///
    /// Tasks scheduled while advancing fire too if they fall inside the window.
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = saturating_add(lock(&self.state).now, by);
        let mut fired = 0;

        loop {
            let next = {
                let mut state = lock(&self.state);
                let position = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.due <= target)
                    .min_by_key(|(_, entry)| (entry.due, entry.id))
                    .map(|(position, _)| position);
                position.map(|position| {
                    let entry = state.queue.remove(position);
                    state.now = entry.due;
                    entry.task
                })
            };

            match next {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => break,
            }
        }

        lock(&self.state).now = target;
        fired
    }

    /// Advances the clock one second at a time, `seconds` times.
    pub fn advance_seconds(&self, seconds: u64) -> usize {
        (0..seconds)
            .map(|_| self.advance(Duration::from_secs(1)))
            .sum()
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Duration {
        lock(&self.state).now
    }

    /// Returns the number of tasks waiting to fire.
    pub fn pending_count(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Returns how many dedicated contexts were created from this clock.
    pub fn dedicated_count(&self) -> usize {
        lock(&self.state).dedicated_created
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> TaskHandle {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        let due = saturating_add(state.now, delay);
        state.queue.push(ManualEntry { id, due, task });
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        lock(&self.state).queue.retain(|entry| entry.id != handle.0);
    }

    fn create_dedicated(&self, name: &str) -> Result<Arc<dyn Scheduler>, TimerError> {
        lock(&self.state).dedicated_created += 1;
        debug!("Manual dedicated context created: {}", name);
        Ok(Arc::new(Self {
            state: Arc::clone(&self.state),
            label: "manual-dedicated",
        }))
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

// ============================================================================
// ExecutionContext
// ============================================================================

/// The context a timer schedules its ticks on.
#[derive(Clone)]
pub enum ExecutionContext {
    /// The scheduler supplied at construction
    Default(Arc<dyn Scheduler>),
    /// A dedicated context created by `run_on_background_thread`
    Dedicated(Arc<dyn Scheduler>),
}

impl ExecutionContext {
    /// Returns the scheduler of the active context.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        match self {
            Self::Default(scheduler) | Self::Dedicated(scheduler) => scheduler,
        }
    }

    /// Returns true once switched to a dedicated context.
    pub fn is_dedicated(&self) -> bool {
        matches!(self, Self::Dedicated(_))
    }

    /// Moves from `Default` to a freshly created `Dedicated` context.
    ///
    /// Returns `Ok(false)` without creating anything if already dedicated.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::ContextSpawn` if the dedicated context cannot be started.
    pub fn switch_to_dedicated(&mut self, name: &str) -> Result<bool, TimerError> {
        match self {
            Self::Dedicated(_) => Ok(false),
            Self::Default(scheduler) => {
                let dedicated = scheduler.create_dedicated(name)?;
                *self = Self::Dedicated(dedicated);
                Ok(true)
            }
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(scheduler) => f.debug_tuple("Default").field(&scheduler.label()).finish(),
            Self::Dedicated(scheduler) => {
                f.debug_tuple("Dedicated").field(&scheduler.label()).finish()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Countdown timer module.
//!
//! This module contains the timer and its collaborators:
//! - `countdown`: the countdown engine with pause, resume and restart
//! - `scheduler`: execution contexts that run delayed ticks
//! - `listener`: the callback capability and its channel and mock implementations
//! - `pattern`: display patterns for the remaining time
//! - `error`: construction errors

pub mod countdown;
pub mod error;
pub mod listener;
pub mod pattern;
pub mod scheduler;

pub use countdown::CountdownTimer;
pub use error::TimerError;
pub use listener::{ChannelListener, CountDownListener, MockListener, TimerEvent};
pub use pattern::{TimePattern, DEFAULT_PATTERN, STRICT_PATTERNS};
pub use scheduler::{
    DedicatedScheduler, ExecutionContext, ManualScheduler, Scheduler, Task, TaskHandle,
    TokioScheduler,
};

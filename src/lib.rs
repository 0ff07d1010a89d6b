//! Countdown Timer Library
//!
//! This library provides a pausable countdown timer and its terminal runner.
//! It includes:
//! - Countdown engine with start, pause, resume and restart
//! - Tokio, dedicated-thread and manual schedulers for ticks
//! - Listener capability with channel and mock implementations
//! - Display patterns for the remaining time
//! - Type definitions for configuration and state
//! - CLI command parsing and display utilities

pub mod cli;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use timer::{
    ChannelListener, CountDownListener, CountdownTimer, ManualScheduler, MockListener, Scheduler,
    TimePattern, TimerError, TimerEvent, TokioScheduler,
};
pub use types::{PatternStrictness, TimerConfig, TimerPhase, TimerState};

//! Core data types for the countdown timer.
//!
//! This module defines the data structures used for:
//! - Timer phase reporting
//! - Countdown state with its tick and rollover rules
//! - Timer configuration with validation

use serde::{Deserialize, Serialize};

use crate::timer::TimerError;

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of a countdown timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Constructed, never started
    Idle,
    /// A tick is pending
    Running,
    /// Started before, no tick pending, not finished
    Paused,
    /// Reached 0:00; only a non-resume start leaves this phase
    Finished,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Finished => "finished",
        }
    }
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

// ============================================================================
// PatternStrictness
// ============================================================================

/// How `set_timer_pattern` validates new display patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStrictness {
    /// Only `mm:ss`, `m:s`, `mm`, `ss`, `m` and `s` are accepted
    #[default]
    Strict,
    /// Any non-blank pattern built from hour, minute and second tokens
    Loose,
}

// ============================================================================
// TimerState
// ============================================================================

/// Result of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains; the countdown continues
    Active,
    /// The countdown reached 0:00
    Finished,
}

/// Remaining time and finished flag of one countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Configured minutes
    pub initial_minutes: u32,
    /// Configured seconds, after normalization
    pub initial_seconds: u32,
    /// Remaining minutes
    pub minutes: u32,
    /// Remaining seconds (0-59)
    pub seconds: u32,
    /// Whether the countdown has reached 0:00
    pub finished: bool,
}

impl TimerState {
    /// Creates a new state positioned at the configured duration.
    ///
    /// Seconds are normalized: a whole-minute duration keeps 0 seconds and
    /// anything above 59 becomes 59.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidDuration` for a 0:00 duration.
    pub fn new(minutes: u32, seconds: u32) -> Result<Self, TimerError> {
        if minutes == 0 && seconds == 0 {
            return Err(TimerError::InvalidDuration { minutes, seconds });
        }

        let seconds = seconds.min(59);

        Ok(Self {
            initial_minutes: minutes,
            initial_seconds: seconds,
            minutes,
            seconds,
            finished: false,
        })
    }

    /// Rewinds to the configured duration and clears the finished flag.
    pub fn reset(&mut self) {
        self.minutes = self.initial_minutes;
        self.seconds = self.initial_seconds;
        self.finished = false;
    }

    /// Advances the countdown by one second.
    ///
    /// An exhausted seconds field rolls over to 59 and takes one minute.
    pub fn tick(&mut self) -> TickOutcome {
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        }

        if self.is_zero() {
            self.finished = true;
            return TickOutcome::Finished;
        }

        TickOutcome::Active
    }

    /// Returns true if no time remains.
    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

fn default_seconds() -> u32 {
    10
}

fn default_tick_interval_seconds() -> u64 {
    1
}

fn default_pattern() -> String {
    crate::timer::DEFAULT_PATTERN.to_string()
}

/// Configuration for a countdown timer.
///
/// # Example
///
/// ```
/// use countdown::types::TimerConfig;
///
/// let config: TimerConfig = serde_json::from_str(r#"{ "minutes": 2 }"#).unwrap();
/// assert_eq!(config.minutes, 2);
/// assert_eq!(config.seconds, 10);
/// assert_eq!(config.tick_interval_seconds, 1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Minutes to count down from
    #[serde(default)]
    pub minutes: u32,
    /// Seconds to count down from
    #[serde(default = "default_seconds")]
    pub seconds: u32,
    /// Seconds between ticks (clamped to at least 1)
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,
    /// Display pattern for tick payloads
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Validation level for display patterns
    #[serde(default)]
    pub pattern_strictness: PatternStrictness,
    /// Whether to run ticks on a dedicated background thread
    #[serde(default)]
    pub background: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            minutes: 0,
            seconds: default_seconds(),
            tick_interval_seconds: default_tick_interval_seconds(),
            pattern: default_pattern(),
            pattern_strictness: PatternStrictness::default(),
            background: false,
        }
    }
}

impl TimerConfig {
    /// Sets the minutes to count down from.
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Sets the seconds to count down from.
    pub fn with_seconds(mut self, seconds: u32) -> Self {
        self.seconds = seconds;
        self
    }

    /// Sets the tick interval in seconds.
    pub fn with_tick_interval(mut self, seconds: u64) -> Self {
        self.tick_interval_seconds = seconds;
        self
    }

    /// Sets the display pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidDuration` for a 0:00 duration.
    pub fn validate(&self) -> Result<(), TimerError> {
        TimerState::new(self.minutes, self.seconds).map(|_| ())
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::Config` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, TimerError> {
        serde_json::from_str(json).map_err(|e| TimerError::Config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod timer_phase_tests {
        use super::*;

        #[test]
        fn test_default_is_idle() {
            assert_eq!(TimerPhase::default(), TimerPhase::Idle);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(TimerPhase::Idle.as_str(), "idle");
            assert_eq!(TimerPhase::Running.as_str(), "running");
            assert_eq!(TimerPhase::Paused.as_str(), "paused");
            assert_eq!(TimerPhase::Finished.as_str(), "finished");
        }

        #[test]
        fn test_serialize() {
            let json = serde_json::to_string(&TimerPhase::Finished).unwrap();
            assert_eq!(json, "\"finished\"");
        }
    }

    mod timer_state_tests {
        use super::*;

        #[test]
        fn test_new_state() {
            let state = TimerState::new(2, 30).unwrap();
            assert_eq!(state.minutes, 2);
            assert_eq!(state.seconds, 30);
            assert!(!state.finished);
        }

        #[test]
        fn test_zero_duration_rejected() {
            let result = TimerState::new(0, 0);
            assert!(matches!(
                result,
                Err(TimerError::InvalidDuration {
                    minutes: 0,
                    seconds: 0
                })
            ));
        }

        #[test]
        fn test_whole_minutes_keep_zero_seconds() {
            let state = TimerState::new(3, 0).unwrap();
            assert_eq!(state.initial_seconds, 0);
            assert_eq!(state.seconds, 0);
        }

        #[test]
        fn test_seconds_above_59_clamped() {
            let state = TimerState::new(0, 90).unwrap();
            assert_eq!(state.initial_seconds, 59);
            assert_eq!(state.seconds, 59);
        }

        #[test]
        fn test_tick_decrements_seconds() {
            let mut state = TimerState::new(0, 3).unwrap();
            assert_eq!(state.tick(), TickOutcome::Active);
            assert_eq!((state.minutes, state.seconds), (0, 2));
        }

        #[test]
        fn test_tick_rolls_over_minute() {
            let mut state = TimerState::new(1, 0).unwrap();
            assert_eq!(state.tick(), TickOutcome::Active);
            assert_eq!((state.minutes, state.seconds), (0, 59));
            assert!(!state.finished);
        }

        #[test]
        fn test_tick_finishes_at_zero() {
            let mut state = TimerState::new(0, 1).unwrap();
            assert_eq!(state.tick(), TickOutcome::Finished);
            assert!(state.finished);
            assert!(state.is_zero());
        }

        #[test]
        fn test_full_minute_countdown() {
            let mut state = TimerState::new(1, 0).unwrap();
            let ticks = (0..60)
                .take_while(|_| state.tick() == TickOutcome::Active)
                .count();
            assert_eq!(ticks, 59);
            assert!(state.finished);
        }

        #[test]
        fn test_reset() {
            let mut state = TimerState::new(1, 5).unwrap();
            state.tick();
            state.finished = true;

            state.reset();

            assert_eq!((state.minutes, state.seconds), (1, 5));
            assert!(!state.finished);
        }
    }

    mod timer_config_tests {
        use super::*;

        #[test]
        fn test_default_values() {
            let config = TimerConfig::default();
            assert_eq!(config.minutes, 0);
            assert_eq!(config.seconds, 10);
            assert_eq!(config.tick_interval_seconds, 1);
            assert_eq!(config.pattern, "mm:ss");
            assert_eq!(config.pattern_strictness, PatternStrictness::Strict);
            assert!(!config.background);
        }

        #[test]
        fn test_builder_pattern() {
            let config = TimerConfig::default()
                .with_minutes(5)
                .with_seconds(30)
                .with_tick_interval(2)
                .with_pattern("m:s");

            assert_eq!(config.minutes, 5);
            assert_eq!(config.seconds, 30);
            assert_eq!(config.tick_interval_seconds, 2);
            assert_eq!(config.pattern, "m:s");
        }

        #[test]
        fn test_validate() {
            assert!(TimerConfig::default().validate().is_ok());
            let config = TimerConfig::default().with_seconds(0);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_from_json_defaults() {
            let config = TimerConfig::from_json("{}").unwrap();
            assert_eq!(config, TimerConfig::default());
        }

        #[test]
        fn test_from_json_full() {
            let config = TimerConfig::from_json(
                r#"{
                    "minutes": 1,
                    "seconds": 5,
                    "tick_interval_seconds": 3,
                    "pattern": "hh:mm:ss",
                    "pattern_strictness": "loose",
                    "background": true
                }"#,
            )
            .unwrap();

            assert_eq!(config.minutes, 1);
            assert_eq!(config.seconds, 5);
            assert_eq!(config.tick_interval_seconds, 3);
            assert_eq!(config.pattern, "hh:mm:ss");
            assert_eq!(config.pattern_strictness, PatternStrictness::Loose);
            assert!(config.background);
        }

        #[test]
        fn test_from_json_malformed() {
            let result = TimerConfig::from_json("{ minutes: ");
            assert!(matches!(result, Err(TimerError::Config(_))));
        }
    }
}

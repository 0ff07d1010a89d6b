//! Countdown timer error types.
//!
//! Only construction and context creation can fail. Everything else the
//! timer does is in-memory, so bad patterns and redundant calls are absorbed
//! as no-ops instead of surfacing here.

use thiserror::Error;

/// Errors that can occur while building or configuring a countdown timer.
#[derive(Debug, Error)]
pub enum TimerError {
    /// The starting duration is 0:00.
    #[error("0:00 からはカウントダウンできません (minutes={minutes}, seconds={seconds})")]
    InvalidDuration {
        /// Configured minutes
        minutes: u32,
        /// Configured seconds
        seconds: u32,
    },

    /// The default execution context was requested outside a tokio runtime.
    #[error("tokioランタイムの外ではデフォルトのコンテキストを使用できません")]
    NoRuntime,

    /// The dedicated background context could not be created.
    #[error("バックグラウンドスレッドの起動に失敗しました: {0}")]
    ContextSpawn(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("設定ファイルの読み込みに失敗しました: {0}")]
    Config(String),
}

impl TimerError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. } => "1秒以上の時間を指定してください",
            Self::NoRuntime => "tokioランタイム内でタイマーを作成してください",
            Self::ContextSpawn(_) => "システムのスレッド数の上限を確認してください",
            Self::Config(_) => "設定ファイルのJSON形式を確認してください",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimerError::InvalidDuration {
            minutes: 0,
            seconds: 0,
        };
        assert!(err.to_string().contains("0:00"));
        assert!(err.to_string().contains("minutes=0"));

        let err = TimerError::Config("expected value at line 1".to_string());
        assert!(err.to_string().contains("expected value at line 1"));

        let err = TimerError::ContextSpawn(std::io::Error::other("no threads"));
        assert!(err.to_string().contains("no threads"));
    }

    #[test]
    fn test_suggestion() {
        let err = TimerError::InvalidDuration {
            minutes: 0,
            seconds: 0,
        };
        assert!(err.suggestion().contains("1秒以上"));
        assert!(TimerError::NoRuntime.suggestion().contains("tokio"));
        assert!(TimerError::Config("x".into()).suggestion().contains("JSON"));
    }

    #[test]
    fn test_from_io_error() {
        let err: TimerError = std::io::Error::other("spawn").into();
        assert!(matches!(err, TimerError::ContextSpawn(_)));
    }
}

//! Command definitions for the countdown CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::types::{PatternStrictness, TimerConfig};

// ============================================================================
// CLI Structure
// ============================================================================

/// Countdown timer CLI
#[derive(Parser, Debug)]
#[command(
    name = "countdown",
    version,
    about = "一時停止・再開できるシンプルなカウントダウンタイマー",
    long_about = "ターミナル上で動作するカウントダウンタイマー。\n\
                  実行中に p (一時停止)、r (再開)、s (最初から)、q (終了) を入力して操作できます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a countdown in the terminal
    Run(RunArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
///
/// Flags override values loaded from `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Minutes to count down from
    #[arg(short, long)]
    pub minutes: Option<u32>,

    /// Seconds to count down from (values above 59 become 59)
    #[arg(short, long)]
    pub seconds: Option<u32>,

    /// Seconds between ticks (minimum 1)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Display pattern, e.g. "mm:ss" or "s"
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Accept any pattern built from h, m and s tokens
    #[arg(long)]
    pub loose: bool,

    /// Tick on a dedicated background thread
    #[arg(short, long)]
    pub background: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Builds the timer configuration from the config file and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn to_config(&self) -> Result<TimerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).with_context(|| {
                    format!("設定ファイルを読み込めません: {}", path.display())
                })?;
                TimerConfig::from_json(&json)?
            }
            None => TimerConfig::default(),
        };

        if let Some(minutes) = self.minutes {
            config.minutes = minutes;
        }
        if let Some(seconds) = self.seconds {
            config.seconds = seconds;
        }
        if let Some(interval) = self.interval {
            config.tick_interval_seconds = interval;
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if self.loose {
            config.pattern_strictness = PatternStrictness::Loose;
        }
        if self.background {
            config.background = true;
        }

        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::parse_from(["countdown", "run"]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.minutes, None);
                assert_eq!(args.seconds, None);
                assert!(!args.loose);
                assert!(!args.background);
                assert_eq!(args.to_config().unwrap(), TimerConfig::default());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_with_options() {
        let cli = Cli::parse_from([
            "countdown",
            "run",
            "--minutes",
            "2",
            "--seconds",
            "30",
            "--interval",
            "2",
            "--pattern",
            "hh:mm:ss",
            "--loose",
            "--background",
        ]);
        match cli.command {
            Some(Commands::Run(args)) => {
                let config = args.to_config().unwrap();
                assert_eq!(config.minutes, 2);
                assert_eq!(config.seconds, 30);
                assert_eq!(config.tick_interval_seconds, 2);
                assert_eq!(config.pattern, "hh:mm:ss");
                assert_eq!(config.pattern_strictness, PatternStrictness::Loose);
                assert!(config.background);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::parse_from(["countdown", "run", "-m", "1", "-s", "5", "-p", "s", "-b"]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.minutes, Some(1));
                assert_eq!(args.seconds, Some(5));
                assert_eq!(args.pattern.as_deref(), Some("s"));
                assert!(args.background);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_rejects_negative_seconds() {
        let result = Cli::try_parse_from(["countdown", "run", "--seconds", "-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_verbose_global() {
        let cli = Cli::parse_from(["countdown", "run", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_config_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "minutes": 3, "seconds": 15, "pattern": "m:s" }}"#).unwrap();

        let args = RunArgs {
            seconds: Some(45),
            config: Some(file.path().to_path_buf()),
            ..RunArgs::default()
        };
        let config = args.to_config().unwrap();

        assert_eq!(config.minutes, 3);
        assert_eq!(config.seconds, 45);
        assert_eq!(config.pattern, "m:s");
    }

    #[test]
    fn test_missing_config_file() {
        let args = RunArgs {
            config: Some(PathBuf::from("/nonexistent/countdown.json")),
            ..RunArgs::default()
        };
        let err = args.to_config().unwrap_err();
        assert!(err.to_string().contains("設定ファイルを読み込めません"));
    }
}

//! Display utilities for the countdown CLI.
//!
//! This module provides formatted output for:
//! - Tick and finish notifications
//! - Control feedback (pause, resume, restart)
//! - Error messages

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the available keyboard controls.
    pub fn show_controls() {
        println!("操作: p=一時停止  r=再開  s=最初から  q=終了 (Enterで確定)");
    }

    /// Shows one tick.
    pub fn show_tick(time: &str) {
        println!("残り時間: {}", time);
    }

    /// Shows that the countdown has finished.
    pub fn show_finished() {
        println!("* カウントダウンが終了しました");
    }

    /// Shows a pause confirmation with the remaining time.
    pub fn show_paused(minutes: u32, seconds: u32) {
        println!("|| 一時停止しました (残り {}:{:02})", minutes, seconds);
    }

    /// Shows a resume confirmation.
    pub fn show_resumed() {
        println!("> 再開しました");
    }

    /// Shows a restart confirmation.
    pub fn show_restarted() {
        println!(">> 最初からやり直します");
    }

    /// Shows that the user quit before the countdown finished.
    pub fn show_quit() {
        println!("[] 終了しました");
    }

    /// Shows a hint for an unrecognized control.
    pub fn show_unknown_control(input: &str) {
        eprintln!("不明な操作です: {} (p/r/s/q)", input);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Shows a suggestion for resolving an error.
    pub fn show_hint(suggestion: &str) {
        eprintln!("ヒント: {}", suggestion);
    }
}

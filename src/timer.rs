//! Background pump loop and display formatting for the timer.

use crate::app::App;
use crate::models::TimerState;
use std::sync::{Mutex, Weak};
use std::thread;
use std::time::Duration;

/// How often renderers poll the timer for due alarms.
pub const PUMP_INTERVAL: Duration = Duration::from_millis(200);

/// Pumps the timer every `interval` until the app is dropped.
pub fn run_timer_loop(app: Weak<Mutex<App>>, interval: Duration) {
    loop {
        thread::sleep(interval);

        let Some(strong) = app.upgrade() else {
            return;
        };
        let Ok(mut guard) = strong.lock() else {
            return;
        };
        guard.timer.pump();
    }
}

/// Formats the tray title based on current timer state.
pub fn format_tray_title(state: &TimerState) -> String {
    let icon = match (state.is_running, state.mode.is_break()) {
        (true, true) => "☕",
        (true, false) => "🍅",
        (false, _) if state.remaining_secs == state.total_secs => return "🍅".to_string(),
        (false, _) => "⏸",
    };
    format!("{} {}", icon, format_time(state.remaining_secs))
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Formats accumulated focus minutes as `1h 5m` or `25m`.
pub fn format_focus_time(minutes: u32) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Renders `fraction` as a fixed-width bar with a percentage.
pub fn format_progress_bar(fraction: f64, width: usize) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * width as f64).round() as usize;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        (fraction * 100.0).round() as u32
    )
}

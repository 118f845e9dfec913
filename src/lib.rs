//! PomoChill - a calm Pomodoro timer.
//!
//! The session state machine lives in [`session`] and talks to renderers
//! through [`session::TimerEvent`]s. The terminal UI in [`tui`] works
//! everywhere; on macOS [`tray`] puts the timer in the menubar instead.

pub mod app;
pub mod audio;
pub mod event;
pub mod i18n;
pub mod menu;
pub mod messages;
pub mod models;
pub mod music;
pub mod notifications;
pub mod persistence;
pub mod scheduler;
pub mod session;
pub mod timer;
#[cfg(target_os = "macos")]
pub mod tray;
pub mod tui;

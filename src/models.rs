//! Data models for the PomoChill timer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// The kind of session being counted down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    /// Focus interval.
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionMode {
    pub const ALL: [SessionMode; 3] = [Self::Work, Self::ShortBreak, Self::LongBreak];

    /// Stable identifier, also used as the translation key of the mode label.
    pub fn key(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "shortBreak",
            Self::LongBreak => "longBreak",
        }
    }

    /// Returns true for both break kinds.
    pub fn is_break(self) -> bool {
        !matches!(self, Self::Work)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown session mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for SessionMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" | "focus" => Ok(Self::Work),
            "shortBreak" | "short" => Ok(Self::ShortBreak),
            "longBreak" | "long" => Ok(Self::LongBreak),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Snapshot of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub mode: SessionMode,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub is_running: bool,
}

impl TimerState {
    /// Creates an idle state with a full countdown for `mode`.
    pub fn idle(mode: SessionMode, durations: &DurationConfig) -> Self {
        let total_secs = durations.seconds(mode);
        Self {
            mode,
            remaining_secs: total_secs,
            total_secs,
            is_running: false,
        }
    }

    /// Fraction of the current session already elapsed.
    pub fn progress(&self) -> f64 {
        progress_fraction(self.total_secs, self.remaining_secs)
    }
}

/// Returns the elapsed share of a session, from 0.0 (untouched) to 1.0 (done).
pub fn progress_fraction(total_secs: u32, remaining_secs: u32) -> f64 {
    if total_secs == 0 {
        return 1.0;
    }
    let remaining = remaining_secs.min(total_secs);
    f64::from(total_secs - remaining) / f64::from(total_secs)
}

/// Rejected duration input. The previous configuration stays in effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Duration, Short break and Long break values must be numbers")]
    NotNumeric,
    #[error("Focus duration must be between 1 and 60 minutes")]
    WorkOutOfRange(i64),
    #[error("Short break must be between 1 and 30 minutes")]
    ShortBreakOutOfRange(i64),
    #[error("Long break must be between 1 and 60 minutes")]
    LongBreakOutOfRange(i64),
}

impl ConfigError {
    /// Translation key for the user-visible form of this error.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotNumeric => "errorNotNumber",
            Self::WorkOutOfRange(_) => "errorWorkRange",
            Self::ShortBreakOutOfRange(_) => "errorShortBreakRange",
            Self::LongBreakOutOfRange(_) => "errorLongBreakRange",
        }
    }
}

/// Session lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DurationConfig {
    work: u32,
    short_break: u32,
    long_break: u32,
}

impl DurationConfig {
    pub const WORK_RANGE: (i64, i64) = (1, 60);
    pub const SHORT_BREAK_RANGE: (i64, i64) = (1, 30);
    pub const LONG_BREAK_RANGE: (i64, i64) = (1, 60);

    /// Builds a validated configuration.
    pub fn new(work: i64, short_break: i64, long_break: i64) -> Result<Self, ConfigError> {
        if !within(work, Self::WORK_RANGE) {
            return Err(ConfigError::WorkOutOfRange(work));
        }
        if !within(short_break, Self::SHORT_BREAK_RANGE) {
            return Err(ConfigError::ShortBreakOutOfRange(short_break));
        }
        if !within(long_break, Self::LONG_BREAK_RANGE) {
            return Err(ConfigError::LongBreakOutOfRange(long_break));
        }
        // Ranges above guarantee these fit.
        Ok(Self {
            work: work as u32,
            short_break: short_break as u32,
            long_break: long_break as u32,
        })
    }

    /// Parses raw form input. All three fields must be numeric before any
    /// range is checked.
    pub fn parse(work: &str, short_break: &str, long_break: &str) -> Result<Self, ConfigError> {
        let parse = |raw: &str| raw.trim().parse::<i64>().map_err(|_| ConfigError::NotNumeric);
        let (work, short_break, long_break) = (parse(work)?, parse(short_break)?, parse(long_break)?);
        Self::new(work, short_break, long_break)
    }

    /// Re-checks ranges, e.g. after deserializing untrusted data.
    pub fn validated(self) -> Result<Self, ConfigError> {
        Self::new(
            i64::from(self.work),
            i64::from(self.short_break),
            i64::from(self.long_break),
        )
    }

    pub fn minutes(&self, mode: SessionMode) -> u32 {
        match mode {
            SessionMode::Work => self.work,
            SessionMode::ShortBreak => self.short_break,
            SessionMode::LongBreak => self.long_break,
        }
    }

    pub fn seconds(&self, mode: SessionMode) -> u32 {
        self.minutes(mode) * 60
    }

    pub fn work(&self) -> u32 {
        self.work
    }

    pub fn short_break(&self) -> u32 {
        self.short_break
    }

    pub fn long_break(&self) -> u32 {
        self.long_break
    }
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

fn within(value: i64, (min, max): (i64, i64)) -> bool {
    (min..=max).contains(&value)
}

/// Counters for the current run of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Work sessions completed or skipped.
    pub completed_cycles: u32,
    /// Minutes of focus credited at Work completion.
    pub focus_minutes: u32,
    /// Break sessions completed or skipped.
    pub breaks_taken: u32,
}

impl Statistics {
    /// Credits a finished session of `mode` lasting `minutes`.
    pub fn record(&mut self, mode: SessionMode, minutes: u32) {
        if mode.is_break() {
            self.breaks_taken += 1;
        } else {
            self.completed_cycles += 1;
            self.focus_minutes += minutes;
        }
    }

    /// Returns true if the next break should be a long one.
    pub fn is_long_break_due(&self) -> bool {
        self.completed_cycles > 0 && self.completed_cycles % 4 == 0
    }
}

/// User-configurable settings. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub durations: DurationConfig,
    /// Whether to play a tone on session completion.
    pub sound_enabled: bool,
    /// Whether to show desktop notifications.
    pub notifications_enabled: bool,
    /// Whether the focus track plays during Work sessions.
    pub music_enabled: bool,
    /// Local audio file used as focus music.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_track: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            durations: DurationConfig::default(),
            sound_enabled: true,
            notifications_enabled: true,
            music_enabled: true,
            music_track: None,
        }
    }
}

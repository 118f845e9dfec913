//! The session timer state machine.
//!
//! [`SessionTimer`] owns the countdown, the current mode and the statistics.
//! Renderers never touch that state; they read it through accessors and
//! follow changes through the channel returned by [`SessionTimer::subscribe`].

use crate::i18n::{Locale, Translator};
use crate::messages::{MessageCatalog, MessageEvent, MessagePicker, SUGGESTIONS_SHOWN};
use crate::models::{DurationConfig, SessionMode, Statistics, TimerState};
use crate::scheduler::{Alarm, Clock, Scheduler, AUTO_SWITCH_DELAY, TICK_INTERVAL};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use tracing::debug;

/// Change notifications emitted on every state mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// Countdown or session length changed.
    Display {
        mode: SessionMode,
        remaining_secs: u32,
        total_secs: u32,
    },
    /// Mode (or its label) changed; renderers re-highlight mode buttons.
    ModeChanged { mode: SessionMode, label: String },
    RunningChanged(bool),
    Message(String),
    SkipVisibility(bool),
    /// Break suggestions to show, or `None` to hide them.
    Suggestions(Option<Vec<String>>),
    StatsChanged(Statistics),
    /// A session finished, naturally or by skipping.
    SessionCompleted {
        mode: SessionMode,
        stats: Statistics,
        message: String,
    },
}

pub struct SessionTimer {
    state: TimerState,
    durations: DurationConfig,
    stats: Statistics,
    translator: Translator,
    catalog: MessageCatalog,
    picker: MessagePicker,
    clock: Box<dyn Clock>,
    scheduler: Scheduler,
    /// Due time of the alarm being handled inside `pump`.
    firing_at: Option<Duration>,
    message: String,
    skip_visible: bool,
    suggestions: Option<Vec<String>>,
    subscribers: Vec<Sender<TimerEvent>>,
}

impl SessionTimer {
    /// Creates an idle Work session using the built-in translations.
    pub fn new(
        durations: DurationConfig,
        locale: Locale,
        clock: Box<dyn Clock>,
        picker: MessagePicker,
    ) -> Self {
        Self::with_translator(durations, Translator::new(locale), clock, picker)
    }

    pub fn with_translator(
        durations: DurationConfig,
        translator: Translator,
        clock: Box<dyn Clock>,
        picker: MessagePicker,
    ) -> Self {
        let catalog = MessageCatalog::load(&translator);
        let message = translator.get("readyToStart");
        Self {
            state: TimerState::idle(SessionMode::Work, &durations),
            durations,
            stats: Statistics::default(),
            translator,
            catalog,
            picker,
            clock,
            scheduler: Scheduler::new(),
            firing_at: None,
            message,
            skip_visible: false,
            suggestions: None,
            subscribers: Vec::new(),
        }
    }

    /// Returns a receiver for all future events.
    pub fn subscribe(&mut self) -> Receiver<TimerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> SessionMode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.state.total_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    pub fn stats(&self) -> Statistics {
        self.stats
    }

    pub fn durations(&self) -> DurationConfig {
        self.durations
    }

    pub fn locale(&self) -> Locale {
        self.translator.locale()
    }

    /// The message currently on display.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn skip_visible(&self) -> bool {
        self.skip_visible
    }

    pub fn suggestions(&self) -> Option<&[String]> {
        self.suggestions.as_deref()
    }

    /// Returns true while a completed session waits for the automatic switch.
    pub fn auto_switch_pending(&self) -> bool {
        self.scheduler.auto_switch_pending()
    }

    /// Stopped part-way through a session that `start` would resume. A
    /// finished session waiting for its auto-switch is not paused.
    pub fn is_paused(&self) -> bool {
        !self.state.is_running
            && self.state.remaining_secs < self.state.total_secs
            && !self.auto_switch_pending()
    }

    /// Localized label of the current mode.
    pub fn mode_label(&self) -> String {
        self.label(self.state.mode)
    }

    pub fn label(&self, mode: SessionMode) -> String {
        self.translator.get(mode.key())
    }

    /// Looks up a string in the active locale.
    pub fn translate(&self, key: &str) -> String {
        self.translator.get(key)
    }

    /// Starts or resumes the countdown.
    pub fn start(&mut self) {
        if self.state.is_running {
            return;
        }
        if self.scheduler.auto_switch_pending() {
            self.scheduler.cancel_auto_switch();
            self.auto_switch_mode();
        }

        debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "start");
        self.state.is_running = true;
        let now = self.now();
        self.scheduler.start_ticking(now, TICK_INTERVAL);
        self.emit(TimerEvent::RunningChanged(true));
        self.show_random(MessageEvent::SessionStart);

        if self.state.mode.is_break() {
            self.set_skip_visible(true);
            self.draw_suggestions();
        } else {
            self.set_skip_visible(false);
            self.hide_suggestions();
        }
    }

    pub fn pause(&mut self) {
        if !self.state.is_running {
            return;
        }
        debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "pause");
        self.state.is_running = false;
        self.scheduler.cancel_all();
        self.emit(TimerEvent::RunningChanged(false));
        let paused = self.translator.get("pausedMessage");
        self.show_message(paused);
    }

    /// Pauses when running, starts otherwise.
    pub fn toggle(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stops and refills the current mode's countdown.
    pub fn reset(&mut self) {
        debug!(mode = %self.state.mode, "reset");
        self.scheduler.cancel_all();
        self.stop_running();
        self.refill(self.state.mode);
        self.set_skip_visible(false);
        self.hide_suggestions();
        self.show_random(MessageEvent::SessionStart);
    }

    /// Completes the current session immediately.
    pub fn skip(&mut self) {
        if self.scheduler.auto_switch_pending() {
            debug!("skip ignored, session already completed");
            return;
        }
        self.complete_session();
    }

    /// Selects a mode while idle. Ignored while running.
    pub fn switch_mode(&mut self, mode: SessionMode) {
        if self.state.is_running {
            return;
        }
        debug!(from = %self.state.mode, to = %mode, "switch mode");
        self.scheduler.cancel_all();
        self.refill(mode);
        let label = self.label(mode);
        self.emit(TimerEvent::ModeChanged { mode, label });
        self.set_skip_visible(false);
        self.hide_suggestions();
        self.show_random(MessageEvent::SessionStart);
    }

    /// Counts down one second.
    pub fn tick(&mut self) {
        if !self.state.is_running {
            return;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        self.emit_display();
        if self.state.remaining_secs == 0 {
            self.complete_session();
        }
    }

    /// Fires every alarm that has come due on the clock, in deadline order.
    pub fn pump(&mut self) {
        let now = self.clock.now();
        while let Some((alarm, at)) = self.scheduler.next_due(now) {
            self.firing_at = Some(at);
            match alarm {
                Alarm::Tick => self.tick(),
                Alarm::AutoSwitch => self.auto_switch_mode(),
            }
        }
        self.firing_at = None;
    }

    /// Replaces the durations. An idle session picks up the new length at
    /// once; a running one keeps counting down its current length.
    pub fn set_durations(&mut self, durations: DurationConfig) {
        self.durations = durations;
        if !self.state.is_running {
            self.refill(self.state.mode);
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.translator.set_locale(locale);
        self.catalog = MessageCatalog::load(&self.translator);
        if self.suggestions.is_some() {
            self.draw_suggestions();
        }
        let mode = self.state.mode;
        let label = self.label(mode);
        self.emit(TimerEvent::ModeChanged { mode, label });
        let ready = self.translator.get("readyToStart");
        self.show_message(ready);
    }

    /// Shows an arbitrary message, e.g. a confirmation from the app layer.
    pub fn announce(&mut self, message: impl Into<String>) {
        self.show_message(message.into());
    }

    fn complete_session(&mut self) {
        let mode = self.state.mode;
        self.scheduler.stop_ticking();
        self.stop_running();

        self.stats.record(mode, self.durations.minutes(mode));
        self.emit(TimerEvent::StatsChanged(self.stats));
        debug!(%mode, stats = ?self.stats, "session complete");

        let message = self
            .picker
            .choose(self.catalog.pool(mode, MessageEvent::SessionComplete))
            .unwrap_or_default();
        self.show_message(message.clone());
        self.emit(TimerEvent::SessionCompleted {
            mode,
            stats: self.stats,
            message,
        });

        let at = self.now() + AUTO_SWITCH_DELAY;
        self.scheduler.schedule_auto_switch(at);
    }

    fn auto_switch_mode(&mut self) {
        let next = match self.state.mode {
            SessionMode::ShortBreak | SessionMode::LongBreak => SessionMode::Work,
            SessionMode::Work if self.stats.is_long_break_due() => SessionMode::LongBreak,
            SessionMode::Work => SessionMode::ShortBreak,
        };
        self.switch_mode(next);
        let ready = self.translator.get("clickStartWhenReady");
        self.show_message(ready);
    }

    fn now(&self) -> Duration {
        self.firing_at.unwrap_or_else(|| self.clock.now())
    }

    fn stop_running(&mut self) {
        if self.state.is_running {
            self.state.is_running = false;
            self.emit(TimerEvent::RunningChanged(false));
        }
    }

    fn refill(&mut self, mode: SessionMode) {
        self.state = TimerState::idle(mode, &self.durations);
        self.emit_display();
    }

    fn show_random(&mut self, event: MessageEvent) {
        let pool = self.catalog.pool(self.state.mode, event);
        if let Some(message) = self.picker.choose(pool) {
            self.show_message(message);
        }
    }

    fn show_message(&mut self, message: String) {
        self.message = message.clone();
        self.emit(TimerEvent::Message(message));
    }

    fn set_skip_visible(&mut self, visible: bool) {
        if self.skip_visible != visible {
            self.skip_visible = visible;
            self.emit(TimerEvent::SkipVisibility(visible));
        }
    }

    fn draw_suggestions(&mut self) {
        let drawn = self
            .picker
            .sample(self.catalog.suggestions(), SUGGESTIONS_SHOWN);
        self.suggestions = Some(drawn.clone());
        self.emit(TimerEvent::Suggestions(Some(drawn)));
    }

    fn hide_suggestions(&mut self) {
        if self.suggestions.take().is_some() {
            self.emit(TimerEvent::Suggestions(None));
        }
    }

    fn emit_display(&mut self) {
        self.emit(TimerEvent::Display {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.state.total_secs,
        });
    }

    fn emit(&mut self, event: TimerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

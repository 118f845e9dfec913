//! Main application state: the session timer plus persisted settings.

use crate::i18n::Locale;
use crate::messages::MessagePicker;
use crate::models::{ConfigError, DurationConfig, Settings};
use crate::notifications::Completion;
use crate::persistence::{DatabaseError, SettingsStore};
use crate::scheduler::Clock;
use crate::session::{SessionTimer, TimerEvent};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Start-up choices that take precedence over stored settings for this run.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub durations: Option<DurationConfig>,
    pub locale: Option<Locale>,
    pub sound_enabled: Option<bool>,
    /// Seed for message selection; random when `None`.
    pub seed: Option<u64>,
}

impl Overrides {
    /// The settings in effect: `stored` with every override applied.
    pub fn apply(&self, stored: &Settings) -> Settings {
        let mut settings = stored.clone();
        if let Some(durations) = self.durations {
            settings.durations = durations;
        }
        if let Some(sound_enabled) = self.sound_enabled {
            settings.sound_enabled = sound_enabled;
        }
        settings
    }
}

pub struct App {
    pub timer: SessionTimer,
    /// Settings in effect for this run.
    pub settings: Settings,
    /// What the store holds; overrides never reach it.
    stored: Settings,
    overrides: Overrides,
    store: Box<dyn SettingsStore>,
}

impl App {
    /// Builds the app from the store, applying `overrides` on top.
    pub fn new(
        store: Box<dyn SettingsStore>,
        overrides: Overrides,
        clock: Box<dyn Clock>,
    ) -> Result<Self, AppError> {
        let stored = store.load_settings()?;
        let settings = overrides.apply(&stored);

        let locale = match overrides.locale {
            Some(locale) => locale,
            None => store.load_language()?.unwrap_or_else(Locale::detect),
        };
        let picker = overrides
            .seed
            .map(MessagePicker::seeded)
            .unwrap_or_else(MessagePicker::from_entropy);

        info!(%locale, durations = ?settings.durations, "starting");
        let timer = SessionTimer::new(settings.durations, locale, clock, picker);

        Ok(Self {
            timer,
            settings,
            stored,
            overrides,
            store,
        })
    }

    /// Validates raw form input and applies it. On error nothing changes.
    pub fn save_settings(
        &mut self,
        work: &str,
        short_break: &str,
        long_break: &str,
        sound_enabled: bool,
    ) -> Result<(), ConfigError> {
        let durations = DurationConfig::parse(work, short_break, long_break)?;
        self.overrides.durations = None;
        self.overrides.sound_enabled = None;
        self.update_setting(|s| {
            s.durations = durations;
            s.sound_enabled = sound_enabled;
        });
        self.timer.set_durations(durations);
        let saved = self.timer.translate("settingsSaved");
        self.timer.announce(saved);
        info!(?durations, sound_enabled, "settings saved");
        Ok(())
    }

    /// Applies an already validated duration set.
    pub fn set_durations(&mut self, durations: DurationConfig) {
        self.overrides.durations = None;
        self.update_setting(|s| s.durations = durations);
        self.timer.set_durations(durations);
    }

    pub fn toggle_sound(&mut self) {
        let sound_enabled = !self.settings.sound_enabled;
        self.overrides.sound_enabled = None;
        self.update_setting(|s| s.sound_enabled = sound_enabled);
    }

    pub fn toggle_notifications(&mut self) {
        self.update_setting(|s| s.notifications_enabled = !s.notifications_enabled);
    }

    pub fn toggle_music(&mut self) {
        self.update_setting(|s| s.music_enabled = !s.music_enabled);
    }

    /// Remembers the local file played as focus music.
    pub fn set_music_track(&mut self, track: Option<PathBuf>) {
        info!(?track, "music track set");
        self.update_setting(|s| s.music_track = track);
    }

    /// Switches the display language and remembers it.
    pub fn change_language(&mut self, locale: Locale) {
        info!(%locale, "changing language");
        self.timer.set_locale(locale);
        if let Err(e) = self.store.save_language(locale) {
            warn!(error = %e, "failed to save language");
        }
        let changed = self.timer.translate("languageChanged");
        self.timer.announce(changed);
    }

    pub fn cycle_language(&mut self) {
        self.change_language(self.timer.locale().next());
    }

    /// Localized text for a validation error.
    pub fn error_message(&self, error: &ConfigError) -> String {
        self.timer.translate(error.message_key())
    }

    /// Turns a completion event into what the notification sink needs.
    pub fn completion(&self, event: &TimerEvent) -> Option<Completion> {
        let TimerEvent::SessionCompleted {
            mode,
            stats,
            message,
        } = event
        else {
            return None;
        };
        let title_key = if mode.is_break() {
            "breakCompleteTitle"
        } else {
            "workCompleteTitle"
        };
        Some(Completion {
            mode: *mode,
            stats: *stats,
            title: self.timer.translate(title_key),
            message: message.clone(),
        })
    }

    /// Updates a stored setting, saves it and recomputes the effective ones.
    pub fn update_setting<F>(&mut self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        updater(&mut self.stored);
        if let Err(e) = self.store.save_settings(&self.stored) {
            warn!(error = %e, "failed to save settings");
        }
        self.settings = self.overrides.apply(&self.stored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionMode;
    use crate::persistence::Database;
    use crate::scheduler::ManualClock;

    fn create_test_app() -> App {
        create_app_with(Overrides {
            locale: Some(Locale::En),
            seed: Some(3),
            ..Overrides::default()
        })
    }

    fn create_app_with(overrides: Overrides) -> App {
        let db = Database::new_in_memory().unwrap();
        App::new(Box::new(db), overrides, Box::new(ManualClock::new())).unwrap()
    }

    #[test]
    fn test_app_initial_state() {
        let app = create_test_app();
        assert_eq!(app.settings, Settings::default());
        assert_eq!(app.timer.mode(), SessionMode::Work);
        assert_eq!(app.timer.remaining_secs(), 1500);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn test_overrides_win() {
        let app = create_app_with(Overrides {
            durations: Some(DurationConfig::new(50, 10, 30).unwrap()),
            locale: Some(Locale::Pt),
            sound_enabled: Some(false),
            seed: Some(1),
        });
        assert_eq!(app.timer.total_secs(), 3000);
        assert_eq!(app.timer.locale(), Locale::Pt);
        assert!(!app.settings.sound_enabled);
    }

    #[test]
    fn test_overrides_are_not_persisted() {
        let mut app = create_app_with(Overrides {
            durations: Some(DurationConfig::new(50, 5, 15).unwrap()),
            sound_enabled: Some(false),
            seed: Some(1),
            ..Overrides::default()
        });
        app.toggle_notifications();

        let stored = app.store.load_settings().unwrap();
        assert_eq!(stored.durations.work(), 25);
        assert!(stored.sound_enabled);
        assert!(!stored.notifications_enabled);

        assert_eq!(app.settings.durations.work(), 50);
        assert!(!app.settings.sound_enabled);
        assert!(!app.settings.notifications_enabled);
    }

    #[test]
    fn test_explicit_changes_replace_overrides() {
        let mut app = create_app_with(Overrides {
            durations: Some(DurationConfig::new(50, 5, 15).unwrap()),
            sound_enabled: Some(false),
            seed: Some(1),
            ..Overrides::default()
        });

        app.toggle_sound();
        assert!(app.settings.sound_enabled);

        app.set_durations(DurationConfig::new(40, 5, 15).unwrap());
        assert_eq!(app.settings.durations.work(), 40);
        assert_eq!(app.store.load_settings().unwrap().durations.work(), 40);
    }

    #[test]
    fn test_music_settings_persist() {
        let mut app = create_test_app();
        app.set_music_track(Some(PathBuf::from("/music/rain.ogg")));
        app.toggle_music();

        let stored = app.store.load_settings().unwrap();
        assert_eq!(stored.music_track, Some(PathBuf::from("/music/rain.ogg")));
        assert!(!stored.music_enabled);
        assert_eq!(stored, app.settings);
    }

    #[test]
    fn test_stored_language_used_without_override() {
        let db = Database::new_in_memory().unwrap();
        db.save_language(Locale::Pt).unwrap();
        let app = App::new(
            Box::new(db),
            Overrides::default(),
            Box::new(ManualClock::new()),
        )
        .unwrap();
        assert_eq!(app.timer.locale(), Locale::Pt);
    }

    #[test]
    fn test_save_settings_applies_and_persists() {
        let mut app = create_test_app();
        app.save_settings("30", "10", "20", false).unwrap();

        assert_eq!(app.settings.durations, DurationConfig::new(30, 10, 20).unwrap());
        assert!(!app.settings.sound_enabled);
        assert_eq!(app.timer.total_secs(), 1800);
        assert_eq!(app.timer.message(), "Settings saved successfully!");

        let loaded = app.store.load_settings().unwrap();
        assert_eq!(loaded, app.settings);
    }

    #[test]
    fn test_save_settings_rejects_zero_work() {
        let mut app = create_test_app();
        let err = app.save_settings("0", "5", "15", true).unwrap_err();

        assert_eq!(err, ConfigError::WorkOutOfRange(0));
        assert_eq!(app.settings.durations.work(), 25);
        assert_eq!(app.timer.durations().work(), 25);
        assert_eq!(
            app.error_message(&err),
            "Focus duration must be between 1 and 60 minutes"
        );
    }

    #[test]
    fn test_save_settings_rejects_non_numeric() {
        let mut app = create_test_app();
        let err = app.save_settings("25", "five", "15", true).unwrap_err();
        assert_eq!(err, ConfigError::NotNumeric);
        assert_eq!(app.settings, Settings::default());
    }

    #[test]
    fn test_error_message_localized() {
        let mut app = create_test_app();
        app.change_language(Locale::Pt);
        assert_eq!(
            app.error_message(&ConfigError::ShortBreakOutOfRange(31)),
            "A pausa curta deve durar entre 1 e 30 minutos"
        );
    }

    #[test]
    fn test_save_settings_keeps_running_session() {
        let mut app = create_test_app();
        app.timer.start();
        app.save_settings("45", "5", "15", true).unwrap();

        assert!(app.timer.is_running());
        assert_eq!(app.timer.total_secs(), 1500);
        assert_eq!(app.timer.durations().work(), 45);
    }

    #[test]
    fn test_toggle_sound_persists() {
        let mut app = create_test_app();
        app.toggle_sound();
        assert!(!app.settings.sound_enabled);
        assert!(!app.store.load_settings().unwrap().sound_enabled);

        app.toggle_notifications();
        assert!(!app.settings.notifications_enabled);
    }

    #[test]
    fn test_change_language_persists_and_confirms() {
        let mut app = create_test_app();
        app.change_language(Locale::Pt);

        assert_eq!(app.timer.locale(), Locale::Pt);
        assert_eq!(app.timer.message(), "Idioma alterado para Português!");
        assert_eq!(app.store.load_language().unwrap(), Some(Locale::Pt));

        app.cycle_language();
        assert_eq!(app.timer.locale(), Locale::En);
        assert_eq!(app.timer.message(), "Language changed to English!");
    }

    #[test]
    fn test_completion_from_event() {
        let mut app = create_test_app();
        let rx = app.timer.subscribe();
        app.timer.start();
        app.timer.skip();

        let completion = rx
            .try_iter()
            .find_map(|event| app.completion(&event))
            .unwrap();
        assert_eq!(completion.mode, SessionMode::Work);
        assert_eq!(completion.stats.completed_cycles, 1);
        assert_eq!(completion.title, "Focus session complete!");
        assert_eq!(completion.message, app.timer.message());

        assert!(app.completion(&TimerEvent::RunningChanged(true)).is_none());
    }
}

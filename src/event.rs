//! User commands shared by every renderer.

use crate::app::App;
use crate::i18n::Locale;
use crate::models::{DurationConfig, SessionMode};

/// Something the user asked for, independent of how it was asked.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start when idle, pause when running.
    Toggle,
    Reset,
    Skip,
    SwitchMode(SessionMode),
    SetDurations(DurationConfig),
    ToggleSound,
    ToggleNotifications,
    ToggleMusic,
    SetLanguage(Locale),
    CycleLanguage,
    Quit,
}

/// Result of handling a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event handled, continue running.
    Continue,
    /// User requested quit.
    Quit,
    /// Quit was requested while a session runs; ask again to confirm.
    ConfirmQuit,
    /// Settings changed, renderers showing them need a refresh.
    SettingsChanged,
}

/// Applies `command` to the app.
///
/// `quit_armed` is true when the previous command was an unconfirmed quit.
pub fn handle_command(app: &mut App, command: Command, quit_armed: bool) -> EventResult {
    match command {
        Command::Toggle => app.timer.toggle(),
        Command::Reset => app.timer.reset(),
        Command::Skip => app.timer.skip(),
        Command::SwitchMode(mode) => app.timer.switch_mode(mode),
        Command::SetDurations(durations) => {
            app.set_durations(durations);
            return EventResult::SettingsChanged;
        }
        Command::ToggleSound => {
            app.toggle_sound();
            return EventResult::SettingsChanged;
        }
        Command::ToggleNotifications => {
            app.toggle_notifications();
            return EventResult::SettingsChanged;
        }
        Command::ToggleMusic => {
            app.toggle_music();
            return EventResult::SettingsChanged;
        }
        Command::SetLanguage(locale) => {
            app.change_language(locale);
            return EventResult::SettingsChanged;
        }
        Command::CycleLanguage => {
            app.cycle_language();
            return EventResult::SettingsChanged;
        }
        Command::Quit => {
            if app.timer.is_running() && !quit_armed {
                let prompt = app.timer.translate("confirmQuit");
                app.timer.announce(prompt);
                return EventResult::ConfirmQuit;
            }
            return EventResult::Quit;
        }
    }
    EventResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Overrides;
    use crate::persistence::Database;
    use crate::scheduler::ManualClock;

    fn create_test_app() -> App {
        let overrides = Overrides {
            locale: Some(Locale::En),
            seed: Some(5),
            ..Overrides::default()
        };
        App::new(
            Box::new(Database::new_in_memory().unwrap()),
            overrides,
            Box::new(ManualClock::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_toggle_and_reset() {
        let mut app = create_test_app();
        assert_eq!(
            handle_command(&mut app, Command::Toggle, false),
            EventResult::Continue
        );
        assert!(app.timer.is_running());

        handle_command(&mut app, Command::Reset, false);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn test_switch_mode_command() {
        let mut app = create_test_app();
        handle_command(&mut app, Command::SwitchMode(SessionMode::LongBreak), false);
        assert_eq!(app.timer.mode(), SessionMode::LongBreak);
    }

    #[test]
    fn test_set_durations_command() {
        let mut app = create_test_app();
        let durations = DurationConfig::new(20, 5, 15).unwrap();
        assert_eq!(
            handle_command(&mut app, Command::SetDurations(durations), false),
            EventResult::SettingsChanged
        );
        assert_eq!(app.timer.total_secs(), 1200);
        assert_eq!(app.settings.durations, durations);
    }

    #[test]
    fn test_quit_when_idle() {
        let mut app = create_test_app();
        assert_eq!(
            handle_command(&mut app, Command::Quit, false),
            EventResult::Quit
        );
    }

    #[test]
    fn test_quit_while_running_asks_first() {
        let mut app = create_test_app();
        handle_command(&mut app, Command::Toggle, false);

        assert_eq!(
            handle_command(&mut app, Command::Quit, false),
            EventResult::ConfirmQuit
        );
        assert!(app.timer.message().contains("active session"));
        assert_eq!(
            handle_command(&mut app, Command::Quit, true),
            EventResult::Quit
        );
    }

    #[test]
    fn test_language_commands() {
        let mut app = create_test_app();
        handle_command(&mut app, Command::CycleLanguage, false);
        assert_eq!(app.timer.locale(), Locale::Pt);
        handle_command(&mut app, Command::SetLanguage(Locale::En), false);
        assert_eq!(app.timer.locale(), Locale::En);
    }

    #[test]
    fn test_toggle_sound_command() {
        let mut app = create_test_app();
        assert_eq!(
            handle_command(&mut app, Command::ToggleSound, false),
            EventResult::SettingsChanged
        );
        assert!(!app.settings.sound_enabled);
    }

    #[test]
    fn test_toggle_music_command() {
        let mut app = create_test_app();
        assert_eq!(
            handle_command(&mut app, Command::ToggleMusic, false),
            EventResult::SettingsChanged
        );
        assert!(!app.settings.music_enabled);
    }
}

//! Tray dropdown: item ids, labels, and the muda menu itself.

use crate::event::Command;
use crate::i18n::Locale;
use crate::models::{DurationConfig, SessionMode, Statistics};
use crate::session::SessionTimer;
use crate::timer::{format_focus_time, format_progress_bar, format_time};

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_MESSAGE: &str = "message";
pub const ID_STATS: &str = "stats";
pub const ID_TOGGLE: &str = "toggle";
pub const ID_RESET: &str = "reset";
pub const ID_SKIP: &str = "skip";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_NOTIF_TOGGLE: &str = "notif_toggle";
pub const ID_MUSIC_TOGGLE: &str = "music_toggle";
pub const ID_QUIT: &str = "quit";

pub const WORK_PRESETS: [u32; 6] = [15, 20, 25, 30, 45, 60];
pub const SHORT_BREAK_PRESETS: [u32; 4] = [3, 5, 10, 15];
pub const LONG_BREAK_PRESETS: [u32; 4] = [10, 15, 20, 30];

const PROGRESS_WIDTH: usize = 20;

pub fn mode_id(mode: SessionMode) -> String {
    format!("mode_{}", mode.key())
}

pub fn preset_id(mode: SessionMode, minutes: u32) -> String {
    format!("preset_{}_{}", mode.key(), minutes)
}

pub fn language_id(locale: Locale) -> String {
    format!("lang_{}", locale.code())
}

/// Maps a clicked menu id onto a command.
///
/// Preset ids replace one duration and keep the other two from `current`.
pub fn menu_command(id: &str, current: DurationConfig) -> Option<Command> {
    match id {
        ID_TOGGLE => return Some(Command::Toggle),
        ID_RESET => return Some(Command::Reset),
        ID_SKIP => return Some(Command::Skip),
        ID_SOUND_TOGGLE => return Some(Command::ToggleSound),
        ID_NOTIF_TOGGLE => return Some(Command::ToggleNotifications),
        ID_MUSIC_TOGGLE => return Some(Command::ToggleMusic),
        ID_QUIT => return Some(Command::Quit),
        _ => {}
    }

    if let Some(mode) = id.strip_prefix("mode_") {
        return mode.parse().ok().map(Command::SwitchMode);
    }
    if let Some(code) = id.strip_prefix("lang_") {
        return code.parse().ok().map(Command::SetLanguage);
    }

    let (mode, minutes) = id.strip_prefix("preset_")?.rsplit_once('_')?;
    let mode: SessionMode = mode.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    let mut values = [
        i64::from(current.work()),
        i64::from(current.short_break()),
        i64::from(current.long_break()),
    ];
    let slot = match mode {
        SessionMode::Work => 0,
        SessionMode::ShortBreak => 1,
        SessionMode::LongBreak => 2,
    };
    values[slot] = minutes;
    DurationConfig::new(values[0], values[1], values[2])
        .ok()
        .map(Command::SetDurations)
}

/// Formats the status line for the menu.
pub fn format_status(timer: &SessionTimer) -> String {
    let time = format_time(timer.remaining_secs());
    let label = timer.mode_label();
    if timer.is_running() {
        let icon = if timer.mode().is_break() { "☕" } else { "⏱" };
        format!("{}  {} · {}", icon, label, time)
    } else if timer.is_paused() {
        format!("⏸  {} · {}", label, time)
    } else {
        format!("🍅  {} · {}", label, time)
    }
}

pub fn format_progress(timer: &SessionTimer) -> String {
    format_progress_bar(timer.progress(), PROGRESS_WIDTH)
}

/// One-line statistics summary.
pub fn format_stats(timer: &SessionTimer, stats: &Statistics) -> String {
    format!(
        "{}: {} · {}: {} · {}: {}",
        timer.translate("cyclesCompleted"),
        stats.completed_cycles,
        timer.translate("focusTime"),
        format_focus_time(stats.focus_minutes),
        timer.translate("breaksTaken"),
        stats.breaks_taken
    )
}

/// Label for the start/pause item.
pub fn toggle_label(timer: &SessionTimer) -> String {
    if timer.is_running() {
        format!("⏸  {}", timer.translate("pause"))
    } else if timer.is_paused() {
        format!("▶  {}", timer.translate("resume"))
    } else {
        format!("▶  {}", timer.translate("start"))
    }
}

/// Heading of a duration submenu, e.g. `Focus: 25 min`.
pub fn duration_heading(timer: &SessionTimer, mode: SessionMode) -> String {
    format!(
        "{}: {} {}",
        timer.label(mode),
        timer.durations().minutes(mode),
        timer.translate("minutes")
    )
}

pub fn presets(mode: SessionMode) -> &'static [u32] {
    match mode {
        SessionMode::Work => &WORK_PRESETS,
        SessionMode::ShortBreak => &SHORT_BREAK_PRESETS,
        SessionMode::LongBreak => &LONG_BREAK_PRESETS,
    }
}

#[cfg(target_os = "macos")]
pub use tray_menu::{build_menu, update_menu_items, MenuError, MenuItems};

#[cfg(target_os = "macos")]
mod tray_menu {
    use super::*;
    use crate::app::App;
    use muda::accelerator::Accelerator;
    use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
    use std::collections::HashMap;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum MenuError {
        #[error("Menu error: {0}")]
        Muda(#[from] muda::Error),
    }

    /// Holds references to menu items that need dynamic updates.
    pub struct MenuItems {
        pub status: MenuItem,
        pub progress: MenuItem,
        pub message: MenuItem,
        pub stats: MenuItem,
        pub toggle: MenuItem,
        pub reset: MenuItem,
        pub skip: MenuItem,
        pub modes: HashMap<SessionMode, CheckMenuItem>,
        pub settings: Submenu,
        pub duration_subs: HashMap<SessionMode, Submenu>,
        pub presets: HashMap<(SessionMode, u32), CheckMenuItem>,
        pub sound_toggle: CheckMenuItem,
        pub notif_toggle: CheckMenuItem,
        pub music_toggle: CheckMenuItem,
        pub language: Submenu,
        pub languages: HashMap<Locale, CheckMenuItem>,
        pub quit: MenuItem,
    }

    fn info_item(id: &str, text: String) -> MenuItem {
        MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
    }

    fn action_item(id: &str, text: String, enabled: bool) -> MenuItem {
        MenuItem::with_id(MenuId::new(id), text, enabled, None::<Accelerator>)
    }

    fn check_item(id: String, text: String, checked: bool) -> CheckMenuItem {
        CheckMenuItem::with_id(MenuId::new(id), text, true, checked, None::<Accelerator>)
    }

    /// Builds the complete menu structure.
    pub fn build_menu(app: &App) -> Result<(Menu, MenuItems), MenuError> {
        let timer = &app.timer;
        let menu = Menu::new();

        let status = info_item(ID_STATUS, format_status(timer));
        let progress = info_item(ID_PROGRESS, format_progress(timer));
        let message = info_item(ID_MESSAGE, timer.message().to_string());
        menu.append(&status)?;
        menu.append(&progress)?;
        menu.append(&message)?;
        menu.append(&PredefinedMenuItem::separator())?;

        let stats = info_item(ID_STATS, format_stats(timer, &timer.stats()));
        menu.append(&stats)?;
        menu.append(&PredefinedMenuItem::separator())?;

        let toggle = action_item(ID_TOGGLE, toggle_label(timer), true);
        let reset = action_item(ID_RESET, format!("⏹  {}", timer.translate("reset")), true);
        let skip = action_item(
            ID_SKIP,
            format!("⏭  {}", timer.translate("skip")),
            timer.skip_visible(),
        );
        menu.append(&toggle)?;
        menu.append(&reset)?;
        menu.append(&skip)?;
        menu.append(&PredefinedMenuItem::separator())?;

        let mut modes = HashMap::new();
        for mode in SessionMode::ALL {
            let item = check_item(mode_id(mode), timer.label(mode), mode == timer.mode());
            menu.append(&item)?;
            modes.insert(mode, item);
        }
        menu.append(&PredefinedMenuItem::separator())?;

        let settings = Submenu::new(format!("⚙  {}", timer.translate("settings")), true);
        let mut duration_subs = HashMap::new();
        let mut preset_items = HashMap::new();
        for mode in SessionMode::ALL {
            let sub = Submenu::new(duration_heading(timer, mode), true);
            let current = timer.durations().minutes(mode);
            for &minutes in presets(mode) {
                let item = check_item(
                    preset_id(mode, minutes),
                    format!("{} {}", minutes, timer.translate("minutes")),
                    minutes == current,
                );
                sub.append(&item)?;
                preset_items.insert((mode, minutes), item);
            }
            settings.append(&sub)?;
            duration_subs.insert(mode, sub);
        }
        settings.append(&PredefinedMenuItem::separator())?;

        let sound_toggle = check_item(
            ID_SOUND_TOGGLE.to_string(),
            timer.translate("sound"),
            app.settings.sound_enabled,
        );
        let notif_toggle = check_item(
            ID_NOTIF_TOGGLE.to_string(),
            timer.translate("notifications"),
            app.settings.notifications_enabled,
        );
        let music_toggle = check_item(
            ID_MUSIC_TOGGLE.to_string(),
            timer.translate("music"),
            app.settings.music_enabled,
        );
        settings.append(&sound_toggle)?;
        settings.append(&notif_toggle)?;
        settings.append(&music_toggle)?;
        menu.append(&settings)?;

        let language = Submenu::new(format!("🌐  {}", timer.translate("language")), true);
        let mut languages = HashMap::new();
        for locale in Locale::ALL {
            let item = check_item(
                language_id(locale),
                locale.native_name().to_string(),
                locale == timer.locale(),
            );
            language.append(&item)?;
            languages.insert(locale, item);
        }
        menu.append(&language)?;
        menu.append(&PredefinedMenuItem::separator())?;

        let quit = action_item(ID_QUIT, timer.translate("quit"), true);
        menu.append(&quit)?;

        let items = MenuItems {
            status,
            progress,
            message,
            stats,
            toggle,
            reset,
            skip,
            modes,
            settings,
            duration_subs,
            presets: preset_items,
            sound_toggle,
            notif_toggle,
            music_toggle,
            language,
            languages,
            quit,
        };

        Ok((menu, items))
    }

    /// Refreshes every label, check mark and enabled flag from the app.
    pub fn update_menu_items(items: &MenuItems, app: &App) {
        let timer = &app.timer;

        items.status.set_text(format_status(timer));
        items.progress.set_text(format_progress(timer));
        items.message.set_text(timer.message());
        items.stats.set_text(format_stats(timer, &timer.stats()));

        items.toggle.set_text(toggle_label(timer));
        items.reset.set_text(format!("⏹  {}", timer.translate("reset")));
        items.skip.set_text(format!("⏭  {}", timer.translate("skip")));
        items.skip.set_enabled(timer.skip_visible());

        for (mode, item) in &items.modes {
            item.set_text(timer.label(*mode));
            item.set_checked(*mode == timer.mode());
        }

        items
            .settings
            .set_text(format!("⚙  {}", timer.translate("settings")));
        for (mode, sub) in &items.duration_subs {
            sub.set_text(duration_heading(timer, *mode));
        }
        for ((mode, minutes), item) in &items.presets {
            item.set_text(format!("{} {}", minutes, timer.translate("minutes")));
            item.set_checked(timer.durations().minutes(*mode) == *minutes);
        }
        items.sound_toggle.set_text(timer.translate("sound"));
        items.sound_toggle.set_checked(app.settings.sound_enabled);
        items.notif_toggle.set_text(timer.translate("notifications"));
        items
            .notif_toggle
            .set_checked(app.settings.notifications_enabled);
        items.music_toggle.set_text(timer.translate("music"));
        items.music_toggle.set_checked(app.settings.music_enabled);

        items
            .language
            .set_text(format!("🌐  {}", timer.translate("language")));
        for (locale, item) in &items.languages {
            item.set_checked(*locale == timer.locale());
        }
        items.quit.set_text(timer.translate("quit"));
    }
}

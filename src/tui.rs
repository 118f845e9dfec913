//! Terminal renderer.

use crate::app::App;
use crate::event::{handle_command, Command, EventResult};
use crate::models::SessionMode;
use crate::music::FocusMusic;
use crate::notifications::NotificationSink;
use crate::session::TimerEvent;
use crate::timer::{format_focus_time, format_time, PUMP_INTERVAL};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long a validation error stays on screen.
const ERROR_TTL: Duration = Duration::from_secs(3);

const SUGGESTION_ICONS: [&str; 3] = ["🌱", "💧", "👁"];

#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal error: {0}")]
    Io(#[from] io::Error),
}

/// What a key press means in the main view.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Command(Command),
    OpenSettings,
    ToggleStats,
    /// Ctrl-C leaves without confirmation.
    ForceQuit,
}

pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::ForceQuit);
    }
    let command = match key.code {
        KeyCode::Char(' ') => Command::Toggle,
        KeyCode::Char('r') => Command::Reset,
        KeyCode::Char('s') => Command::Skip,
        KeyCode::Char('1') => Command::SwitchMode(SessionMode::Work),
        KeyCode::Char('2') => Command::SwitchMode(SessionMode::ShortBreak),
        KeyCode::Char('3') => Command::SwitchMode(SessionMode::LongBreak),
        KeyCode::Char('l') => Command::CycleLanguage,
        KeyCode::Char('m') => Command::ToggleSound,
        KeyCode::Char('n') => Command::ToggleNotifications,
        KeyCode::Char('p') => Command::ToggleMusic,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char('c') => return Some(KeyAction::OpenSettings),
        KeyCode::Char('t') => return Some(KeyAction::ToggleStats),
        _ => return None,
    };
    Some(KeyAction::Command(command))
}

/// The settings dialog: three duration fields and the sound switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub fields: [String; 3],
    pub sound_enabled: bool,
    /// 0..=2 are the duration fields, 3 is the sound switch.
    pub focus: usize,
}

/// Outcome of a key press inside the settings dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Editing,
    Submit,
    Cancel,
}

impl SettingsForm {
    const FIELD_COUNT: usize = 4;
    const MAX_DIGITS: usize = 3;

    pub fn from_app(app: &App) -> Self {
        let durations = app.settings.durations;
        Self {
            fields: [
                durations.work().to_string(),
                durations.short_break().to_string(),
                durations.long_break().to_string(),
            ],
            sound_enabled: app.settings.sound_enabled,
            focus: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % Self::FIELD_COUNT,
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + Self::FIELD_COUNT - 1) % Self::FIELD_COUNT
            }
            KeyCode::Char(' ') if self.focus == 3 => self.sound_enabled = !self.sound_enabled,
            KeyCode::Backspace if self.focus < 3 => {
                self.fields[self.focus].pop();
            }
            KeyCode::Char(c) if self.focus < 3 && !c.is_whitespace() => {
                let field = &mut self.fields[self.focus];
                if field.chars().count() < Self::MAX_DIGITS {
                    field.push(c);
                }
            }
            _ => {}
        }
        FormAction::Editing
    }
}

/// Renderer-side state that is not part of the timer.
#[derive(Debug, Default)]
pub struct View {
    pub form: Option<SettingsForm>,
    pub show_stats: bool,
    pub error: Option<(String, Instant)>,
    pub quit_armed: bool,
}

impl View {
    pub fn show_error(&mut self, message: String) {
        self.error = Some((message, Instant::now() + ERROR_TTL));
    }

    fn expire_error(&mut self, now: Instant) {
        if matches!(self.error, Some((_, until)) if until <= now) {
            self.error = None;
        }
    }

    /// Applies a key press. Returns false once the user has quit.
    pub fn handle_key(&mut self, app: &mut App, key: KeyEvent) -> bool {
        if let Some(form) = self.form.as_mut() {
            match form.handle_key(key) {
                FormAction::Editing => {}
                FormAction::Cancel => self.form = None,
                FormAction::Submit => {
                    let [work, short_break, long_break] = &form.fields;
                    match app.save_settings(work, short_break, long_break, form.sound_enabled) {
                        Ok(()) => self.form = None,
                        Err(e) => {
                            let message = app.error_message(&e);
                            self.show_error(message);
                        }
                    }
                }
            }
            return true;
        }

        let Some(action) = key_action(key) else {
            return true;
        };
        let command = match action {
            KeyAction::ForceQuit => return false,
            KeyAction::OpenSettings => {
                self.form = Some(SettingsForm::from_app(app));
                return true;
            }
            KeyAction::ToggleStats => {
                self.show_stats = !self.show_stats;
                return true;
            }
            KeyAction::Command(command) => command,
        };

        let was_armed = std::mem::take(&mut self.quit_armed);
        match handle_command(app, command, was_armed) {
            EventResult::Quit => false,
            EventResult::ConfirmQuit => {
                self.quit_armed = true;
                true
            }
            EventResult::Continue | EventResult::SettingsChanged => true,
        }
    }
}

/// Runs the terminal UI until the user quits.
pub fn run(
    app: &mut App,
    notifier: &dyn NotificationSink,
    music: &mut FocusMusic,
) -> Result<(), TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app, notifier, music);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    notifier: &dyn NotificationSink,
    music: &mut FocusMusic,
) -> Result<(), TuiError> {
    let events = app.timer.subscribe();
    let mut view = View::default();

    loop {
        view.expire_error(Instant::now());
        terminal.draw(|f| ui(f, app, &view))?;

        if event::poll(PUMP_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !view.handle_key(app, key) {
                    return Ok(());
                }
            }
        }

        app.timer.pump();
        dispatch_events(app, &events, notifier, music);
    }
}

/// Feeds pending timer events to the music and completions to the notifier.
pub fn dispatch_events(
    app: &App,
    events: &Receiver<TimerEvent>,
    notifier: &dyn NotificationSink,
    music: &mut FocusMusic,
) {
    music.set_enabled(app.settings.music_enabled);
    for event in events.try_iter() {
        music.handle(&event);
        if let Some(completion) = app.completion(&event) {
            notifier.session_completed(&completion, &app.settings);
        }
    }
}

fn accent(mode: SessionMode) -> Color {
    if mode.is_break() {
        Color::Cyan
    } else {
        Color::Red
    }
}

pub fn ui(f: &mut Frame, app: &App, view: &View) {
    let timer = &app.timer;
    let color = accent(timer.mode());

    let area = f.area();
    let chunks = Layout::vertical([
        Constraint::Length(2), // title
        Constraint::Length(1), // mode tabs
        Constraint::Length(4), // clock
        Constraint::Length(3), // progress
        Constraint::Length(2), // message
        Constraint::Min(0),    // suggestions and stats
        Constraint::Length(1), // error
        Constraint::Length(1), // help
    ])
    .split(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            timer.translate("appTitle"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            timer.translate("slogan"),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let tabs: Vec<Span> = SessionMode::ALL
        .into_iter()
        .flat_map(|mode| {
            let text = format!(
                " {} {} {} ",
                timer.label(mode),
                timer.durations().minutes(mode),
                timer.translate("minutes")
            );
            let style = if mode == timer.mode() {
                Style::default()
                    .fg(Color::Black)
                    .bg(accent(mode))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            [Span::styled(text, style), Span::raw("  ")]
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(tabs)).alignment(Alignment::Center),
        chunks[1],
    );

    let run_label = if timer.is_running() {
        timer.translate("pause")
    } else if timer.is_paused() {
        timer.translate("resume")
    } else {
        timer.translate("start")
    };
    let clock = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format_time(timer.remaining_secs()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(timer.mode_label()),
        Line::from(Span::styled(
            format!("[space] {}", run_label),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(clock, chunks[2]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(timer.progress().clamp(0.0, 1.0));
    f.render_widget(gauge, chunks[3]);

    f.render_widget(
        Paragraph::new(timer.message().to_string())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[4],
    );

    let mut body: Vec<Line> = Vec::new();
    if let Some(suggestions) = timer.suggestions() {
        body.push(Line::from(Span::styled(
            timer.translate("breakSuggestionsTitle"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, suggestion) in suggestions.iter().enumerate() {
            let icon = SUGGESTION_ICONS.get(i).copied().unwrap_or("•");
            body.push(Line::from(format!("{} {}", icon, suggestion)));
        }
        body.push(Line::from(""));
    }
    if view.show_stats {
        let stats = timer.stats();
        body.push(Line::from(Span::styled(
            timer.translate("stats"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        body.push(Line::from(format!(
            "{}: {}",
            timer.translate("cyclesCompleted"),
            stats.completed_cycles
        )));
        body.push(Line::from(format!(
            "{}: {}",
            timer.translate("focusTime"),
            format_focus_time(stats.focus_minutes)
        )));
        body.push(Line::from(format!(
            "{}: {}",
            timer.translate("breaksTaken"),
            stats.breaks_taken
        )));
    }
    f.render_widget(Paragraph::new(body).alignment(Alignment::Center), chunks[5]);

    if let Some((error, _)) = &view.error {
        f.render_widget(
            Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::LightRed)))
                .alignment(Alignment::Center),
            chunks[6],
        );
    }

    f.render_widget(
        Paragraph::new(help_line(app)).alignment(Alignment::Center),
        chunks[7],
    );

    if let Some(form) = &view.form {
        render_form(f, app, form, area);
    }
}

fn help_line(app: &App) -> Line<'static> {
    let timer = &app.timer;
    let mut parts = vec![
        format!("space {}/{}", timer.translate("start"), timer.translate("pause")),
        format!("r {}", timer.translate("reset")),
    ];
    if timer.skip_visible() {
        parts.push(format!("s {}", timer.translate("skip")));
    }
    parts.push("1/2/3".to_string());
    parts.push(format!("c {}", timer.translate("settings")));
    parts.push(format!("t {}", timer.translate("stats")));
    parts.push(format!("l {}", timer.locale().native_name()));
    let sound = if app.settings.sound_enabled { "on" } else { "off" };
    parts.push(format!("m {} {}", timer.translate("sound"), sound));
    let music = if app.settings.music_enabled { "on" } else { "off" };
    parts.push(format!("p {} {}", timer.translate("music"), music));
    parts.push(format!("q {}", timer.translate("quit")));
    Line::from(Span::styled(
        parts.join(" · "),
        Style::default().fg(Color::DarkGray),
    ))
}

fn render_form(f: &mut Frame, app: &App, form: &SettingsForm, area: Rect) {
    let timer = &app.timer;
    let popup = centered(area, 44, 8);
    let labels = [
        timer.label(SessionMode::Work),
        timer.label(SessionMode::ShortBreak),
        timer.label(SessionMode::LongBreak),
    ];

    let mut lines: Vec<Line> = labels
        .iter()
        .zip(&form.fields)
        .enumerate()
        .map(|(i, (label, value))| field_line(label, value, form.focus == i))
        .collect();
    let sound = if form.sound_enabled { "[x]" } else { "[ ]" };
    lines.push(field_line(&timer.translate("sound"), sound, form.focus == 3));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Enter {} · Esc · Tab", timer.translate("save")),
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(timer.translate("settings"));
    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(lines).block(block), popup);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(format!("{:<16}", label)),
        Span::styled(format!(" {:>3} ", value), style),
    ])
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Overrides;
    use crate::i18n::Locale;
    use crate::notifications::Completion;
    use crate::persistence::Database;
    use crate::scheduler::ManualClock;
    use crate::models::Settings;
    use crate::music::MusicOutput;
    use ratatui::backend::TestBackend;
    use std::cell::RefCell;

    fn create_test_app() -> App {
        App::new(
            Box::new(Database::new_in_memory().unwrap()),
            Overrides {
                locale: Some(Locale::En),
                seed: Some(2),
                ..Overrides::default()
            },
            Box::new(ManualClock::new()),
        )
        .unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn render(app: &App, view: &View) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app, view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_key_actions() {
        assert_eq!(
            key_action(key(KeyCode::Char(' '))),
            Some(KeyAction::Command(Command::Toggle))
        );
        assert_eq!(
            key_action(key(KeyCode::Char('3'))),
            Some(KeyAction::Command(Command::SwitchMode(SessionMode::LongBreak)))
        );
        assert_eq!(key_action(key(KeyCode::Char('c'))), Some(KeyAction::OpenSettings));
        assert_eq!(
            key_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::ForceQuit)
        );
        assert_eq!(
            key_action(key(KeyCode::Char('p'))),
            Some(KeyAction::Command(Command::ToggleMusic))
        );
        assert_eq!(key_action(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn test_form_editing() {
        let app = create_test_app();
        let mut form = SettingsForm::from_app(&app);
        assert_eq!(form.fields, ["25".to_string(), "5".to_string(), "15".to_string()]);

        form.handle_key(key(KeyCode::Backspace));
        form.handle_key(key(KeyCode::Backspace));
        form.handle_key(key(KeyCode::Char('4')));
        form.handle_key(key(KeyCode::Char('5')));
        assert_eq!(form.fields[0], "45");

        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus, 3);
        form.handle_key(key(KeyCode::Char(' ')));
        assert!(!form.sound_enabled);

        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit);
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
    }

    #[test]
    fn test_form_limits_length() {
        let app = create_test_app();
        let mut form = SettingsForm::from_app(&app);
        for _ in 0..5 {
            form.handle_key(key(KeyCode::Char('9')));
        }
        assert_eq!(form.fields[0], "259");
    }

    #[test]
    fn test_view_submit_invalid_keeps_form_open() {
        let mut app = create_test_app();
        let mut view = View::default();
        view.handle_key(&mut app, key(KeyCode::Char('c')));
        let form = view.form.as_mut().unwrap();
        form.fields[0] = "0".to_string();

        assert!(view.handle_key(&mut app, key(KeyCode::Enter)));
        assert!(view.form.is_some());
        let (error, _) = view.error.clone().unwrap();
        assert_eq!(error, "Focus duration must be between 1 and 60 minutes");
        assert_eq!(app.settings.durations.work(), 25);
    }

    #[test]
    fn test_view_submit_valid_closes_form() {
        let mut app = create_test_app();
        let mut view = View::default();
        view.handle_key(&mut app, key(KeyCode::Char('c')));
        view.form.as_mut().unwrap().fields[1] = "10".to_string();

        view.handle_key(&mut app, key(KeyCode::Enter));
        assert!(view.form.is_none());
        assert_eq!(app.settings.durations.short_break(), 10);
    }

    #[test]
    fn test_view_quit_needs_confirmation_while_running() {
        let mut app = create_test_app();
        let mut view = View::default();
        assert!(view.handle_key(&mut app, key(KeyCode::Char(' '))));
        assert!(view.handle_key(&mut app, key(KeyCode::Char('q'))));
        assert!(view.quit_armed);
        assert!(!view.handle_key(&mut app, key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_view_other_key_disarms_quit() {
        let mut app = create_test_app();
        let mut view = View::default();
        view.handle_key(&mut app, key(KeyCode::Char(' ')));
        view.handle_key(&mut app, key(KeyCode::Char('q')));
        view.handle_key(&mut app, key(KeyCode::Char('m')));
        assert!(!view.quit_armed);
        assert!(view.handle_key(&mut app, key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_error_expires() {
        let mut view = View::default();
        view.show_error("boom".to_string());
        view.expire_error(Instant::now());
        assert!(view.error.is_some());
        view.expire_error(Instant::now() + ERROR_TTL);
        assert!(view.error.is_none());
    }

    #[test]
    fn test_render_idle_screen() {
        let app = create_test_app();
        let screen = render(&app, &View::default());
        assert!(screen.contains("25:00"));
        assert!(screen.contains("PomoChill"));
        assert!(screen.contains("Ready to start? Click Start!"));
    }

    #[test]
    fn test_render_break_suggestions_and_stats() {
        let mut app = create_test_app();
        app.timer.switch_mode(SessionMode::ShortBreak);
        app.timer.start();
        let view = View {
            show_stats: true,
            ..View::default()
        };
        let screen = render(&app, &view);
        assert!(screen.contains("05:00"));
        assert!(screen.contains("Break ideas"));
        assert!(screen.contains("Cycles completed: 0"));
        for suggestion in app.timer.suggestions().unwrap() {
            assert!(screen.contains(suggestion.as_str()));
        }
    }

    #[test]
    fn test_render_settings_form() {
        let app = create_test_app();
        let view = View {
            form: Some(SettingsForm::from_app(&app)),
            ..View::default()
        };
        let screen = render(&app, &view);
        assert!(screen.contains("Settings"));
        assert!(screen.contains("[x]"));
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: RefCell<Vec<Completion>>,
    }

    impl NotificationSink for RecordingSink {
        fn session_completed(&self, completion: &Completion, _settings: &Settings) {
            self.seen.borrow_mut().push(completion.clone());
        }
    }

    struct SilentOutput;

    impl MusicOutput for SilentOutput {
        fn play(&mut self) {}
        fn pause(&mut self) {}
    }

    fn create_music(app: &App) -> FocusMusic {
        FocusMusic::new(Some(Box::new(SilentOutput)), true, app.timer.mode())
    }

    #[test]
    fn test_dispatch_completions() {
        let mut app = create_test_app();
        let mut music = create_music(&app);
        let events = app.timer.subscribe();
        app.timer.start();
        app.timer.skip();

        let sink = RecordingSink::default();
        dispatch_events(&app, &events, &sink, &mut music);
        let seen = sink.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].mode, SessionMode::Work);
        assert!(!music.is_playing());
    }

    #[test]
    fn test_dispatch_drives_music() {
        let mut app = create_test_app();
        let mut music = create_music(&app);
        let events = app.timer.subscribe();
        let sink = RecordingSink::default();

        app.timer.start();
        dispatch_events(&app, &events, &sink, &mut music);
        assert!(music.is_playing());

        let mut view = View::default();
        view.handle_key(&mut app, key(KeyCode::Char('p')));
        dispatch_events(&app, &events, &sink, &mut music);
        assert!(!music.is_playing());
    }
}

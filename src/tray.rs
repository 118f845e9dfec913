//! Menubar renderer: a tray title plus the dropdown from [`crate::menu`].

use crate::app::App;
use crate::event::{handle_command, EventResult};
use crate::menu::{self, MenuError, MenuItems};
use crate::music::FocusMusic;
use crate::notifications::{DesktopNotifier, NotificationSink};
use crate::session::TimerEvent;
use crate::timer::{self, format_tray_title, PUMP_INTERVAL};
use muda::MenuEvent;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use thiserror::Error;
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

#[derive(Error, Debug)]
pub enum TrayError {
    #[error("Menu error: {0}")]
    Menu(#[from] MenuError),
    #[error("Tray icon error: {0}")]
    Icon(#[from] tray_icon::Error),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Application handler for the winit event loop.
struct Tray {
    app: Arc<Mutex<App>>,
    tray: TrayIcon,
    items: MenuItems,
    events: Receiver<TimerEvent>,
    notifier: DesktopNotifier,
    music: FocusMusic,
    quit_armed: bool,
}

impl Tray {
    fn refresh(&self) {
        let app = self.app.lock().unwrap();
        menu::update_menu_items(&self.items, &app);
        let title = format_tray_title(&app.timer.state());
        drop(app); // Release lock before updating tray
        self.tray.set_title(Some(title));
    }

    fn process_timer_events(&mut self) {
        let mut changed = false;
        let app = self.app.lock().unwrap();
        for event in self.events.try_iter() {
            changed = true;
            self.music.handle(&event);
            if let Some(completion) = app.completion(&event) {
                self.notifier.session_completed(&completion, &app.settings);
            }
        }
        drop(app);
        if changed {
            self.refresh();
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let result = {
                let mut app = self.app.lock().unwrap();
                let current = app.settings.durations;
                let Some(command) = menu::menu_command(event.id().0.as_str(), current) else {
                    continue;
                };
                let was_armed = std::mem::take(&mut self.quit_armed);
                handle_command(&mut app, command, was_armed)
            };

            let music_enabled = self.app.lock().unwrap().settings.music_enabled;
            self.music.set_enabled(music_enabled);

            match result {
                EventResult::Quit => {
                    event_loop.exit();
                    return;
                }
                EventResult::ConfirmQuit => self.quit_armed = true,
                EventResult::Continue | EventResult::SettingsChanged => {}
            }
            self.refresh();
        }
    }
}

impl ApplicationHandler for Tray {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + PUMP_INTERVAL));
        self.process_timer_events();
        self.process_menu_events(event_loop);
    }
}

/// Runs the menubar app until the user quits.
pub fn run(app: App, music: FocusMusic) -> Result<(), TrayError> {
    let app = Arc::new(Mutex::new(app));

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, items, events, title) = {
        let mut guard = app.lock().unwrap();
        let events = guard.timer.subscribe();
        let (built_menu, items) = menu::build_menu(&guard)?;
        let title = format_tray_title(&guard.timer.state());
        (built_menu, items, events, title)
    };

    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_title(title)
        .with_tooltip("PomoChill")
        .build()?;

    let weak = Arc::downgrade(&app);
    thread::spawn(move || timer::run_timer_loop(weak, PUMP_INTERVAL));

    let mut handler = Tray {
        app,
        tray,
        items,
        events,
        notifier: DesktopNotifier::new(),
        music,
        quit_armed: false,
    };
    event_loop.run_app(&mut handler)?;

    Ok(())
}

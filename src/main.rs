//! PomoChill - a calm Pomodoro timer for the terminal.
//!
//! On macOS `--tray` runs the same timer from the menubar.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pomochill::app::{App, Overrides};
use pomochill::i18n::Locale;
use pomochill::models::DurationConfig;
use pomochill::music::FocusMusic;
use pomochill::notifications::DesktopNotifier;
use pomochill::persistence::{data_dir, Database, SettingsStore};
use pomochill::scheduler::SystemClock;
use pomochill::tui;

const LOG_ENV: &str = "POMOCHILL_LOG";
const LOG_FILE: &str = "pomochill.log";

#[derive(Parser, Debug)]
#[command(name = "pomochill", version, about = "Focus, breathe, achieve.")]
struct Cli {
    /// Focus session length in minutes (1-60)
    #[arg(long, value_name = "MIN")]
    work: Option<i64>,

    /// Short break length in minutes (1-30)
    #[arg(long, value_name = "MIN")]
    short_break: Option<i64>,

    /// Long break length in minutes (1-60)
    #[arg(long, value_name = "MIN")]
    long_break: Option<i64>,

    /// Display language (en, pt)
    #[arg(long)]
    lang: Option<Locale>,

    /// Don't play the completion tone
    #[arg(long)]
    no_sound: bool,

    /// Local audio file to play during focus sessions (remembered)
    #[arg(long, value_name = "FILE")]
    music: Option<PathBuf>,

    /// Settings database to use instead of the default location
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Seed for message and suggestion selection
    #[arg(long)]
    seed: Option<u64>,

    /// Run as a menubar app
    #[cfg(target_os = "macos")]
    #[arg(long)]
    tray: bool,
}

impl Cli {
    /// Merges the duration flags onto `stored`, exiting with a usage error
    /// when the result is out of range.
    fn durations(&self, stored: DurationConfig) -> Option<DurationConfig> {
        if self.work.is_none() && self.short_break.is_none() && self.long_break.is_none() {
            return None;
        }
        let merged = DurationConfig::new(
            self.work.unwrap_or_else(|| i64::from(stored.work())),
            self.short_break
                .unwrap_or_else(|| i64::from(stored.short_break())),
            self.long_break
                .unwrap_or_else(|| i64::from(stored.long_break())),
        );
        match merged {
            Ok(durations) => Some(durations),
            Err(e) => Cli::command()
                .error(ErrorKind::ValueValidation, e)
                .exit(),
        }
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let dir = data_dir();
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("pomochill: logging disabled: {}", e);
    }

    let db = match &cli.db {
        Some(path) => Database::open(path)?,
        None => Database::new()?,
    };
    let stored = db.load_settings()?;

    let overrides = Overrides {
        durations: cli.durations(stored.durations),
        locale: cli.lang,
        sound_enabled: cli.no_sound.then_some(false),
        seed: cli.seed,
    };
    let mut app = App::new(Box::new(db), overrides, Box::new(SystemClock::new()))?;
    if let Some(track) = cli.music.clone() {
        app.set_music_track(Some(track));
    }
    let mut music = FocusMusic::from_settings(&app.settings, app.timer.mode());

    #[cfg(target_os = "macos")]
    if cli.tray {
        info!("starting menubar app");
        pomochill::tray::run(app, music)?;
        return Ok(());
    }

    info!("starting terminal app");
    let notifier = DesktopNotifier::new();
    tui::run(&mut app, &notifier, &mut music)?;
    info!("bye");

    Ok(())
}

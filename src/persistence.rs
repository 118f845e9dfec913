//! SQLite key-value store for settings and the display language.

use crate::i18n::Locale;
use crate::models::Settings;
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const KEY_CONFIG: &str = "config";
const KEY_LANGUAGE: &str = "language";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),
}

/// Where settings and the chosen language are kept between runs.
pub trait SettingsStore: Send {
    fn load_settings(&self) -> Result<Settings, DatabaseError>;
    fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError>;
    fn load_language(&self) -> Result<Option<Locale>, DatabaseError>;
    fn save_language(&self, locale: Locale) -> Result<(), DatabaseError>;
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database in the platform data directory.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(Self::db_path())
    }

    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing).
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    /// Default database location.
    pub fn db_path() -> PathBuf {
        data_dir().join("pomochill.db")
    }

    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            [key, value],
        )?;
        Ok(())
    }
}

impl SettingsStore for Database {
    /// Loads settings, returning defaults if none are stored or the stored
    /// value is unreadable or out of range.
    fn load_settings(&self) -> Result<Settings, DatabaseError> {
        let Some(json) = self.get(KEY_CONFIG)? else {
            return Ok(Settings::default());
        };

        let settings: Settings = match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "stored settings unreadable, using defaults");
                return Ok(Settings::default());
            }
        };
        match settings.durations.validated() {
            Ok(_) => Ok(settings),
            Err(e) => {
                warn!(error = %e, "stored durations rejected, using defaults");
                Ok(Settings::default())
            }
        }
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(settings)?;
        self.put(KEY_CONFIG, &json)
    }

    fn load_language(&self) -> Result<Option<Locale>, DatabaseError> {
        let Some(code) = self.get(KEY_LANGUAGE)? else {
            return Ok(None);
        };
        match code.parse() {
            Ok(locale) => Ok(Some(locale)),
            Err(e) => {
                warn!(error = %e, "ignoring stored language");
                Ok(None)
            }
        }
    }

    fn save_language(&self, locale: Locale) -> Result<(), DatabaseError> {
        self.put(KEY_LANGUAGE, locale.code())
    }
}

/// Platform data directory for the database and log file.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "pomochill", "PomoChill")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

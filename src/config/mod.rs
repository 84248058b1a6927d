//! Remembered preferences, stored in SQLite.
//!
//! Shares a database with [`AuthStorage`](crate::auth::AuthStorage) and
//! [`ProfileStorage`](crate::session::storage::ProfileStorage). Pass the
//! same path to all three.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Mutex, PoisonError};

use crate::review::{Language, Tone};

const TONE_KEY: &str = "tone";
const LANGUAGE_KEY: &str = "language";
const MODEL_KEY: &str = "model";

/// What the user chose last time. `None` means never chosen, or a value
/// this version no longer understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub tone: Option<Tone>,
    pub language: Option<Language>,
    pub model: Option<String>,
}

/// Preferences after applying command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub tone: Tone,
    pub language: Language,
    /// `None` leaves the choice to the generator's default.
    pub model: Option<String>,
}

impl Preferences {
    /// Flag, then stored value, then built-in default.
    pub fn resolve(
        self,
        tone: Option<Tone>,
        language: Option<Language>,
        model: Option<String>,
    ) -> Resolved {
        Resolved {
            tone: tone.or(self.tone).unwrap_or_default(),
            language: language.or(self.language).unwrap_or_default(),
            model: model.or(self.model),
        }
    }
}

/// Persistent preference store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn preferences(&self) -> Result<Preferences> {
        Ok(Preferences {
            tone: self.get(TONE_KEY)?.and_then(|v| v.parse().ok()),
            language: self.get(LANGUAGE_KEY)?.and_then(|v| v.parse().ok()),
            model: self.get(MODEL_KEY)?,
        })
    }

    pub fn set_tone(&self, tone: Tone) -> Result<()> {
        self.set(TONE_KEY, tone.label())
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        self.set(LANGUAGE_KEY, language.label())
    }

    pub fn set_model(&self, model: &str) -> Result<()> {
        self.set(MODEL_KEY, model)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("failed to read {key} from config"))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )
        .with_context(|| format!("failed to save {key}"))?;
        Ok(())
    }
}

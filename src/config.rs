//! Runtime configuration read from the environment.
//!
//! | Variable            | Meaning                                  | Default                         |
//! |---------------------|------------------------------------------|---------------------------------|
//! | `ASTAP_DATA_DIR`    | directory for drafts and settings        | `<platform data dir>/astap-reports` |
//! | `ASTAP_STORAGE`     | `memory`, `file` or `sqlite`             | `file`                          |
//! | `ASTAP_STORAGE_KEY` | key holding the draft collection         | `astap_service_reports`         |
//! | `ASTAP_AUTOSAVE_MS` | auto-save idle period in milliseconds    | `1500`                          |
//! | `ASTAP_DEBUG`       | `1`/`true` raises logging to debug       | off                             |

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    drafts::DEFAULT_STORAGE_KEY,
    storage::{FileStorage, KeyValueStore, MemoryStorage, SqliteStorage},
};

pub const DEFAULT_AUTOSAVE_MS: u64 = 1500;

const APP_DIR_NAME: &str = "astap-reports";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    File,
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "file" | "json" => Ok(BackendKind::File),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => bail!("unknown storage backend '{other}' (expected memory, file or sqlite)"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub storage_key: String,
    pub autosave_idle: Duration,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match lookup("ASTAP_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let backend = lookup("ASTAP_STORAGE")
            .map(|value| value.parse::<BackendKind>())
            .transpose()
            .context("invalid ASTAP_STORAGE")?
            .unwrap_or(BackendKind::File);

        let storage_key = lookup("ASTAP_STORAGE_KEY")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let autosave_ms = match lookup("ASTAP_AUTOSAVE_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid ASTAP_AUTOSAVE_MS '{raw}'"))?,
            None => DEFAULT_AUTOSAVE_MS,
        };

        let debug = lookup("ASTAP_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            data_dir,
            backend,
            storage_key,
            autosave_idle: Duration::from_millis(autosave_ms),
            debug,
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("reports.sqlite3")
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.data_dir.join("drafts")
    }

    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStore>> {
        let storage: Box<dyn KeyValueStore> = match self.backend {
            BackendKind::Memory => Box::new(MemoryStorage::new()),
            BackendKind::File => Box::new(
                FileStorage::new(self.drafts_dir()).with_context(|| {
                    format!("failed to open draft directory {}", self.drafts_dir().display())
                })?,
            ),
            BackendKind::Sqlite => Box::new(SqliteStorage::open(self.sqlite_path())?),
        };
        Ok(storage)
    }
}

fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("no platform data directory; set ASTAP_DATA_DIR"))
}

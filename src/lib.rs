pub mod cli;
pub mod config;
pub mod document;
pub mod drafts;
pub mod email;
pub mod models;
pub mod session;
pub mod settings;
pub mod storage;
mod utils;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Mutex;

use config::{AppConfig, BackendKind};
use drafts::DraftStore;
use session::{AutoSaver, ReportSession};
use settings::{SettingsStore, TechnicianProfile};
use storage::KeyValueStore;

pub type DynStorage = Box<dyn KeyValueStore>;

/// Application context: owns the configuration, the technician settings and
/// the one report session. Front ends receive it instead of reaching for
/// global state.
pub struct ReportsApp {
    config: AppConfig,
    settings: SettingsStore,
    session: ReportSession<DynStorage>,
}

impl ReportsApp {
    pub fn open(config: AppConfig) -> Result<Self> {
        if config.backend != BackendKind::Memory {
            std::fs::create_dir_all(&config.data_dir).with_context(|| {
                format!("failed to create data directory {}", config.data_dir.display())
            })?;
        }

        let storage = config.open_storage()?;
        let settings = SettingsStore::new(config.settings_path())?;
        let store = DraftStore::with_key(storage, config.storage_key.clone());
        let session = ReportSession::new(store).with_profile(settings.technician());

        log::info!(
            "Report storage ready ({} backend, {} drafts)",
            config.backend,
            session.drafts().len()
        );

        Ok(Self {
            config,
            settings,
            session,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn session(&self) -> &ReportSession<DynStorage> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ReportSession<DynStorage> {
        &mut self.session
    }

    pub fn apply_profile(&mut self, profile: TechnicianProfile) {
        self.session.set_profile(profile);
    }

    /// Hands the session to a debounced auto-saver using the configured idle
    /// period. Edits through the saver spawn tokio tasks.
    pub fn into_autosaver(self) -> AutoSaver<DynStorage> {
        AutoSaver::new(Arc::new(Mutex::new(self.session)), self.config.autosave_idle)
    }
}

pub fn run() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    // RUST_LOG still overrides the default filter.
    let default_level = if config.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();
    let result = ReportsApp::open(config).and_then(|mut app| cli::execute(&mut app, cli.command));

    match result {
        Ok(output) => println!("{output}"),
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

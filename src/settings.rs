use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{log_warn, models::ReportDraft};

const ENABLE_LOGS: bool = true;

/// Details of the technician using this installation. Copied into each new
/// report so the wizard does not ask for them every time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicianProfile {
    pub name: String,
    pub position: String,
    pub phone: String,
    pub email: String,
    /// Pre-filled recipient for the email handoff.
    pub default_recipient: String,
}

impl TechnicianProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.phone.is_empty() && self.email.is_empty()
    }

    pub fn prefill(&self, report: &mut ReportDraft) {
        let info = &mut report.general_info;
        info.technician_name = self.name.clone();
        info.technician_phone = self.phone.clone();
        info.technician_email = self.email.clone();

        let astap = &mut report.responsible_parties.astap;
        astap.name = self.name.clone();
        astap.position = self.position.clone();
        astap.phone = self.phone.clone();
        astap.email = self.email.clone();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    technician: TechnicianProfile,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn technician(&self) -> TechnicianProfile {
        self.read().technician.clone()
    }

    pub fn update_technician(&self, profile: TechnicianProfile) -> Result<()> {
        let mut guard = self.write();
        guard.technician = profile;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

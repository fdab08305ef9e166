//! Durable collection of report drafts.
//!
//! The whole collection lives as one JSON array under a single storage key
//! and is rewritten on every persist. Reads never fail: a missing, unreadable
//! or corrupt payload is logged and treated as an empty collection. A single
//! record that no longer decodes is skipped on read but written back untouched,
//! so one bad record never takes the others down with it. Writes are best
//! effort: a failed write is logged and the caller still receives the record
//! it asked to store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::generate_report_id;
use crate::{
    log_debug, log_error, log_warn,
    models::ReportDraft,
    storage::KeyValueStore,
};

const ENABLE_LOGS: bool = true;

pub const DEFAULT_STORAGE_KEY: &str = "astap_service_reports";

/// One element of the stored array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum StoredEntry {
    Draft(ReportDraft),
    Unreadable(Value),
}

impl StoredEntry {
    fn id(&self) -> Option<&str> {
        match self {
            StoredEntry::Draft(draft) => draft.id.as_deref(),
            StoredEntry::Unreadable(value) => value.get("id").and_then(Value::as_str),
        }
    }
}

pub struct DraftStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All readable drafts in stored order.
    pub fn load_all(&self) -> Vec<ReportDraft> {
        self.load_entries()
            .into_iter()
            .filter_map(|entry| match entry {
                StoredEntry::Draft(draft) => Some(draft),
                StoredEntry::Unreadable(_) => None,
            })
            .collect()
    }

    /// Inserts or replaces `draft` and returns the stored record.
    ///
    /// A draft without an id gets a fresh one and `created_at == updated_at`.
    /// A draft whose id is already stored replaces that record in place and
    /// keeps its original `created_at`. NaN or infinite material amounts are
    /// stored as zero.
    pub fn upsert(&self, draft: ReportDraft) -> ReportDraft {
        let mut entries = self.load_entries();
        let now = Utc::now();
        let mut record = draft;

        let zeroed = record.zero_non_finite_amounts();
        if zeroed > 0 {
            log_warn!("Zeroed non-finite amounts on {zeroed} material lines before saving");
        }

        let existing_id = record.id.take().filter(|id| !id.trim().is_empty());
        match existing_id {
            None => {
                let id = unique_id(&entries);
                log_debug!("Assigning id {id} to new report draft");
                record.id = Some(id);
                record.created_at = Some(now);
                record.updated_at = Some(now);
                entries.push(StoredEntry::Draft(record.clone()));
            }
            Some(id) => {
                let position = entries.iter().position(|entry| entry.id() == Some(id.as_str()));
                record.id = Some(id);

                let prior = position.and_then(|index| match &entries[index] {
                    StoredEntry::Draft(prior) => Some((prior.created_at, prior.updated_at)),
                    StoredEntry::Unreadable(_) => None,
                });
                match prior {
                    Some((prior_created, prior_updated)) => {
                        record.created_at = prior_created.or(record.created_at).or(Some(now));
                        // never move updated_at backwards, even if the clock does
                        record.updated_at = Some(match prior_updated {
                            Some(prior_updated) if prior_updated > now => prior_updated,
                            _ => now,
                        });
                    }
                    None => {
                        record.created_at = record.created_at.or(Some(now));
                        record.updated_at = Some(now);
                    }
                }

                match position {
                    Some(index) => entries[index] = StoredEntry::Draft(record.clone()),
                    None => entries.push(StoredEntry::Draft(record.clone())),
                }
            }
        }

        self.persist(&entries);
        record
    }

    pub fn get_by_id(&self, id: &str) -> Option<ReportDraft> {
        self.load_all()
            .into_iter()
            .find(|draft| draft.id.as_deref() == Some(id))
    }

    /// Removes the draft with `id`; unknown ids are ignored.
    pub fn remove(&self, id: &str) {
        let mut entries = self.load_entries();
        let before = entries.len();
        entries.retain(|entry| entry.id() != Some(id));

        if entries.len() == before {
            log_debug!("No report draft with id {id} to remove");
        }
        self.persist(&entries);
    }

    pub fn clear_all(&self) {
        self.persist(&[]);
    }

    fn load_entries(&self) -> Vec<StoredEntry> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                log_warn!("Failed to read report drafts from '{}': {err}", self.key);
                return Vec::new();
            }
        };

        let values = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values,
            Err(err) => {
                log_warn!(
                    "Stored report drafts under '{}' are unreadable, treating as empty: {err}",
                    self.key
                );
                return Vec::new();
            }
        };

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match ReportDraft::deserialize(&value) {
                Ok(draft) => StoredEntry::Draft(draft),
                Err(err) => {
                    log_warn!("Skipping unreadable report draft #{index} under '{}': {err}", self.key);
                    StoredEntry::Unreadable(value)
                }
            })
            .collect()
    }

    fn persist(&self, entries: &[StoredEntry]) {
        let serialized = match serde_json::to_string(entries) {
            Ok(serialized) => serialized,
            Err(err) => {
                log_error!("Failed to serialize report drafts: {err}");
                return;
            }
        };

        if let Err(err) = self.storage.set_item(&self.key, &serialized) {
            log_error!(
                "Failed to persist {} report drafts under '{}'; changes are held in memory only: {err}",
                entries.len(),
                self.key
            );
        }
    }
}

fn unique_id(existing: &[StoredEntry]) -> String {
    loop {
        let candidate = generate_report_id();
        if !existing
            .iter()
            .any(|entry| entry.id() == Some(candidate.as_str()))
        {
            return candidate;
        }
    }
}

use thiserror::Error;
use uuid::Uuid;

use crate::{
    drafts::DraftStore,
    log_debug, log_info,
    models::{MaterialLine, ReportDraft, ReportPatch, ReportStatus, Signer, TestRow},
    settings::TechnicianProfile,
    storage::KeyValueStore,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no active report; start a new report or load an existing one")]
    NoActiveReport,
    #[error("no {section} row with id '{id}'")]
    RowNotFound { section: &'static str, id: String },
    #[error("material line '{id}' has a non-finite {field}")]
    InvalidAmount { id: String, field: &'static str },
}

/// Which testing table a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Before,
    After,
}

impl TestPhase {
    fn section(&self) -> &'static str {
        match self {
            TestPhase::Before => "beforeTesting",
            TestPhase::After => "afterTesting",
        }
    }
}

/// Holds the single active report of a wizard session and the cached list
/// of stored drafts. All persistence goes through the [`DraftStore`].
pub struct ReportSession<S> {
    store: DraftStore<S>,
    active: Option<ReportDraft>,
    drafts: Vec<ReportDraft>,
    profile: Option<TechnicianProfile>,
    generation: u64,
}

impl<S: KeyValueStore> ReportSession<S> {
    /// Loads every stored draft and resumes the most recently inserted one.
    pub fn new(store: DraftStore<S>) -> Self {
        let drafts = store.load_all();
        let active = drafts.last().cloned();
        if let Some(report) = &active {
            log_info!(
                "Resuming report {} ({} drafts stored)",
                report.id.as_deref().unwrap_or_default(),
                drafts.len()
            );
        }

        Self {
            store,
            active,
            drafts,
            profile: None,
            generation: 0,
        }
    }

    /// Technician details copied into every report started afterwards.
    pub fn with_profile(mut self, profile: TechnicianProfile) -> Self {
        self.set_profile(profile);
        self
    }

    pub fn set_profile(&mut self, profile: TechnicianProfile) {
        self.profile = (!profile.is_empty()).then_some(profile);
    }

    pub fn store(&self) -> &DraftStore<S> {
        &self.store
    }

    pub fn active(&self) -> Option<&ReportDraft> {
        self.active.as_ref()
    }

    pub fn drafts(&self) -> &[ReportDraft] {
        &self.drafts
    }

    /// Changes whenever the active slot switches to another report (start,
    /// load, delete, clear). Saving the active report keeps it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn replace_active(&mut self, report: Option<ReportDraft>) {
        self.active = report;
        self.generation += 1;
    }

    pub fn start_new(&mut self) -> &ReportDraft {
        let mut report = ReportDraft::new();
        if let Some(profile) = &self.profile {
            profile.prefill(&mut report);
        }
        self.generation += 1;
        self.active.insert(report)
    }

    pub fn load_existing(&mut self, id: &str) -> Option<&ReportDraft> {
        let found = self.store.get_by_id(id);
        self.replace_active(found);
        if self.active.is_none() {
            log_debug!("Report {id} not found; no active report");
        }
        self.active.as_ref()
    }

    pub fn save_draft(&mut self, patch: ReportPatch) -> ReportDraft {
        self.save_with_status(patch, Some(ReportStatus::Draft))
    }

    pub fn save_completed(&mut self, patch: ReportPatch) -> ReportDraft {
        self.save_with_status(patch, Some(ReportStatus::Completed))
    }

    /// Persists the active report without touching its status. Used by the
    /// auto-save flush so a completed report stays completed.
    pub fn save_keeping_status(&mut self, patch: ReportPatch) -> ReportDraft {
        self.save_with_status(patch, None)
    }

    fn save_with_status(
        &mut self,
        patch: ReportPatch,
        status: Option<ReportStatus>,
    ) -> ReportDraft {
        let mut report = match self.active.take() {
            Some(report) => report,
            None => {
                self.generation += 1;
                ReportDraft::new()
            }
        };
        patch.apply_to(&mut report);
        if let Some(status) = status {
            report.status = status;
        }

        let saved = self.store.upsert(report);
        log_info!(
            "Saved report {} as {}",
            saved.id.as_deref().unwrap_or_default(),
            saved.status.as_str()
        );
        self.active = Some(saved.clone());
        self.refresh();
        saved
    }

    pub fn delete_draft(&mut self, id: &str) {
        self.store.remove(id);
        self.refresh();

        let was_active = self
            .active
            .as_ref()
            .is_some_and(|report| report.id.as_deref() == Some(id));
        if was_active {
            self.replace_active(None);
        }
    }

    /// Deletes every stored draft. An unsaved active report survives.
    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.refresh();
        if self.active.as_ref().is_some_and(ReportDraft::is_persisted) {
            self.replace_active(None);
        }
    }

    /// Applies `patch` to the stored report `id` and saves it with its status
    /// unchanged, leaving the active report alone. `None` when no such report
    /// is stored.
    pub fn save_patch_to(&mut self, id: &str, patch: ReportPatch) -> Option<ReportDraft> {
        let mut report = self.store.get_by_id(id)?;
        patch.apply_to(&mut report);
        let saved = self.store.upsert(report);
        self.refresh();
        Some(saved)
    }

    /// Re-reads the cached draft list from the store.
    pub fn refresh(&mut self) -> &[ReportDraft] {
        self.drafts = self.store.load_all();
        &self.drafts
    }

    /// Applies a section edit to the active report in memory only.
    pub fn apply_edit(&mut self, patch: ReportPatch) -> Result<&ReportDraft, SessionError> {
        let report = self.active_mut()?;
        patch.apply_to(report);
        Ok(report)
    }

    pub fn add_test_row(&mut self, phase: TestPhase, mut row: TestRow) -> Result<String, SessionError> {
        let rows = self.test_rows_mut(phase)?;
        if row.id.trim().is_empty() || rows.iter().any(|existing| existing.id == row.id) {
            row.id = new_row_id();
        }
        let id = row.id.clone();
        rows.push(row);
        Ok(id)
    }

    pub fn update_test_row(&mut self, phase: TestPhase, row: TestRow) -> Result<(), SessionError> {
        let rows = self.test_rows_mut(phase)?;
        let slot = rows
            .iter_mut()
            .find(|existing| existing.id == row.id)
            .ok_or_else(|| SessionError::RowNotFound {
                section: phase.section(),
                id: row.id.clone(),
            })?;
        *slot = row;
        Ok(())
    }

    pub fn remove_test_row(&mut self, phase: TestPhase, id: &str) -> Result<TestRow, SessionError> {
        let rows = self.test_rows_mut(phase)?;
        let index = rows
            .iter()
            .position(|existing| existing.id == id)
            .ok_or_else(|| SessionError::RowNotFound {
                section: phase.section(),
                id: id.to_string(),
            })?;
        Ok(rows.remove(index))
    }

    pub fn add_material(&mut self, mut line: MaterialLine) -> Result<String, SessionError> {
        let lines = &mut self.active_mut()?.materials_usage;
        if line.id.trim().is_empty() || lines.iter().any(|existing| existing.id == line.id) {
            line.id = new_row_id();
        }
        line.recompute_total();
        check_amounts(&line)?;
        let id = line.id.clone();
        lines.push(line);
        Ok(id)
    }

    pub fn update_material(&mut self, mut line: MaterialLine) -> Result<(), SessionError> {
        let lines = &mut self.active_mut()?.materials_usage;
        let slot = lines
            .iter_mut()
            .find(|existing| existing.id == line.id)
            .ok_or_else(|| SessionError::RowNotFound {
                section: "materialsUsage",
                id: line.id.clone(),
            })?;
        line.recompute_total();
        check_amounts(&line)?;
        *slot = line;
        Ok(())
    }

    pub fn remove_material(&mut self, id: &str) -> Result<MaterialLine, SessionError> {
        let lines = &mut self.active_mut()?.materials_usage;
        let index = lines
            .iter()
            .position(|existing| existing.id == id)
            .ok_or_else(|| SessionError::RowNotFound {
                section: "materialsUsage",
                id: id.to_string(),
            })?;
        Ok(lines.remove(index))
    }

    /// Stores a captured signature, or clears it with `None`.
    pub fn set_signature(&mut self, signer: Signer, payload: Option<String>) -> Result<(), SessionError> {
        let payload = payload.filter(|data| !data.trim().is_empty());
        self.active_mut()?.digital_signatures.set(signer, payload);
        Ok(())
    }

    fn active_mut(&mut self) -> Result<&mut ReportDraft, SessionError> {
        self.active.as_mut().ok_or(SessionError::NoActiveReport)
    }

    fn test_rows_mut(&mut self, phase: TestPhase) -> Result<&mut Vec<TestRow>, SessionError> {
        let report = self.active_mut()?;
        Ok(match phase {
            TestPhase::Before => &mut report.before_testing,
            TestPhase::After => &mut report.after_testing,
        })
    }
}

fn check_amounts(line: &MaterialLine) -> Result<(), SessionError> {
    match line.non_finite_amount() {
        Some(field) => Err(SessionError::InvalidAmount {
            id: line.id.clone(),
            field,
        }),
        None => Ok(()),
    }
}

fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;
    use crate::{models::GeneralInfo, storage::MemoryStorage};

    fn session() -> ReportSession<Arc<MemoryStorage>> {
        ReportSession::new(DraftStore::new(Arc::new(MemoryStorage::new())))
    }

    fn client_patch(client: &str) -> ReportPatch {
        ReportPatch::general_info(GeneralInfo {
            client: client.into(),
            ..Default::default()
        })
    }

    #[test]
    fn start_new_then_save_draft_assigns_id() {
        let mut session = session();
        assert!(session.active().is_none());

        let fresh = session.start_new();
        assert_eq!(fresh.id, None);
        assert_eq!(fresh.status, ReportStatus::Draft);

        let saved = session.save_draft(client_patch("ACME"));
        assert!(saved.id.is_some());
        assert_eq!(saved.status, ReportStatus::Draft);
        assert_eq!(saved.general_info.client, "ACME");
        assert_eq!(session.active(), Some(&saved));
        assert_eq!(session.drafts().len(), 1);
    }

    #[test]
    fn sequential_saves_update_one_record() {
        let mut session = session();
        session.start_new();
        let first = session.save_draft(client_patch("ACME"));
        thread::sleep(Duration::from_millis(2));
        let second = session.save_draft(client_patch("ACME Corp"));

        assert_eq!(first.id, second.id);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(session.drafts().len(), 1);
        assert_eq!(session.drafts()[0].general_info.client, "ACME Corp");
    }

    #[test]
    fn save_completed_forces_status() {
        let mut session = session();
        session.start_new();
        session.save_draft(client_patch("ACME"));
        let completed = session.save_completed(ReportPatch::default());
        assert_eq!(completed.status, ReportStatus::Completed);

        let kept = session.save_keeping_status(client_patch("ACME 2"));
        assert_eq!(kept.status, ReportStatus::Completed);
        assert_eq!(session.drafts().len(), 1);
    }

    #[test]
    fn save_without_active_report_starts_from_empty() {
        let mut session = session();
        let saved = session.save_draft(client_patch("Walk-in"));
        assert!(saved.id.is_some());
        assert_eq!(saved.general_info.client, "Walk-in");
    }

    #[test]
    fn delete_active_clears_it_and_it_cannot_be_reloaded() {
        let mut session = session();
        session.start_new();
        let saved = session.save_draft(client_patch("ACME"));
        let id = saved.id.unwrap();

        session.delete_draft(&id);
        assert!(session.active().is_none());
        assert!(session.drafts().is_empty());
        assert!(session.load_existing(&id).is_none());
    }

    #[test]
    fn deleting_another_draft_keeps_active() {
        let mut session = session();
        session.start_new();
        let other = session.save_draft(client_patch("Other"));
        session.start_new();
        let mine = session.save_draft(client_patch("Mine"));

        session.delete_draft(other.id.as_deref().unwrap());
        assert_eq!(session.active().and_then(|r| r.id.clone()), mine.id);
        assert_eq!(session.drafts().len(), 1);
    }

    #[test]
    fn initialization_resumes_last_stored_draft() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut first = ReportSession::new(DraftStore::new(storage.clone()));
            first.start_new();
            first.save_draft(client_patch("older"));
            first.start_new();
            first.save_draft(client_patch("newer"));
        }

        let resumed = ReportSession::new(DraftStore::new(storage));
        assert_eq!(resumed.drafts().len(), 2);
        assert_eq!(resumed.active().unwrap().general_info.client, "newer");
    }

    #[test]
    fn load_existing_switches_active_report() {
        let mut session = session();
        session.start_new();
        let first = session.save_draft(client_patch("first"));
        session.start_new();
        session.save_draft(client_patch("second"));

        let loaded = session.load_existing(first.id.as_deref().unwrap()).unwrap();
        assert_eq!(loaded.general_info.client, "first");
        assert!(session.load_existing("report_unknown").is_none());
        assert!(session.active().is_none());
    }

    #[test]
    fn profile_prefills_new_reports() {
        let profile = TechnicianProfile {
            name: "Ana Torres".into(),
            phone: "+51 999 000 111".into(),
            email: "ana@astap.example".into(),
            ..Default::default()
        };
        let mut session = session().with_profile(profile);
        let report = session.start_new();
        assert_eq!(report.general_info.technician_name, "Ana Torres");
        assert_eq!(report.responsible_parties.astap.email, "ana@astap.example");
    }

    #[test]
    fn clear_all_drops_persisted_active_only() {
        let mut session = session();
        session.start_new();
        session.save_draft(client_patch("stored"));
        session.clear_all();
        assert!(session.active().is_none());
        assert!(session.drafts().is_empty());

        session.start_new();
        session.clear_all();
        assert!(session.active().is_some());
    }

    #[test]
    fn edits_require_an_active_report() {
        let mut session = session();
        assert_eq!(
            session.apply_edit(client_patch("x")).unwrap_err(),
            SessionError::NoActiveReport
        );
        assert_eq!(
            session.add_material(MaterialLine::default()).unwrap_err(),
            SessionError::NoActiveReport
        );
    }

    #[test]
    fn apply_edit_changes_memory_but_not_store() {
        let mut session = session();
        session.start_new();
        session.save_draft(client_patch("stored"));
        session.apply_edit(client_patch("edited")).unwrap();

        assert_eq!(session.active().unwrap().general_info.client, "edited");
        assert_eq!(session.store().load_all()[0].general_info.client, "stored");
    }

    #[test]
    fn test_rows_are_edited_and_removed_by_id() {
        let mut session = session();
        session.start_new();

        let id = session
            .add_test_row(
                TestPhase::Before,
                TestRow {
                    parameter: "Suction pressure".into(),
                    expected_value: "120 psi".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        let dup = session
            .add_test_row(
                TestPhase::Before,
                TestRow {
                    id: id.clone(),
                    parameter: "Discharge pressure".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_ne!(id, dup);

        session
            .update_test_row(
                TestPhase::Before,
                TestRow {
                    id: id.clone(),
                    parameter: "Suction pressure".into(),
                    actual_value: "118 psi".into(),
                    status: "ok".into(),
                    ..Default::default()
                },
            )
            .unwrap();

        let report = session.active().unwrap();
        assert_eq!(report.before_testing[0].actual_value, "118 psi");
        assert!(report.after_testing.is_empty());

        let removed = session.remove_test_row(TestPhase::Before, &id).unwrap();
        assert_eq!(removed.parameter, "Suction pressure");
        assert_eq!(
            session.remove_test_row(TestPhase::Before, &id).unwrap_err(),
            SessionError::RowNotFound {
                section: "beforeTesting",
                id
            }
        );
    }

    #[test]
    fn material_lines_keep_totals_in_sync() {
        let mut session = session();
        session.start_new();

        let id = session
            .add_material(MaterialLine {
                quantity: 4.0,
                material_name: "Copper pipe 3/8".into(),
                unit_price: 5.5,
                total_price: 0.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.active().unwrap().materials_usage[0].total_price, 22.0);

        session
            .update_material(MaterialLine {
                id: id.clone(),
                quantity: 2.0,
                material_name: "Copper pipe 3/8".into(),
                unit_price: 5.5,
                total_price: 999.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.active().unwrap().materials_total(), 11.0);

        session.remove_material(&id).unwrap();
        assert!(session.active().unwrap().materials_usage.is_empty());
    }

    #[test]
    fn non_finite_material_amounts_are_rejected() {
        let mut session = session();
        session.start_new();

        let err = session
            .add_material(MaterialLine {
                id: "m1".into(),
                quantity: 1e200,
                unit_price: 1e200,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidAmount {
                id: "m1".into(),
                field: "totalPrice"
            }
        );
        assert!(session.active().unwrap().materials_usage.is_empty());

        let id = session
            .add_material(MaterialLine {
                quantity: 1.0,
                unit_price: 3.0,
                ..Default::default()
            })
            .unwrap();
        let err = session
            .update_material(MaterialLine {
                id: id.clone(),
                quantity: f64::NAN,
                unit_price: 3.0,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidAmount { id, field: "quantity" });
        assert_eq!(session.active().unwrap().materials_total(), 3.0);
    }

    #[test]
    fn generation_moves_when_active_report_switches() {
        let mut session = session();
        let start = session.generation();

        session.start_new();
        let started = session.generation();
        assert_ne!(started, start);

        let saved = session.save_draft(client_patch("A"));
        session.save_draft(client_patch("A again"));
        assert_eq!(session.generation(), started);

        session.load_existing(saved.id.as_deref().unwrap());
        let loaded = session.generation();
        assert_ne!(loaded, started);

        session.delete_draft(saved.id.as_deref().unwrap());
        assert_ne!(session.generation(), loaded);
    }

    #[test]
    fn save_patch_to_leaves_active_report_alone() {
        let mut session = session();
        session.start_new();
        let a = session.save_draft(client_patch("A"));
        session.start_new();
        let b = session.save_draft(client_patch("B"));

        let saved = session
            .save_patch_to(a.id.as_deref().unwrap(), client_patch("A edited"))
            .unwrap();
        assert_eq!(saved.id, a.id);
        assert_eq!(session.active().unwrap().id, b.id);
        let clients: Vec<_> = session
            .drafts()
            .iter()
            .map(|d| d.general_info.client.as_str())
            .collect();
        assert_eq!(clients, vec!["A edited", "B"]);

        assert!(session.save_patch_to("report_gone", client_patch("x")).is_none());
    }

    #[test]
    fn signatures_are_captured_and_cleared() {
        let mut session = session();
        session.start_new();
        session
            .set_signature(Signer::Client, Some("data:image/png;base64,AAAA".into()))
            .unwrap();
        assert!(session.active().unwrap().digital_signatures.client.is_some());

        session.set_signature(Signer::Client, Some("   ".into())).unwrap();
        assert!(session.active().unwrap().digital_signatures.client.is_none());
    }
}

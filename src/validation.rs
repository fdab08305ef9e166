//! Checks run before a report is turned into a document or handed to the
//! mail client. Routine edits and draft saves are never validated.

use thiserror::Error;

use crate::models::ReportDraft;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("report is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl ValidationError {
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ValidationError::MissingFields(fields) => fields,
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Reports every missing required field at once, using the persisted
/// camelCase field paths so the wizard can highlight them.
pub fn validate_for_export(report: &ReportDraft) -> Result<(), ValidationError> {
    let info = &report.general_info;
    let parties = &report.responsible_parties;
    let signatures = &report.digital_signatures;

    let checks: [(&'static str, bool); 7] = [
        ("generalInfo.client", blank(&info.client)),
        ("generalInfo.serviceDate", blank(&info.service_date)),
        ("generalInfo.technicianName", blank(&info.technician_name)),
        ("responsibleParties.astap.name", blank(&parties.astap.name)),
        ("responsibleParties.client.name", blank(&parties.client.name)),
        (
            "digitalSignatures.astap",
            signatures.astap.as_deref().map_or(true, blank),
        ),
        (
            "digitalSignatures.client",
            signatures.client.as_deref().map_or(true, blank),
        ),
    ];

    let missing: Vec<&'static str> = checks
        .into_iter()
        .filter_map(|(field, is_missing)| is_missing.then_some(field))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

#[cfg(test)]
pub(crate) fn export_ready_report() -> ReportDraft {
    let mut report = ReportDraft::new();
    report.general_info.client = "ACME".into();
    report.general_info.service_date = "2026-10-19".into();
    report.general_info.technician_name = "Ana Torres".into();
    report.responsible_parties.astap.name = "Ana Torres".into();
    report.responsible_parties.client.name = "Jorge Paz".into();
    report.digital_signatures.astap = Some("data:image/png;base64,QVNUQVA=".into());
    report.digital_signatures.client = Some("data:image/png;base64,Q0xJRU5U".into());
    report
}

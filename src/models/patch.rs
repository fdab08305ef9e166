use serde::{Deserialize, Serialize};

use super::report::{
    ActivitiesIncidents, DigitalSignatures, EquipmentDetails, GeneralInfo, MaterialLine,
    ReportDraft, ResponsibleParties, TestRow,
};

/// Partial update sent by a wizard section. Each present section replaces the
/// whole section on the target report; absent sections are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_info: Option<GeneralInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_testing: Option<Vec<TestRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_testing: Option<Vec<TestRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities_incidents: Option<ActivitiesIncidents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials_usage: Option<Vec<MaterialLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_details: Option<EquipmentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_parties: Option<ResponsibleParties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_signatures: Option<DigitalSignatures>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn general_info(info: GeneralInfo) -> Self {
        Self {
            general_info: Some(info),
            ..Default::default()
        }
    }

    pub fn apply_to(self, report: &mut ReportDraft) {
        if let Some(section) = self.general_info {
            report.general_info = section;
        }
        if let Some(section) = self.before_testing {
            report.before_testing = section;
        }
        if let Some(section) = self.after_testing {
            report.after_testing = section;
        }
        if let Some(section) = self.activities_incidents {
            report.activities_incidents = section;
        }
        if let Some(section) = self.materials_usage {
            report.materials_usage = section;
        }
        if let Some(section) = self.equipment_details {
            report.equipment_details = section;
        }
        if let Some(section) = self.responsible_parties {
            report.responsible_parties = section;
        }
        if let Some(section) = self.digital_signatures {
            report.digital_signatures = section;
        }
    }

    /// Folds a later patch into this one; sections present in `later` win.
    pub fn merge(&mut self, later: ReportPatch) {
        fn take<T>(slot: &mut Option<T>, later: Option<T>) {
            if later.is_some() {
                *slot = later;
            }
        }

        take(&mut self.general_info, later.general_info);
        take(&mut self.before_testing, later.before_testing);
        take(&mut self.after_testing, later.after_testing);
        take(&mut self.activities_incidents, later.activities_incidents);
        take(&mut self.materials_usage, later.materials_usage);
        take(&mut self.equipment_details, later.equipment_details);
        take(&mut self.responsible_parties, later.responsible_parties);
        take(&mut self.digital_signatures, later.digital_signatures);
    }
}

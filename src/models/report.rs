//! Report draft data model.
//!
//! Every shape serializes with camelCase keys so the persisted array matches
//! what the report wizard writes. Missing keys default to empty values, which
//! keeps payloads written by older builds loadable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Draft,
    Completed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralInfo {
    pub client: String,
    pub internal_code: String,
    pub service_date: String,
    pub address: String,
    pub reference: String,
    pub technician_name: String,
    pub technician_phone: String,
    pub technician_email: String,
}

/// One row of the before/after testing tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TestRow {
    pub id: String,
    pub parameter: String,
    pub expected_value: String,
    pub actual_value: String,
    pub status: String,
    pub observations: String,
    /// Image data URL attached as evidence for this measurement.
    pub evidence_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CapturedImage {
    pub data_url: String,
    /// Path of the file the image was captured from, when it came from disk.
    pub file: Option<String>,
    pub file_name: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitiesIncidents {
    pub activities: String,
    pub incidents: String,
    pub observations: String,
    pub activity_images: Vec<CapturedImage>,
    pub incident_images: Vec<CapturedImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialLine {
    pub id: String,
    #[serde(deserialize_with = "finite_or_zero")]
    pub quantity: f64,
    pub material_name: String,
    pub material_code: String,
    #[serde(deserialize_with = "finite_or_zero")]
    pub unit_price: f64,
    #[serde(deserialize_with = "finite_or_zero")]
    pub total_price: f64,
}

impl MaterialLine {
    pub fn recompute_total(&mut self) {
        self.total_price = self.quantity * self.unit_price;
    }

    /// Name of the first amount that is NaN or infinite, if any.
    pub fn non_finite_amount(&self) -> Option<&'static str> {
        [
            ("quantity", self.quantity),
            ("unitPrice", self.unit_price),
            ("totalPrice", self.total_price),
        ]
        .into_iter()
        .find_map(|(field, value)| (!value.is_finite()).then_some(field))
    }
}

// JSON has no NaN or infinity; serde_json writes them as `null`.
fn finite_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|amount| amount.is_finite()).unwrap_or(0.0))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentDetails {
    pub equipment_type: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub location: String,
    pub capacity: String,
    pub observations: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPerson {
    pub name: String,
    pub position: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponsibleParties {
    pub astap: ContactPerson,
    pub client: ContactPerson,
}

/// Signature payloads, each an image data URL once captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalSignatures {
    pub astap: Option<String>,
    pub client: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Signer {
    Astap,
    Client,
}

impl DigitalSignatures {
    pub fn get(&self, signer: Signer) -> Option<&str> {
        match signer {
            Signer::Astap => self.astap.as_deref(),
            Signer::Client => self.client.as_deref(),
        }
    }

    pub fn set(&mut self, signer: Signer, payload: Option<String>) {
        match signer {
            Signer::Astap => self.astap = payload,
            Signer::Client => self.client = payload,
        }
    }
}

/// The persisted unit. `id`, `created_at` and `updated_at` stay `None` until
/// the draft store saves the report for the first time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDraft {
    pub id: Option<String>,
    pub status: ReportStatus,
    pub general_info: GeneralInfo,
    pub before_testing: Vec<TestRow>,
    pub after_testing: Vec<TestRow>,
    pub activities_incidents: ActivitiesIncidents,
    pub materials_usage: Vec<MaterialLine>,
    pub equipment_details: EquipmentDetails,
    pub responsible_parties: ResponsibleParties,
    pub digital_signatures: DigitalSignatures,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReportDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn materials_total(&self) -> f64 {
        self.materials_usage.iter().map(|line| line.total_price).sum()
    }

    /// Zeroes every NaN or infinite material amount. Returns how many lines
    /// were touched.
    pub fn zero_non_finite_amounts(&mut self) -> usize {
        let mut touched = 0;
        for line in &mut self.materials_usage {
            if line.non_finite_amount().is_none() {
                continue;
            }
            for amount in [&mut line.quantity, &mut line.unit_price, &mut line.total_price] {
                if !amount.is_finite() {
                    *amount = 0.0;
                }
            }
            touched += 1;
        }
        touched
    }

    /// Short human label used in listings: client name, falling back to the
    /// internal code and then to the id.
    pub fn display_name(&self) -> &str {
        let info = &self.general_info;
        if !info.client.trim().is_empty() {
            &info.client
        } else if !info.internal_code.trim().is_empty() {
            &info.internal_code
        } else {
            self.id.as_deref().unwrap_or("(unsaved report)")
        }
    }
}

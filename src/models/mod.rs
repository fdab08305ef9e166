pub mod patch;
pub mod report;

pub use patch::ReportPatch;
pub use report::{
    ActivitiesIncidents, CapturedImage, ContactPerson, DigitalSignatures, EquipmentDetails,
    GeneralInfo, MaterialLine, ReportDraft, ReportStatus, ResponsibleParties, Signer, TestRow,
};

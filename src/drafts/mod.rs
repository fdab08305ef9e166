mod ids;
pub mod store;

pub use ids::{generate_report_id, REPORT_ID_PREFIX};
pub use store::{DraftStore, DEFAULT_STORAGE_KEY};

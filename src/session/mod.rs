pub mod autosave;
pub mod controller;

pub use autosave::AutoSaver;
pub use controller::{ReportSession, SessionError, TestPhase};

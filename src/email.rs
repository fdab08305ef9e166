//! Mail-client handoff. Nothing is sent from here: the caller opens the
//! `mailto:` link and the technician's mail client takes over.

use thiserror::Error;

use crate::{document, models::ReportDraft};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("'{0}' is not a valid email address")]
    InvalidRecipient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailHandoff {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailHandoff {
    pub fn new(to: &str, subject: impl Into<String>, body: impl Into<String>) -> Result<Self, EmailError> {
        let to = to.trim();
        if !looks_like_email(to) {
            return Err(EmailError::InvalidRecipient(to.to_string()));
        }
        Ok(Self {
            to: to.to_string(),
            subject: subject.into(),
            body: body.into(),
        })
    }

    /// Subject and body announcing the exported document for `report`.
    pub fn for_report(report: &ReportDraft, to: &str) -> Result<Self, EmailError> {
        let info = &report.general_info;
        let mut subject = String::from("ASTAP Service Report");
        if !info.client.trim().is_empty() {
            subject.push_str(" - ");
            subject.push_str(info.client.trim());
        }
        if !info.service_date.trim().is_empty() {
            subject.push_str(&format!(" ({})", info.service_date.trim()));
        }

        let mut body = String::from("Hello,\n\nPlease find attached the service report");
        if !info.client.trim().is_empty() {
            body.push_str(&format!(" for {}", info.client.trim()));
        }
        body.push_str(".\n\n");
        body.push_str(&format!("Document: {}\n", document::file_name(report)));
        if !info.reference.trim().is_empty() {
            body.push_str(&format!("Reference: {}\n", info.reference.trim()));
        }
        if !info.technician_name.trim().is_empty() {
            body.push_str(&format!("\nRegards,\n{}\n", info.technician_name.trim()));
            if !info.technician_phone.trim().is_empty() {
                body.push_str(&format!("{}\n", info.technician_phone.trim()));
            }
        }

        Self::new(to, subject, body)
    }

    pub fn mailto_url(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.to,
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

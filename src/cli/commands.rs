use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};

use super::{Command, ExportFormat, ProfileAction};
use crate::{
    document::ReportDocument,
    email::MailHandoff,
    models::{GeneralInfo, ReportDraft, ReportPatch},
    validation::validate_for_export,
    ReportsApp,
};

/// Runs one CLI command against the app and returns what should be printed.
pub fn execute(app: &mut ReportsApp, command: Command) -> Result<String> {
    match command {
        Command::List => Ok(list(app)),
        Command::Show { id } => {
            let report = find(app, &id)?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Command::New {
            client,
            service_date,
            completed,
        } => {
            let session = app.session_mut();
            let mut info: GeneralInfo = session.start_new().general_info.clone();
            if let Some(client) = client {
                info.client = client;
            }
            if let Some(service_date) = service_date {
                info.service_date = service_date;
            }
            let patch = ReportPatch::general_info(info);
            let saved = if completed {
                session.save_completed(patch)
            } else {
                session.save_draft(patch)
            };
            Ok(saved_line(&saved))
        }
        Command::Save {
            id,
            patch,
            completed,
        } => {
            let patch = read_patch(&patch)?;
            let session = app.session_mut();
            if session.load_existing(&id).is_none() {
                bail!("no report with id '{id}'");
            }
            let saved = if completed {
                session.save_completed(patch)
            } else {
                session.save_draft(patch)
            };
            Ok(saved_line(&saved))
        }
        Command::Delete { id } => {
            find(app, &id)?;
            app.session_mut().delete_draft(&id);
            Ok(format!("deleted {id}"))
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to delete every report without --yes");
            }
            let count = app.session().drafts().len();
            app.session_mut().clear_all();
            Ok(format!("deleted {count} reports"))
        }
        Command::Preview { id } => {
            let report = find(app, &id)?;
            Ok(ReportDocument::from_report(&report).render_text())
        }
        Command::Export { id, format, out } => {
            let report = find(app, &id)?;
            validate_for_export(&report)?;
            let rendered = match format {
                ExportFormat::Json => serde_json::to_string_pretty(&report)?,
                ExportFormat::Document => {
                    serde_json::to_string_pretty(&ReportDocument::from_report(&report))?
                }
            };
            match out {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    Ok(format!("wrote {}", path.display()))
                }
                None => Ok(rendered),
            }
        }
        Command::Mailto { id, to } => {
            let report = find(app, &id)?;
            validate_for_export(&report)?;
            let recipient = match to {
                Some(to) => to,
                None => {
                    let fallback = app.settings().technician().default_recipient;
                    if fallback.trim().is_empty() {
                        bail!("no recipient given and no default recipient in the profile");
                    }
                    fallback
                }
            };
            let mail = MailHandoff::for_report(&report, &recipient)?;
            Ok(mail.mailto_url())
        }
        Command::Profile { action } => profile(app, action),
    }
}

fn profile(app: &mut ReportsApp, action: ProfileAction) -> Result<String> {
    match action {
        ProfileAction::Show => Ok(serde_json::to_string_pretty(&app.settings().technician())?),
        ProfileAction::Set {
            name,
            position,
            phone,
            email,
            recipient,
        } => {
            let mut profile = app.settings().technician();
            if let Some(name) = name {
                profile.name = name;
            }
            if let Some(position) = position {
                profile.position = position;
            }
            if let Some(phone) = phone {
                profile.phone = phone;
            }
            if let Some(email) = email {
                profile.email = email;
            }
            if let Some(recipient) = recipient {
                profile.default_recipient = recipient;
            }
            app.settings().update_technician(profile.clone())?;
            app.apply_profile(profile);
            Ok("profile updated".to_string())
        }
    }
}

fn list(app: &ReportsApp) -> String {
    let drafts = app.session().drafts();
    if drafts.is_empty() {
        return "no reports stored".to_string();
    }

    drafts
        .iter()
        .map(|report| {
            format!(
                "{}  {:<9}  {}  {}",
                report.id.as_deref().unwrap_or("-"),
                report.status.as_str(),
                report
                    .updated_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                report.display_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn find(app: &ReportsApp, id: &str) -> Result<ReportDraft> {
    app.session()
        .store()
        .get_by_id(id)
        .ok_or_else(|| anyhow!("no report with id '{id}'"))
}

fn read_patch(path: &Path) -> Result<ReportPatch> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read patch from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read patch {}", path.display()))?
    };
    serde_json::from_str(&raw).context("patch is not a valid report section update")
}

fn saved_line(report: &ReportDraft) -> String {
    format!(
        "saved {} ({})",
        report.id.as_deref().unwrap_or("-"),
        report.status.as_str()
    )
}

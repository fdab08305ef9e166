//! Document layout handed to the PDF renderer.
//!
//! A [`ReportDocument`] is an ordered list of named regions. The renderer
//! decides fonts and page breaks; this module only decides what goes where.
//! [`ReportDocument::render_text`] gives the plain-text preview shown before
//! exporting.

use serde::Serialize;

use crate::models::{ContactPerson, ReportDraft, TestRow};

pub const DOCUMENT_TITLE: &str = "ASTAP Service Report";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Region {
    /// Label/value pairs.
    Fields {
        name: &'static str,
        title: &'static str,
        fields: Vec<(String, String)>,
    },
    /// Free text block.
    Paragraph {
        name: &'static str,
        title: &'static str,
        body: String,
    },
    Table {
        name: &'static str,
        title: &'static str,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        footer: Option<Vec<String>>,
    },
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Fields { name, .. }
            | Region::Paragraph { name, .. }
            | Region::Table { name, .. } => *name,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: String,
    pub file_name: String,
    pub regions: Vec<Region>,
}

impl ReportDocument {
    pub fn from_report(report: &ReportDraft) -> Self {
        let info = &report.general_info;
        let mut regions = Vec::new();

        regions.push(Region::Fields {
            name: "general_info",
            title: "General information",
            fields: pairs(&[
                ("Client", &info.client),
                ("Internal code", &info.internal_code),
                ("Service date", &info.service_date),
                ("Address", &info.address),
                ("Reference", &info.reference),
                ("Technician", &info.technician_name),
                ("Technician phone", &info.technician_phone),
                ("Technician email", &info.technician_email),
            ]),
        });

        let equipment = &report.equipment_details;
        regions.push(Region::Fields {
            name: "equipment_details",
            title: "Equipment",
            fields: pairs(&[
                ("Type", &equipment.equipment_type),
                ("Brand", &equipment.brand),
                ("Model", &equipment.model),
                ("Serial number", &equipment.serial_number),
                ("Location", &equipment.location),
                ("Capacity", &equipment.capacity),
                ("Observations", &equipment.observations),
            ]),
        });

        regions.push(test_table("before_testing", "Tests before service", &report.before_testing));

        let activities = &report.activities_incidents;
        regions.push(Region::Paragraph {
            name: "activities",
            title: "Activities performed",
            body: with_image_note(&activities.activities, activities.activity_images.len()),
        });
        regions.push(Region::Paragraph {
            name: "incidents",
            title: "Incidents",
            body: with_image_note(&activities.incidents, activities.incident_images.len()),
        });
        if !activities.observations.trim().is_empty() {
            regions.push(Region::Paragraph {
                name: "observations",
                title: "Observations",
                body: activities.observations.clone(),
            });
        }

        regions.push(test_table("after_testing", "Tests after service", &report.after_testing));

        regions.push(Region::Table {
            name: "materials_usage",
            title: "Materials used",
            headers: ["Qty", "Code", "Material", "Unit price", "Total"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows: report
                .materials_usage
                .iter()
                .map(|line| {
                    vec![
                        format_quantity(line.quantity),
                        line.material_code.clone(),
                        line.material_name.clone(),
                        format!("{:.2}", line.unit_price),
                        format!("{:.2}", line.total_price),
                    ]
                })
                .collect(),
            footer: Some(vec![
                String::new(),
                String::new(),
                String::new(),
                "Total".to_string(),
                format!("{:.2}", report.materials_total()),
            ]),
        });

        let parties = &report.responsible_parties;
        let mut party_fields = contact_fields("ASTAP", &parties.astap);
        party_fields.extend(contact_fields("Client", &parties.client));
        regions.push(Region::Fields {
            name: "responsible_parties",
            title: "Responsible parties",
            fields: party_fields,
        });

        let signatures = &report.digital_signatures;
        regions.push(Region::Fields {
            name: "digital_signatures",
            title: "Signatures",
            fields: vec![
                ("ASTAP".to_string(), signature_state(signatures.astap.as_deref())),
                ("Client".to_string(), signature_state(signatures.client.as_deref())),
            ],
        });

        let subtitle = match (info.client.trim(), info.service_date.trim()) {
            ("", "") => String::new(),
            (client, "") => client.to_string(),
            ("", date) => date.to_string(),
            (client, date) => format!("{client} - {date}"),
        };

        Self {
            title: DOCUMENT_TITLE.to_string(),
            subtitle,
            file_name: file_name(report),
            regions,
        }
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.name() == name)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        if !self.subtitle.is_empty() {
            out.push_str(&self.subtitle);
            out.push('\n');
        }

        for region in &self.regions {
            out.push('\n');
            match region {
                Region::Fields { title, fields, .. } => {
                    push_heading(&mut out, title);
                    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
                    for (label, value) in fields {
                        out.push_str(&format!("  {label:<width$}  {value}\n"));
                    }
                }
                Region::Paragraph { title, body, .. } => {
                    push_heading(&mut out, title);
                    if body.trim().is_empty() {
                        out.push_str("  -\n");
                    }
                    for line in body.lines() {
                        out.push_str(&format!("  {line}\n"));
                    }
                }
                Region::Table {
                    title,
                    headers,
                    rows,
                    footer,
                    ..
                } => {
                    push_heading(&mut out, title);
                    render_table(&mut out, headers, rows, footer.as_ref());
                }
            }
        }
        out
    }
}

/// `ASTAP_Report_<internal code or id>_<service date>.pdf`, with anything
/// outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn file_name(report: &ReportDraft) -> String {
    let info = &report.general_info;
    let reference = if !info.internal_code.trim().is_empty() {
        info.internal_code.trim()
    } else {
        report.id.as_deref().unwrap_or("draft")
    };

    let mut stem = format!("ASTAP_Report_{reference}");
    if !info.service_date.trim().is_empty() {
        stem.push('_');
        stem.push_str(info.service_date.trim());
    }

    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.pdf")
}

fn pairs(items: &[(&str, &String)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(label, value)| (label.to_string(), value.to_string()))
        .collect()
}

fn contact_fields(side: &str, person: &ContactPerson) -> Vec<(String, String)> {
    vec![
        (format!("{side} name"), person.name.clone()),
        (format!("{side} position"), person.position.clone()),
        (format!("{side} phone"), person.phone.clone()),
        (format!("{side} email"), person.email.clone()),
    ]
}

fn test_table(name: &'static str, title: &'static str, rows: &[TestRow]) -> Region {
    Region::Table {
        name,
        title,
        headers: ["Parameter", "Expected", "Actual", "Status", "Observations"]
            .into_iter()
            .map(String::from)
            .collect(),
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    row.parameter.clone(),
                    row.expected_value.clone(),
                    row.actual_value.clone(),
                    row.status.clone(),
                    row.observations.clone(),
                ]
            })
            .collect(),
        footer: None,
    }
}

fn with_image_note(text: &str, images: usize) -> String {
    match images {
        0 => text.to_string(),
        1 => format!("{text}\n[1 image attached]"),
        n => format!("{text}\n[{n} images attached]"),
    }
}

fn signature_state(payload: Option<&str>) -> String {
    match payload {
        Some(data) if !data.trim().is_empty() => "signed".to_string(),
        _ => "pending".to_string(),
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        format!("{quantity}")
    }
}

fn push_heading(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.len()));
    out.push('\n');
}

fn render_table(out: &mut String, headers: &[String], rows: &[Vec<String>], footer: Option<&Vec<String>>) {
    if rows.is_empty() {
        out.push_str("  (none)\n");
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows.iter().chain(footer) {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<w$}", w = *width))
            .collect();
        format!("  {}\n", padded.join(" | ").trim_end())
    };

    out.push_str(&line(headers));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&format!("  {}\n", rule.join("-+-")));
    for row in rows {
        out.push_str(&line(row.as_slice()));
    }
    if let Some(footer) = footer {
        out.push_str(&line(footer.as_slice()));
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub mod commands;

pub use commands::execute;

#[derive(Debug, Parser)]
#[command(name = "astap-reports", version, about = "Manage ASTAP service report drafts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List stored reports in stored order
    List,
    /// Print a stored report as JSON
    Show { id: String },
    /// Start a report from the technician profile and save it
    New {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        service_date: Option<String>,
        /// Save as completed instead of draft
        #[arg(long)]
        completed: bool,
    },
    /// Apply a JSON section patch to a stored report and save it
    Save {
        id: String,
        /// Patch file; `-` reads standard input
        #[arg(long)]
        patch: PathBuf,
        #[arg(long)]
        completed: bool,
    },
    /// Delete a stored report
    Delete { id: String },
    /// Delete every stored report
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Plain-text preview of the generated document
    Preview { id: String },
    /// Validate a report and write it out for rendering
    Export {
        id: String,
        #[arg(long, value_enum, default_value_t = ExportFormat::Document)]
        format: ExportFormat,
        /// Output file; defaults to standard output
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a mailto: link for sending a report
    Mailto {
        id: String,
        /// Recipient; defaults to the profile's default recipient
        #[arg(long)]
        to: Option<String>,
    },
    /// Technician profile used to prefill new reports
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    Show,
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// The stored report as JSON
    Json,
    /// The named document regions consumed by the PDF renderer, as JSON
    Document,
}

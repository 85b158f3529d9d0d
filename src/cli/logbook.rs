//! Logbook CLI commands

use clap::Subcommand;

use super::{parse_date, Session};
use crate::display::format_logbook_list;
use crate::error::{AuditError, AuditResult};
use crate::models::LogbookId;
use crate::services::{LogbookChanges, LogbookService};

/// Logbook subcommands
#[derive(Subcommand)]
pub enum LogbookCommands {
    /// Write a new entry
    Create {
        /// Intern email or ID (defaults to the acting user)
        #[arg(short, long)]
        user: Option<String>,
        /// Entry date (YYYY-MM-DD)
        date: String,
        /// What was done
        activity: String,
        /// Hours spent
        hours: f64,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit an entry
    Update {
        /// Entry ID
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        activity: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Submit an entry for review
    Submit {
        /// Entry ID
        id: String,
    },
    /// Approve a submitted entry as the acting mentor
    Approve {
        /// Entry ID
        id: String,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Reject a submitted entry as the acting mentor
    Reject {
        /// Entry ID
        id: String,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List entries of an intern
    List {
        /// Intern email or ID (defaults to the acting user)
        #[arg(short, long)]
        user: Option<String>,
    },
}

/// Handle a logbook command
pub fn handle_logbook_command(session: &Session<'_>, cmd: LogbookCommands) -> AuditResult<()> {
    let service = LogbookService::new(session.storage, session.auditor);

    match cmd {
        LogbookCommands::Create {
            user,
            date,
            activity,
            hours,
            description,
        } => {
            let intern = match user {
                Some(user) => session.find_user(&user)?,
                None => session.acting_user()?,
            };
            let ctx = session.context("POST", "/intern/logbooks");
            let entry = service.create(intern, parse_date(&date)?, &activity, hours, description, &ctx)?;
            println!("Created logbook entry: {}", entry);
            println!("  ID: {}", entry.id.as_uuid());
        }

        LogbookCommands::Update {
            id,
            date,
            activity,
            hours,
            description,
        } => {
            let id = parse_id(&id)?;
            let changes = LogbookChanges {
                date: date.as_deref().map(parse_date).transpose()?,
                activity,
                description,
                duration_hours: hours,
            };
            let ctx = session.context("PUT", format!("/intern/logbooks/{}", id.as_uuid()));
            let entry = service.update(id, changes, &ctx)?;
            println!("Updated logbook entry: {}", entry);
        }

        LogbookCommands::Submit { id } => {
            let id = parse_id(&id)?;
            let ctx = session.context("POST", format!("/intern/logbooks/{}/submit", id.as_uuid()));
            let entry = service.submit(id, &ctx)?;
            println!("Submitted logbook entry: {}", entry);
        }

        LogbookCommands::Approve { id, notes } => {
            let id = parse_id(&id)?;
            let mentor = session.acting_user()?;
            let ctx = session.context("POST", format!("/mentor/logbooks/{}/approve", id.as_uuid()));
            let entry = service.approve(id, mentor, notes, &ctx)?;
            println!("Approved logbook entry: {}", entry);
        }

        LogbookCommands::Reject { id, notes } => {
            let id = parse_id(&id)?;
            let mentor = session.acting_user()?;
            let ctx = session.context("POST", format!("/mentor/logbooks/{}/reject", id.as_uuid()));
            let entry = service.reject(id, mentor, notes, &ctx)?;
            println!("Rejected logbook entry: {}", entry);
        }

        LogbookCommands::List { user } => {
            let intern = match user {
                Some(user) => session.find_user(&user)?,
                None => session.acting_user()?,
            };
            println!("{}", format_logbook_list(&service.list_for(intern)?));
        }
    }

    Ok(())
}

fn parse_id(value: &str) -> AuditResult<LogbookId> {
    value
        .parse()
        .map_err(|_| AuditError::logbook_not_found(value))
}

//! Job posting CLI commands

use clap::Subcommand;

use super::{parse_date, Session};
use crate::display::format_job_list;
use crate::error::{AuditError, AuditResult};
use crate::models::{JobPosting, JobStatus, JobType};
use crate::services::{JobChanges, JobInput, JobService};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Publish a new posting
    Create {
        /// Posting title
        title: String,
        /// on-site, remote or hybrid
        #[arg(short = 't', long = "type", default_value = "on-site")]
        job_type: String,
        /// Work location
        #[arg(short, long)]
        location: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Application deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        /// Requirement line (repeatable)
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,
    },
    /// Edit a posting
    Update {
        /// Posting slug or ID
        job: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short = 't', long = "type")]
        job_type: Option<String>,
        /// open or closed
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New deadline (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Soft-delete a posting
    Delete {
        /// Posting slug or ID
        job: String,
    },
    /// Restore a soft-deleted posting
    Restore {
        /// Posting slug or ID
        job: String,
    },
    /// List postings
    List {
        /// Include deleted postings
        #[arg(short, long)]
        all: bool,
    },
}

/// Handle a job command
pub fn handle_job_command(session: &Session<'_>, cmd: JobCommands) -> AuditResult<()> {
    let service = JobService::new(session.storage, session.auditor);

    match cmd {
        JobCommands::Create {
            title,
            job_type,
            location,
            description,
            deadline,
            requirements,
        } => {
            let mut input = JobInput::new(title, parse_job_type(&job_type)?, location);
            input.description = description.unwrap_or_default();
            input.requirements = requirements;
            input.deadline = deadline.as_deref().map(parse_date).transpose()?;

            let ctx = session.context("POST", "/admin/jobs");
            let job = service.create(input, &ctx)?;
            println!("Created job: {} ({})", job.title, job.slug);
            println!("  ID: {}", job.id.as_uuid());
        }

        JobCommands::Update {
            job,
            title,
            job_type,
            status,
            location,
            description,
            deadline,
            clear_deadline,
        } => {
            let existing = find_job(&service, &job)?;
            let changes = JobChanges {
                title,
                job_type: job_type.as_deref().map(parse_job_type).transpose()?,
                status: status.as_deref().map(parse_job_status).transpose()?,
                location,
                description,
                requirements: None,
                deadline: if clear_deadline {
                    Some(None)
                } else {
                    deadline.as_deref().map(parse_date).transpose()?.map(Some)
                },
            };

            let ctx = session.context("PUT", format!("/admin/jobs/{}", existing.slug));
            let updated = service.update(existing.id, changes, &ctx)?;
            println!("Updated job: {}", updated);
        }

        JobCommands::Delete { job } => {
            let existing = find_job(&service, &job)?;
            let ctx = session.context("DELETE", format!("/admin/jobs/{}", existing.slug));
            let deleted = service.delete(existing.id, &ctx)?;
            println!("Deleted job: {}", deleted.title);
        }

        JobCommands::Restore { job } => {
            let existing = find_job(&service, &job)?;
            let ctx = session.context("PATCH", format!("/admin/jobs/{}/restore", existing.slug));
            let restored = service.restore(existing.id, &ctx)?;
            println!("Restored job: {}", restored.title);
        }

        JobCommands::List { all } => {
            println!("{}", format_job_list(&service.list(all)?));
        }
    }

    Ok(())
}

fn find_job(service: &JobService<'_>, identifier: &str) -> AuditResult<JobPosting> {
    service
        .find(identifier)?
        .ok_or_else(|| AuditError::job_not_found(identifier))
}

fn parse_job_type(value: &str) -> AuditResult<JobType> {
    JobType::parse(value).ok_or_else(|| {
        AuditError::Validation(format!(
            "Invalid job type '{}' (expected on-site, remote or hybrid)",
            value
        ))
    })
}

fn parse_job_status(value: &str) -> AuditResult<JobStatus> {
    JobStatus::parse(value)
        .ok_or_else(|| AuditError::Validation(format!("Invalid job status '{}'", value)))
}

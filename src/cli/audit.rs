//! Audit trail CLI commands
//!
//! Listing, detail, catalogue, activity feed, per-subject history and export.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use clap::Subcommand;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use super::Session;
use crate::audit::{Auditable, AuditQuery};
use crate::display::{format_action_list, format_activity_feed, format_audit_details, format_audit_page};
use crate::error::{AuditError, AuditResult};
use crate::export::{export_trail, ExportFormat};
use crate::models::{AuditRecordId, JobPosting, Logbook, LogbookId, User};
use crate::services::{JobService, UserService};

/// Filters shared by `list` and `export`
#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Action code (created, updated, login_failed, ...)
    #[arg(long)]
    pub action: Option<String>,
    /// Actor email or ID
    #[arg(long)]
    pub actor: Option<String>,
    /// Substring of the subject type (e.g. Job)
    #[arg(long)]
    pub subject_type: Option<String>,
    /// Exact IP address
    #[arg(long)]
    pub ip: Option<String>,
    /// Earliest creation time (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub from: Option<String>,
    /// Latest creation time (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub to: Option<String>,
    /// Free text matched against IP, request path and actor name/email
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// List records, newest first
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one record in full
    Show {
        /// Record ID
        id: String,
    },
    /// List every known action code
    Actions,
    /// Show the most recent activity
    Recent {
        /// Number of entries (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show actors and subject types present in the trail
    Filters,
    /// Trail of a single entity
    History {
        /// Subject kind: job, user, logbook, or a raw subject type tag
        subject_type: String,
        /// Entity slug, email or ID
        id: String,
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Export matching records
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output format: json, csv or yaml
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle an audit command
pub fn handle_audit_command(session: &Session<'_>, cmd: AuditCommands) -> AuditResult<()> {
    let queries = session.queries();

    match cmd {
        AuditCommands::List {
            filters,
            page,
            json,
        } => {
            let query = build_query(session, filters)?.page(page);
            let result = queries.search(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", format_audit_page(&result));
            }
        }

        AuditCommands::Show { id } => {
            let id: AuditRecordId = id
                .parse()
                .map_err(|_| AuditError::QueryValidation(format!("Invalid record ID '{}'", id)))?;
            println!("{}", format_audit_details(&queries.get(id)?));
        }

        AuditCommands::Actions => {
            println!("{}", format_action_list(&queries.available_actions()));
        }

        AuditCommands::Recent { limit } => {
            let limit = limit.unwrap_or(session.settings.recent_activity_limit);
            println!("{}", format_activity_feed(&queries.recent_activity(limit)?));
        }

        AuditCommands::Filters => {
            let options = queries.filter_options()?;
            println!("Actors:");
            if options.actors.is_empty() {
                println!("  (none)");
            }
            for actor in &options.actors {
                println!("  {} <{}>", actor.name, actor.contact);
            }
            println!("Subject types:");
            if options.subject_types.is_empty() {
                println!("  (none)");
            }
            for option in &options.subject_types {
                println!("  {:<24} {}", option.label, option.value);
            }
        }

        AuditCommands::History {
            subject_type,
            id,
            page,
        } => {
            let (tag, subject_id) = resolve_subject(session, &subject_type, &id)?;
            let result = queries.history_for(&tag, &subject_id, page)?;
            println!("{}", format_audit_page(&result));
        }

        AuditCommands::Export {
            filters,
            format,
            output,
        } => {
            let format = ExportFormat::parse(&format).ok_or_else(|| {
                AuditError::Validation(format!(
                    "Unknown export format '{}' (expected json, csv or yaml)",
                    format
                ))
            })?;
            let query = build_query(session, filters)?;
            let ctx = session.context("GET", format!("/audit/export.{}", format.extension()));

            let count = match &output {
                Some(path) => {
                    let file = File::create(path).map_err(|e| {
                        AuditError::Export(format!("Cannot create {}: {}", path.display(), e))
                    })?;
                    let mut writer = BufWriter::new(file);
                    let count = export_trail(&queries, &query, format, &mut writer, session.auditor, &ctx)?;
                    writer.flush().map_err(|e| AuditError::Export(e.to_string()))?;
                    count
                }
                None => {
                    let stdout = io::stdout();
                    let mut writer = stdout.lock();
                    export_trail(&queries, &query, format, &mut writer, session.auditor, &ctx)?
                }
            };

            if let Some(path) = output {
                eprintln!("Exported {} records to {}", count, path.display());
            }
        }
    }

    Ok(())
}

fn build_query(session: &Session<'_>, filters: FilterArgs) -> AuditResult<AuditQuery> {
    let mut query = AuditQuery::new();

    if let Some(action) = filters.action {
        query = query.action(action);
    }
    if let Some(actor) = filters.actor {
        let id = session
            .find_user(&actor)
            .map_err(|_| AuditError::QueryValidation(format!("Unknown actor '{}'", actor)))?;
        query = query.actor(id);
    }
    if let Some(fragment) = filters.subject_type {
        query = query.subject_type(fragment);
    }
    if let Some(address) = filters.ip {
        query = query.network_address(address);
    }
    if let Some(from) = filters.from {
        query = query.from(parse_time(&from, false)?);
    }
    if let Some(to) = filters.to {
        query = query.to(parse_time(&to, true)?);
    }
    if let Some(term) = filters.search {
        query = query.search(term);
    }

    Ok(query)
}

/// Parse a UTC timestamp; a bare date is its first instant, or its last with `end_of_day`
fn parse_time(value: &str, end_of_day: bool) -> AuditResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        return Ok(if end_of_day {
            start + Duration::days(1) - Duration::nanoseconds(1)
        } else {
            start
        });
    }

    Err(AuditError::QueryValidation(format!(
        "Invalid time '{}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
        value
    )))
}

/// Map a subject kind and identifier to the stored (type tag, subject id)
fn resolve_subject(session: &Session<'_>, kind: &str, identifier: &str) -> AuditResult<(String, String)> {
    match kind.to_lowercase().as_str() {
        "job" | "jobs" => {
            let job = JobService::new(session.storage, session.auditor)
                .find(identifier)?
                .ok_or_else(|| AuditError::job_not_found(identifier))?;
            Ok((JobPosting::TYPE_TAG.to_string(), job.id.as_uuid().to_string()))
        }
        "user" | "users" => {
            let user = UserService::new(session.storage, session.auditor)
                .find(identifier)?
                .ok_or_else(|| AuditError::user_not_found(identifier))?;
            Ok((User::TYPE_TAG.to_string(), user.id.as_uuid().to_string()))
        }
        "logbook" | "logbooks" => {
            let id: LogbookId = identifier
                .parse()
                .map_err(|_| AuditError::logbook_not_found(identifier))?;
            Ok((Logbook::TYPE_TAG.to_string(), id.as_uuid().to_string()))
        }
        _ => Ok((kind.to_string(), identifier.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_time_formats() {
        let from = parse_time("2026-05-04", false).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap());

        let exact = parse_time("2026-05-04 10:30:00", true).unwrap();
        assert_eq!(exact.minute(), 30);
        assert_eq!(exact.second(), 0);

        let rfc = parse_time("2026-05-04T10:00:00+07:00", false).unwrap();
        assert_eq!(rfc.hour(), 3);
    }

    #[test]
    fn test_bare_end_date_covers_the_last_second() {
        let to = parse_time("2026-05-04", true).unwrap();
        let last_second = Utc.with_ymd_and_hms(2026, 5, 4, 23, 59, 59).unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap();

        assert!(last_second + Duration::milliseconds(999) <= to);
        assert!(to < next_day);
        assert_eq!(to, next_day - Duration::nanoseconds(1));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        let err = parse_time("yesterday", false).unwrap_err();
        assert!(err.is_query_validation());
    }
}

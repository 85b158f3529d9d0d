//! Listings of portal entities

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{JobPosting, Logbook, User};

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    job_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Format job postings as a table
pub fn format_job_list(jobs: &[JobPosting]) -> String {
    if jobs.is_empty() {
        return "No job postings found.".to_string();
    }

    let rows = jobs.iter().map(|job| JobRow {
        id: job.id.as_uuid().to_string(),
        slug: job.slug.clone(),
        title: job.title.clone(),
        job_type: job.job_type.to_string(),
        location: job.location.clone(),
        status: if job.is_deleted() {
            "Deleted".to_string()
        } else {
            job.status.to_string()
        },
    });
    Table::new(rows).with(Style::psql()).to_string()
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Active")]
    active: String,
}

/// Format users as a table. Credentials are never shown.
pub fn format_user_list(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }

    let rows = users.iter().map(|user| UserRow {
        id: user.id.as_uuid().to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
        active: if user.is_active() { "yes" } else { "no" }.to_string(),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

#[derive(Tabled)]
struct LogbookRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Activity")]
    activity: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Format logbook entries as a table
pub fn format_logbook_list(entries: &[Logbook]) -> String {
    if entries.is_empty() {
        return "No logbook entries found.".to_string();
    }

    let rows = entries.iter().map(|entry| LogbookRow {
        id: entry.id.as_uuid().to_string(),
        date: entry.date.to_string(),
        activity: entry.activity.clone(),
        hours: format!("{:.1}", entry.duration_hours),
        status: entry.status.to_string(),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobType, UserRole};

    #[test]
    fn test_job_list() {
        let mut closed = JobPosting::new("QA Intern", JobType::OnSite, "Bandung");
        closed.soft_delete();
        let jobs = vec![JobPosting::new("Backend Intern", JobType::Remote, "Jakarta"), closed];

        let output = format_job_list(&jobs);
        assert!(output.contains("backend-intern"));
        assert!(output.contains("Deleted"));
    }

    #[test]
    fn test_user_list_hides_password() {
        let mut user = User::new("Sari", "sari@portal.id", UserRole::Intern);
        user.password = "$argon2id$v=19$secret".into();

        let output = format_user_list(&[user]);
        assert!(output.contains("sari@portal.id"));
        assert!(!output.contains("argon2"));
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(format_job_list(&[]), "No job postings found.");
        assert_eq!(format_logbook_list(&[]), "No logbook entries found.");
    }
}

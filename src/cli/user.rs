//! User account CLI commands

use clap::Subcommand;

use super::Session;
use crate::display::format_user_list;
use crate::error::{AuditError, AuditResult};
use crate::models::{User, UserRole, UserStatus};
use crate::services::{UserChanges, UserInput, UserService};

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account
    Create {
        /// Full name
        name: String,
        /// Email address
        email: String,
        /// admin, mentor or intern
        #[arg(short, long, default_value = "intern")]
        role: String,
        /// Initial password
        #[arg(short, long, env = "SINTESIS_AUDIT_PASSWORD")]
        password: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Edit an account
    Update {
        /// Email or ID
        user: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(short, long)]
        role: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// New password
        #[arg(short, long)]
        password: Option<String>,
        /// Deactivate the account without deleting it
        #[arg(long, conflicts_with = "activate")]
        deactivate: bool,
        #[arg(long)]
        activate: bool,
    },
    /// Soft-delete an account
    Delete {
        /// Email or ID
        user: String,
    },
    /// Restore a soft-deleted account
    Restore {
        /// Email or ID
        user: String,
    },
    /// List accounts
    List,
}

/// Handle a user command
pub fn handle_user_command(session: &Session<'_>, cmd: UserCommands) -> AuditResult<()> {
    let service = UserService::new(session.storage, session.auditor);

    match cmd {
        UserCommands::Create {
            name,
            email,
            role,
            password,
            phone,
        } => {
            let mut input = UserInput::new(name, email, parse_role(&role)?);
            input.password = password;
            input.phone = phone;

            let ctx = session.context("POST", "/admin/users");
            let user = service.create(input, &ctx)?;
            println!("Created user: {}", user);
            println!("  ID: {}", user.id.as_uuid());
        }

        UserCommands::Update {
            user,
            name,
            email,
            role,
            phone,
            password,
            deactivate,
            activate,
        } => {
            let existing = find_user(&service, &user)?;
            let status = if deactivate {
                Some(UserStatus::Inactive)
            } else if activate {
                Some(UserStatus::Active)
            } else {
                None
            };
            let changes = UserChanges {
                name,
                email,
                role: role.as_deref().map(parse_role).transpose()?,
                status,
                phone,
                national_id: None,
                password,
            };

            let ctx = session.context("PUT", format!("/admin/users/{}", existing.id.as_uuid()));
            let updated = service.update(existing.id, changes, &ctx)?;
            println!("Updated user: {}", updated);
        }

        UserCommands::Delete { user } => {
            let existing = find_user(&service, &user)?;
            let ctx = session.context("DELETE", format!("/admin/users/{}", existing.id.as_uuid()));
            let deleted = service.delete(existing.id, &ctx)?;
            println!("Deleted user: {}", deleted);
        }

        UserCommands::Restore { user } => {
            let existing = find_user(&service, &user)?;
            let ctx = session.context(
                "PATCH",
                format!("/admin/users/{}/restore", existing.id.as_uuid()),
            );
            let restored = service.restore(existing.id, &ctx)?;
            println!("Restored user: {}", restored);
        }

        UserCommands::List => {
            println!("{}", format_user_list(&service.list()?));
        }
    }

    Ok(())
}

fn find_user(service: &UserService<'_>, identifier: &str) -> AuditResult<User> {
    service
        .find(identifier)?
        .ok_or_else(|| AuditError::user_not_found(identifier))
}

fn parse_role(value: &str) -> AuditResult<UserRole> {
    UserRole::parse(value).ok_or_else(|| {
        AuditError::Validation(format!(
            "Invalid role '{}' (expected admin, mentor or intern)",
            value
        ))
    })
}

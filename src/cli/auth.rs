//! Authentication CLI commands
//!
//! The CLI keeps no session; these commands exist to drive the security
//! events of the audit trail.

use clap::Subcommand;

use super::Session;
use crate::error::AuditResult;
use crate::services::{AuthService, LoginOutcome};

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Check a password sign-in
    Login {
        email: String,
        #[arg(short, long, env = "SINTESIS_AUDIT_PASSWORD")]
        password: String,
    },
    /// Sign out the acting user
    Logout,
    /// Register a new intern account
    Register {
        name: String,
        email: String,
        #[arg(short, long, env = "SINTESIS_AUDIT_PASSWORD")]
        password: String,
    },
    /// Set a new password for an account
    ResetPassword {
        email: String,
        #[arg(short, long, env = "SINTESIS_AUDIT_PASSWORD")]
        password: String,
    },
}

/// Handle an auth command
pub fn handle_auth_command(session: &Session<'_>, cmd: AuthCommands) -> AuditResult<()> {
    let service = AuthService::new(session.storage, session.auditor);

    match cmd {
        AuthCommands::Login { email, password } => {
            let ctx = session.context("POST", "/login");
            match service.login(&email, &password, &ctx)? {
                LoginOutcome::Authenticated(user) => {
                    println!("Signed in as {} ({})", user.name, user.role)
                }
                LoginOutcome::Rejected(reason) => println!("Login failed: {}", reason),
            }
        }

        AuthCommands::Logout => {
            service.logout(&session.context("POST", "/logout"))?;
            println!("Signed out.");
        }

        AuthCommands::Register {
            name,
            email,
            password,
        } => {
            let ctx = session.context("POST", "/register");
            let user = service.register(&name, &email, &password, &ctx)?;
            println!("Registered: {}", user);
        }

        AuthCommands::ResetPassword { email, password } => {
            let ctx = session.context("POST", "/reset-password");
            let user = service.reset_password(&email, &password, &ctx)?;
            println!("Password reset for {}", user.email);
        }
    }

    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sintesis_audit::audit::{ActionCatalog, Auditor, JsonlAuditStore, Principal};
use sintesis_audit::cli::{
    handle_audit_command, handle_auth_command, handle_job_command, handle_logbook_command,
    handle_user_command, AuditCommands, AuthCommands, JobCommands, LogbookCommands, Session,
    UserCommands,
};
use sintesis_audit::config::{paths::AuditPaths, settings::Settings};
use sintesis_audit::models::default_registry;
use sintesis_audit::services::UserService;
use sintesis_audit::storage::Storage;

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "SINTESIS_AUDIT_LOG";

#[derive(Parser)]
#[command(
    name = "sintesis-audit",
    version,
    about = "Audit trail for the SINTESIS internship portal",
    long_about = "Records every change to job postings, users and logbooks, along with \
                  sign-in events, as an append-only audit trail that can be filtered, \
                  paged and exported."
)]
struct Cli {
    /// Act as this user (email or ID)
    #[arg(long = "as", global = true, env = "SINTESIS_AUDIT_USER", conflicts_with = "system")]
    acting_as: Option<String>,

    /// Act as the system (scheduled or maintenance work)
    #[arg(long, global = true)]
    system: bool,

    /// Client IP address recorded with each event
    #[arg(long, global = true)]
    ip: Option<String>,

    /// Client user agent recorded with each event
    #[arg(long, global = true)]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Query and export the audit trail
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Job posting management
    #[command(subcommand)]
    Job(JobCommands),

    /// User account management
    #[command(subcommand)]
    User(UserCommands),

    /// Intern logbook entries
    #[command(subcommand)]
    Logbook(LogbookCommands),

    /// Sign-in, registration and password reset
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    settings.validate()?;

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let store = JsonlAuditStore::open(paths.audit_log())
        .with_context(|| format!("opening audit log {}", paths.audit_log().display()))?;
    let auditor = Auditor::from_settings(Arc::new(store), &settings).with_registry(default_registry());
    let catalog = ActionCatalog::new(settings.custom_actions.clone());

    let principal = if cli.system {
        Some(Principal::System)
    } else if let Some(identity) = &cli.acting_as {
        match UserService::new(&storage, &auditor).find(identity)? {
            Some(user) => Some(Principal::User(user.id)),
            None => bail!("Unknown user '{}' passed to --as", identity),
        }
    } else {
        None
    };

    let session = Session::new(&storage, &auditor, &settings, &catalog)
        .with_principal(principal)
        .with_network_address(cli.ip)
        .with_user_agent(cli.user_agent);

    match cli.command {
        Some(Commands::Audit(cmd)) => handle_audit_command(&session, cmd)?,
        Some(Commands::Job(cmd)) => handle_job_command(&session, cmd)?,
        Some(Commands::User(cmd)) => handle_user_command(&session, cmd)?,
        Some(Commands::Logbook(cmd)) => handle_logbook_command(&session, cmd)?,
        Some(Commands::Auth(cmd)) => handle_auth_command(&session, cmd)?,
        Some(Commands::Config) => {
            println!("sintesis-audit configuration");
            println!("============================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!();
            println!("Settings:");
            println!("  Sensitive fields:    {}", settings.sensitive_fields.join(", "));
            println!("  Noise fields:        {}", settings.noise_fields.join(", "));
            println!("  Page size:           {}", settings.page_size);
            println!("  Record system actor: {}", settings.record_system_actor);
            if !settings.custom_actions.is_empty() {
                println!("  Custom actions:      {}", settings.custom_actions.len());
            }
        }
        None => {
            println!("sintesis-audit - audit trail for the SINTESIS internship portal");
            println!();
            println!("Run 'sintesis-audit --help' for usage information.");
        }
    }

    let health = auditor.health();
    if health.failures() > 0 {
        tracing::warn!(
            capture = health.capture_failures,
            persist = health.persist_failures,
            "some audit records could not be written"
        );
    }

    Ok(())
}

//! Super Admin CLI — inspect workspaces, users, the audit trail and platform
//! configuration, and suspend, reactivate or impersonate from the terminal.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console_admin::audit_view::AuditView;
use console_admin::config_view::{ConfigView, UNAVAILABLE_MESSAGE};
use console_admin::dashboard::DashboardView;
use console_admin::user_view::UsersView;
use console_admin::workspace_view::WorkspacesView;
use console_admin::{
    ActionOutcome, AdminCommand, AuditOutcome, FilterCounts, SessionHandler, StatusFilter,
    SuperAdminPanel, View, ViewModel,
};
use console_core::config::{AppConfig, StoreBackend, StoreConfig};
use console_core::types::{User, Workspace};
use console_store::{DocumentStore, Fixture, MemoryStore, RedisStore};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "super-admin")]
#[command(about = "Platform super-administrator console")]
#[command(version)]
struct Cli {
    /// Store backend: memory or redis (overrides config)
    #[arg(long, global = true, env = "SUPER_ADMIN__STORE__BACKEND")]
    backend: Option<String>,

    /// Redis connection URL (overrides config)
    #[arg(long, global = true, env = "SUPER_ADMIN__STORE__REDIS_URL")]
    redis_url: Option<String>,

    /// JSON fixture loaded into the memory backend at startup
    #[arg(long, global = true, env = "SUPER_ADMIN__STORE__SEED_PATH")]
    seed: Option<String>,

    /// Print views as JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Platform overview: totals and most recent workspaces and users
    Dashboard,

    /// List workspaces
    Workspaces {
        /// all, active or suspended
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,
    },

    /// List users
    Users {
        /// all, active or suspended
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,
    },

    /// Show the audit trail, newest first
    Audit,

    /// Show feature flags and default permissions
    Config,

    /// Suspend a workspace
    SuspendWorkspace { id: String },

    /// Reactivate a suspended workspace
    ReactivateWorkspace { id: String },

    /// Suspend a user
    SuspendUser { id: String },

    /// Reactivate a suspended user
    ReactivateUser { id: String },

    /// Hand the session off to a workspace's owner
    Impersonate {
        /// Workspace whose owner is impersonated
        workspace_id: String,
    },

    /// Load a JSON fixture into the configured store
    Seed { file: String },
}

/// Terminal stand-in for the session layer: prints the identity the session
/// is handed to.
struct CliSession {
    json: bool,
}

impl SessionHandler for CliSession {
    fn on_logout(&self) {
        info!("Super admin session ended");
    }

    fn on_impersonate_user(&self, user: &User, workspace: &Workspace) {
        info!(
            user_id = %user.id,
            workspace_id = %workspace.id,
            "Session handed off to workspace owner"
        );

        if self.json {
            let handoff = serde_json::json!({
                "impersonating": user,
                "workspace": { "id": workspace.id, "name": workspace.name },
            });
            match serde_json::to_string_pretty(&handoff) {
                Ok(s) => println!("{s}"),
                Err(e) => warn!(error = %e, "Failed to encode impersonation"),
            }
            return;
        }

        println!("=== Impersonation ===");
        println!();
        println!("  Acting as:   {} <{}>", user.name, user.email);
        println!("  User ID:     {}", user.id);
        println!("  Workspace:   {} ({})", workspace.name, workspace.id);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = AppConfig::load();
    let json_logs = cli.log_json || loaded.as_ref().map(|c| c.log.json).unwrap_or(false);
    init_tracing(json_logs);

    let mut config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(backend) = &cli.backend {
        config.store.backend = parse_backend(backend)?;
    }
    if let Some(url) = &cli.redis_url {
        config.store.redis_url = url.clone();
    }
    if let Some(seed) = &cli.seed {
        config.store.seed_path = Some(seed.clone());
    }

    info!(
        backend = ?config.store.backend,
        actor = %config.console.actor_label,
        "Super admin console starting"
    );

    run(cli, config).await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "super_admin=info,console_admin=info,console_store=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_backend(s: &str) -> anyhow::Result<StoreBackend> {
    match s.to_lowercase().as_str() {
        "memory" | "mem" => Ok(StoreBackend::Memory),
        "redis" => Ok(StoreBackend::Redis),
        other => anyhow::bail!("unknown store backend '{other}', expected memory or redis"),
    }
}

async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            match &config.seed_path {
                Some(path) => {
                    let fixture = Fixture::load(path)
                        .with_context(|| format!("failed to load fixture {path}"))?;
                    fixture.apply(&store).await?;
                    info!(path = %path, "Memory store seeded");
                }
                None => warn!("Memory store starts empty, pass --seed to load a fixture"),
            }
            Ok(Arc::new(store))
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url, config.key_prefix.clone())
                .await
                .with_context(|| format!("failed to connect to {}", config.redis_url))?;
            Ok(Arc::new(store))
        }
    }
}

/// Whether data written by `seed` is lost when the process exits.
fn seed_is_ephemeral(backend: StoreBackend) -> bool {
    backend == StoreBackend::Memory
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<ExitCode> {
    let store = open_store(&config.store).await?;

    if let Commands::Seed { file } = &cli.command {
        if seed_is_ephemeral(config.store.backend) {
            warn!(
                file = %file,
                "Seeding the memory backend only lasts for this run, use --backend redis to persist"
            );
        }
        let fixture =
            Fixture::load(file).with_context(|| format!("failed to load fixture {file}"))?;
        fixture.apply(store.as_ref()).await?;
        eprintln!(
            "Seeded {} workspaces, {} users, {} audit entries from {file}",
            fixture.workspaces.len(),
            fixture.users.len(),
            fixture.audit_log.len()
        );
    }

    let session = Arc::new(CliSession { json: cli.json });
    let mut panel = SuperAdminPanel::new(store, session, &config.console);
    panel
        .mount()
        .await
        .context("failed to load console data")?;

    let (view, command) = match cli.command {
        Commands::Dashboard | Commands::Seed { .. } => (View::Dashboard, None),
        Commands::Workspaces { filter } => {
            panel.set_workspace_filter(filter);
            (View::Workspaces, None)
        }
        Commands::Users { filter } => {
            panel.set_user_filter(filter);
            (View::Users, None)
        }
        Commands::Audit => (View::Audit, None),
        Commands::Config => (View::Config, None),
        Commands::SuspendWorkspace { id } => {
            (View::Workspaces, Some(AdminCommand::SuspendWorkspace(id)))
        }
        Commands::ReactivateWorkspace { id } => {
            (View::Workspaces, Some(AdminCommand::ReactivateWorkspace(id)))
        }
        Commands::SuspendUser { id } => (View::Users, Some(AdminCommand::SuspendUser(id))),
        Commands::ReactivateUser { id } => {
            (View::Users, Some(AdminCommand::ReactivateUser(id)))
        }
        Commands::Impersonate { workspace_id } => (
            View::Workspaces,
            Some(AdminCommand::ImpersonateOwner(workspace_id)),
        ),
    };

    let mut code = ExitCode::SUCCESS;
    if let Some(command) = command {
        let outcome = panel.handle(command).await?;
        code = report_outcome(&outcome);
        // The session now belongs to the impersonated owner.
        if outcome.impersonation.is_some() {
            return Ok(code);
        }
    }

    panel.select_view(view);
    print_view(&panel.render(), cli.json)?;
    Ok(code)
}

/// Report an applied action on stderr. A missing audit entry exits with 2.
fn report_outcome(outcome: &ActionOutcome) -> ExitCode {
    match &outcome.audit {
        AuditOutcome::Recorded(entry) => {
            eprintln!("Applied {}", outcome.command);
            eprintln!("  Audit entry: {} ({})", entry.id, entry.details);
            eprintln!();
            ExitCode::SUCCESS
        }
        AuditOutcome::Missing(e) => {
            eprintln!(
                "WARNING: {} applied but its audit entry was not recorded: {e}",
                outcome.command
            );
            ExitCode::from(2)
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

fn print_view(model: &ViewModel, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(model)?);
        return Ok(());
    }

    match model {
        ViewModel::Dashboard(view) => print_dashboard(view),
        ViewModel::Workspaces(view) => print_workspaces(view),
        ViewModel::Users(view) => print_users(view),
        ViewModel::Audit(view) => print_audit(view),
        ViewModel::Config(view) => print_config(view),
    }
    Ok(())
}

fn print_counts(title: &str, counts: &FilterCounts) {
    println!("  {title}");
    println!("    Total:      {}", counts.all);
    println!("    Active:     {}", counts.active);
    println!("    Suspended:  {}", counts.suspended);
}

fn print_dashboard(view: &DashboardView) {
    println!("=== Platform Overview ===");
    println!();
    print_counts("Workspaces", &view.workspaces);
    println!();
    print_counts("Users", &view.users);
    println!();

    println!("  Recent Workspaces");
    if view.recent_workspaces.is_empty() {
        println!("    (none)");
    }
    for w in &view.recent_workspaces {
        println!(
            "    {:<24} {:<28} {:>3} members  {}",
            w.id,
            w.name,
            w.member_count,
            w.status.label()
        );
    }
    println!();

    println!("  Recent Users");
    if view.recent_users.is_empty() {
        println!("    (none)");
    }
    for u in &view.recent_users {
        println!(
            "    {:<24} {:<24} {:<32} {}",
            u.id,
            u.name,
            u.email,
            u.status.label()
        );
    }
}

fn print_workspaces(view: &WorkspacesView) {
    println!("=== Workspaces ({}) ===", view.filter);
    println!(
        "  All: {}   Active: {}   Suspended: {}",
        view.counts.all, view.counts.active, view.counts.suspended
    );
    println!();

    if view.rows.is_empty() {
        println!("  No workspaces match the filter");
        return;
    }
    println!(
        "  {:<24} {:<28} {:<24} {:>8}  {}",
        "ID", "NAME", "OWNER", "MEMBERS", "STATUS"
    );
    for row in &view.rows {
        println!(
            "  {:<24} {:<28} {:<24} {:>8}  {}",
            row.id,
            row.name,
            row.owner_name,
            row.member_count,
            row.status.label()
        );
    }
}

fn print_users(view: &UsersView) {
    println!("=== Users ({}) ===", view.filter);
    println!(
        "  All: {}   Active: {}   Suspended: {}",
        view.counts.all, view.counts.active, view.counts.suspended
    );
    println!();

    if view.rows.is_empty() {
        println!("  No users match the filter");
        return;
    }
    println!(
        "  {:<24} {:<24} {:<32} {:>10}  {}",
        "ID", "NAME", "EMAIL", "WORKSPACES", "STATUS"
    );
    for row in &view.rows {
        println!(
            "  {:<24} {:<24} {:<32} {:>10}  {}",
            row.id,
            row.name,
            row.email,
            row.workspace_count,
            row.status.label()
        );
    }
}

fn print_audit(view: &AuditView) {
    println!("=== Audit Log ===");
    println!();

    if let Some(message) = view.empty_message() {
        println!("  {message}");
        return;
    }
    println!(
        "  {:<19}  {:<22} {:<16} {:<10} {:<24} {}",
        "TIME", "ACTION", "PERFORMED BY", "TARGET", "TARGET ID", "DETAILS"
    );
    for row in &view.rows {
        println!(
            "  {:<19}  {:<22} {:<16} {:<10} {:<24} {}",
            row.display_time,
            row.action,
            row.performed_by,
            row.target_type,
            row.target_id,
            row.details
        );
    }
}

fn print_config(view: &ConfigView) {
    println!("=== Platform Configuration ===");
    println!();

    let (flags, permissions) = match view {
        ConfigView::Unavailable => {
            println!("  {UNAVAILABLE_MESSAGE}");
            return;
        }
        ConfigView::Loaded { flags, permissions } => (flags, permissions),
    };

    println!("  Feature Flags");
    if flags.is_empty() {
        println!("    (none)");
    }
    for flag in flags {
        println!("    {:<32} {}", flag.name, flag.label());
    }
    println!();

    println!("  Default Permissions");
    if permissions.is_empty() {
        println!("    (none)");
    }
    for perm in permissions {
        println!(
            "    {:<32} enabled: {:<4} roles: {}",
            perm.feature,
            perm.enabled_label(),
            perm.allowed_roles.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("memory").unwrap(), StoreBackend::Memory);
        assert_eq!(parse_backend("REDIS").unwrap(), StoreBackend::Redis);
        assert!(parse_backend("postgres").is_err());
    }

    #[test]
    fn test_seed_only_persists_with_redis() {
        assert!(seed_is_ephemeral(StoreBackend::Memory));
        assert!(!seed_is_ephemeral(StoreBackend::Redis));
    }

    #[test]
    fn test_cli_parses_filters_and_actions() {
        let cli = Cli::try_parse_from(["super-admin", "workspaces", "--filter", "suspended"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Workspaces {
                filter: StatusFilter::Suspended
            }
        ));

        let cli = Cli::try_parse_from(["super-admin", "--json", "impersonate", "w1"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Impersonate { ref workspace_id } if workspace_id == "w1"));

        assert!(Cli::try_parse_from(["super-admin", "users", "--filter", "banned"]).is_err());
    }
}

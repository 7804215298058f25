use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use accounts::{config::AccountsConfig, Accounts};
use api_ingress::{ApiIngress, ApiIngressConfig};
use modkit::{DbModule, RestfulModule};
use tasks::{config::TasksConfig, Tasks};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";
/// Far beyond any process lifetime.
const MEMORY_CONN_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` so a missing database file is created.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }

    // Rebuild DSN with absolute path and normalized slashes
    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.contains("mode=") => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// TaskBoard Server - personal task tracker API
#[derive(Parser)]
#[command(name = "taskboard-server")]
#[command(about = "TaskBoard Server - personal task tracker API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", redacted_yaml(&config)?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("TaskBoard Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

const REDACTED: &str = "***";

/// DSN with the password removed, for logs and error messages.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some(REDACTED));
            url.to_string()
        }
        _ => dsn.to_owned(),
    }
}

/// YAML dump of `config` with the signing secret and DSN password masked.
fn redacted_yaml(config: &AppConfig) -> Result<String> {
    let mut shown = config.clone();
    if let Some(db) = shown.database.as_mut() {
        db.url = redact_dsn(&db.url);
    }
    if let Some(secret) = shown
        .modules
        .get_mut(Accounts::NAME)
        .and_then(|m| m.get_mut("jwt_secret"))
    {
        if secret.as_str().is_some_and(|s| !s.is_empty()) {
            *secret = serde_json::Value::from(REDACTED);
        }
    }
    shown.to_yaml()
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let raw = format!("{}:{}", config.server.host, config.server.port);
    raw.parse()
        .with_context(|| format!("Invalid bind address '{raw}'"))
}

fn ingress_config(config: &AppConfig) -> Result<ApiIngressConfig> {
    let mut cfg: ApiIngressConfig = config.module_config(ApiIngress::NAME)?;
    if config.server.timeout_sec > 0 {
        cfg.request_timeout_secs = config.server.timeout_sec;
    }
    Ok(cfg)
}

fn connect_options(dsn: &str, db_config: &DatabaseConfig) -> ConnectOptions {
    let mut opts = ConnectOptions::new(dsn.to_owned());
    opts.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if dsn == MEMORY_DSN {
        // The database lives only as long as its single connection, so the
        // pool must never close it: each pooled connection would otherwise
        // see its own empty database, and a recycled one loses every table.
        opts.max_connections(1)
            .min_connections(1)
            .idle_timeout(MEMORY_CONN_LIFETIME)
            .max_lifetime(MEMORY_CONN_LIFETIME);
    } else if let Some(max) = db_config.max_conns {
        opts.max_connections(max);
    }
    if let Some(ms) = db_config.busy_timeout_ms {
        let timeout = Duration::from_millis(u64::from(ms));
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(timeout));
    }
    opts
}

async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let db_config = config
        .database
        .clone()
        .ok_or_else(|| anyhow!("Database configuration is required"))?;

    let dsn = if args.mock {
        MEMORY_DSN.to_string()
    } else {
        let _backend = detect_from_dsn(&db_config)?;
        db_config.url.trim().to_owned()
    };

    // Absolutize sqlite DSNs to avoid cwd issues
    let base_dir = PathBuf::from(&config.server.home_dir);
    let dsn = if dsn.starts_with("sqlite:") {
        absolutize_sqlite_dsn(&dsn, &base_dir, true)?
    } else {
        dsn
    };

    let opts = connect_options(&dsn, &db_config);
    let shown = redact_dsn(&dsn);
    tracing::info!("Connecting to database: {}", shown);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {shown}"))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let addr = bind_addr(&config)?;
    let accounts_cfg: AccountsConfig = config.module_config(Accounts::NAME)?;
    let tasks_cfg: TasksConfig = config.module_config(Tasks::NAME)?;
    let ingress_cfg = ingress_config(&config)?;

    let db = connect_db(&config, &args).await?;

    tracing::info!("Initializing modules...");
    let accounts = Arc::new(Accounts::new(db.clone(), accounts_cfg)?);
    let tasks = Arc::new(Tasks::new(db.clone(), tasks_cfg, accounts.client())?);

    let db_modules: [&dyn DbModule; 2] = [accounts.as_ref(), tasks.as_ref()];
    for module in db_modules {
        module.migrate(&db).await?;
    }

    let ingress = ApiIngress::new(ingress_cfg)
        .with_module(accounts as Arc<dyn RestfulModule>)
        .with_module(tasks as Arc<dyn RestfulModule>);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
                tracing::error!(error = %e, "signal handler failed");
            }
            cancel.cancel();
        }
    });

    ingress.serve(addr, cancel).await?;
    db.close().await.context("failed to close database")?;
    tracing::info!("TaskBoard Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    bind_addr(&config)?;
    let accounts_cfg: AccountsConfig = config.module_config(Accounts::NAME)?;
    config.module_config::<TasksConfig>(Tasks::NAME)?;
    ingress_config(&config)?;
    if !args.mock {
        if let Some(db) = &config.database {
            detect_from_dsn(db)?;
        }
    }
    if accounts_cfg.jwt_secret.is_empty() {
        println!("warning: modules.accounts.jwt_secret is empty; `run` will refuse to start");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", redacted_yaml(&config)?);
    Ok(())
}

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use taskboard_client::session::token_expiry;
use taskboard_client::{
    ApiClient, ClientError, Dashboard, Outcome, Poller, SessionStore, TaskStatus,
};

mod render;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// TaskBoard - personal task tracker
#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "TaskBoard - personal task tracker")]
#[command(version)]
struct Cli {
    /// Server base URL, used by register, login and health
    #[arg(long, env = "TASKBOARD_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Session file (defaults to ~/.taskboard/session.json)
    #[arg(long, env = "TASKBOARD_SESSION")]
    session_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout: u64,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log in and remember the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List tasks with a progress summary
    List,
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Mark a task completed
    Done {
        /// List position, id or id prefix
        task: String,
    },
    /// Mark a task pending again
    Undo {
        /// List position, id or id prefix
        task: String,
    },
    /// Change a task's title
    Rename {
        task: String,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Cycle a task's priority (low -> medium -> high -> low)
    Priority { task: String },
    /// Delete a task
    Rm { task: String },
    /// Check that the server is up
    Health,
    /// Keep the list on screen, refreshing periodically
    Watch {
        /// Refresh interval in seconds
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskboard={level},taskboard_client={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(p) = given {
        return Ok(p);
    }
    eprint!("Password: ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

struct App {
    server: String,
    api: ApiClient,
    store: SessionStore,
}

impl App {
    fn dashboard(&self) -> Result<Dashboard> {
        let session = self.store.require()?;
        Ok(Dashboard::new(self.api.clone(), session))
    }

    async fn loaded(&self) -> Result<Dashboard> {
        let dash = self.dashboard()?;
        dash.refresh().await?;
        Ok(dash)
    }

    /// Resolve a user reference against a freshly loaded board.
    async fn target(&self, reference: &str) -> Result<(Dashboard, String)> {
        let dash = self.loaded().await?;
        let id = dash
            .snapshot()
            .resolve(reference)
            .map(|t| t.id.clone())
            .ok_or_else(|| anyhow!("No task matches '{reference}'."))?;
        Ok((dash, id))
    }

    async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Register { username, password } => {
                let password = read_password(password)?;
                let message = self.api.register(&self.server, &username, &password).await?;
                println!("{message}");
            }
            Commands::Login { username, password } => {
                let password = read_password(password)?;
                let session = self.api.login(&self.server, &username, &password).await?;
                self.store.save(&session)?;
                println!("Logged in as {}.", session.username);
            }
            Commands::Logout => {
                if self.store.clear()? {
                    println!("Logged out.");
                } else {
                    println!("Not logged in.");
                }
            }
            Commands::Whoami => self.whoami()?,
            Commands::List => {
                let dash = self.loaded().await?;
                print!("{}", render::board(&dash.snapshot()));
            }
            Commands::Add { title } => {
                let dash = self.dashboard()?;
                match dash.create(&title.join(" ")).await? {
                    Outcome::Applied => println!("Task created."),
                    Outcome::Skipped => bail!("Title is required."),
                }
            }
            Commands::Done { task } => self.set_status(&task, TaskStatus::Completed).await?,
            Commands::Undo { task } => self.set_status(&task, TaskStatus::Pending).await?,
            Commands::Rename { task, title } => {
                let (dash, id) = self.target(&task).await?;
                match dash.rename(&id, &title.join(" ")).await? {
                    Outcome::Applied => println!("Task updated."),
                    Outcome::Skipped => println!("Nothing to change."),
                }
            }
            Commands::Priority { task } => {
                let (dash, id) = self.target(&task).await?;
                dash.cycle_priority(&id).await?;
                if let Some(t) = dash.snapshot().get(&id) {
                    println!("Priority is now {}.", t.priority.as_str());
                }
            }
            Commands::Rm { task } => {
                let (dash, id) = self.target(&task).await?;
                dash.delete(&id).await?;
                println!("Task deleted.");
            }
            Commands::Health => {
                let health = self.api.health(&self.server).await?;
                println!("{} ({})", health.status, health.time.to_rfc3339());
            }
            Commands::Watch { interval } => self.watch(Duration::from_secs(interval.max(1))).await?,
        }
        Ok(())
    }

    fn whoami(&self) -> Result<()> {
        let Some(session) = self.store.load()? else {
            bail!(ClientError::NotLoggedIn);
        };
        println!("{} @ {}", session.username, session.base_url);
        if let Some(exp) = token_expiry(&session.token) {
            println!("token expires {}", exp.to_rfc3339());
        }
        Ok(())
    }

    async fn set_status(&self, reference: &str, wanted: TaskStatus) -> Result<()> {
        let (dash, id) = self.target(reference).await?;
        let current = dash.snapshot().get(&id).map(|t| t.status);
        if current == Some(wanted) {
            println!("Task is already {}.", wanted.as_str());
            return Ok(());
        }
        dash.toggle(&id).await?;
        println!("Task updated.");
        Ok(())
    }

    async fn watch(&self, every: Duration) -> Result<()> {
        let dash = self.loaded().await?;
        let mut changes = dash.subscribe();
        print!("{}", render::board(&dash.snapshot()));

        let cancel = CancellationToken::new();
        let poller = Poller::new(every).spawn(dash.clone(), cancel.clone());

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("\n--- refreshed {} ---", chrono::Local::now().format("%H:%M:%S"));
                    print!("{}", render::board(&dash.snapshot()));
                }
            }
        }

        cancel.cancel();
        poller.await.ok();
        Ok(())
    }
}

fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::NotLoggedIn) => "Not logged in. Run `taskboard login <username>`.".into(),
        Some(e @ ClientError::Api { .. }) if e.is_unauthorized() => {
            format!("{e} Run `taskboard login <username>` to start a new session.")
        }
        _ => format!("{err:#}"),
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    let path = match cli.session_file {
        Some(p) => p,
        None => SessionStore::default_path()?,
    };
    let app = App {
        server: cli.server,
        api: ApiClient::with_timeout(Duration::from_secs(cli.timeout.max(1)))?,
        store: SessionStore::new(path),
    };
    app.run(cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

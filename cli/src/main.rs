use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod poll;
mod store;
mod util;

use commands::agents::AgentCommands;
use store::{AgentStore, LocalStore, StoreKind};

#[derive(Parser)]
#[command(
    name = "agentdash",
    version,
    about = "Agent dashboard CLI: manage AI agents and watch their compliance status"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "AGENTDASH_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Where agent records live
    #[arg(long, value_enum, default_value_t = StoreKind::Remote)]
    store: StoreKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Show the metric catalog
    Metrics,
    /// Authenticate and store credentials
    Login {
        #[arg(long, env = "AGENTDASH_USERNAME")]
        username: String,
        #[arg(long, env = "AGENTDASH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove stored credentials
    Logout,
    /// Agent operations
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Resolved compliance status of one agent
    Status {
        /// Agent id
        id: String,
        /// Keep polling and print a new report for every refresh
        #[arg(long)]
        watch: bool,
        /// Seconds between refreshes in --watch mode
        #[arg(long, default_value_t = poll::DEFAULT_INTERVAL.as_secs())]
        interval_secs: u64,
    },
}

fn open_store(kind: StoreKind, api_url: &str) -> AgentStore {
    match kind {
        StoreKind::Remote => AgentStore::Remote {
            api_url: api_url.to_string(),
            authorization: match util::resolve_authorization(api_url) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(error = %e, "continuing without credentials");
                    None
                }
            },
        },
        StoreKind::Local => AgentStore::Local(LocalStore::new(LocalStore::default_path())),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AGENTDASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let api_url = cli.api_url.trim_end_matches('/').to_string();

    let code = match cli.command {
        Commands::Health => commands::health::run(&api_url).await,
        Commands::Login { username, password } => {
            if username.is_empty() || password.is_empty() {
                util::exit_error(
                    "Username and password are required",
                    Some("Pass --username and --password, or set AGENTDASH_USERNAME and AGENTDASH_PASSWORD."),
                );
            }
            commands::auth::login(&api_url, &username, &password).await
        }
        Commands::Logout => match commands::auth::logout() {
            Ok(()) => 0,
            Err(e) => util::exit_error(&e.to_string(), None),
        },
        Commands::Metrics => commands::metrics::run(&open_store(cli.store, &api_url)).await,
        Commands::Agents { command } => {
            commands::agents::run(&open_store(cli.store, &api_url), command).await
        }
        Commands::Status {
            id,
            watch,
            interval_secs,
        } => {
            commands::status::run(
                &open_store(cli.store, &api_url),
                &id,
                watch,
                Duration::from_secs(interval_secs),
            )
            .await
        }
    };

    std::process::exit(code);
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use roadmapd::{config::Config, identity, rest, storage::Storage, AppContext};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "roadmapd",
    about = "roadmapd — markdown learning-roadmap service",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API server port
    #[arg(long, env = "ROADMAPD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "ROADMAPD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ROADMAPD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "ROADMAPD_BIND")]
    bind_address: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server in the foreground (default when no subcommand given).
    ///
    /// Examples:
    ///   roadmapd serve
    ///   roadmapd
    Serve,
    /// Manage owner accounts.
    ///
    /// Examples:
    ///   roadmapd owner add --name "Alice" --email alice@example.com
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Create an owner and print their access token.
    ///
    /// The token is shown exactly once — only its SHA-256 digest is stored.
    ///
    /// Examples:
    ///   roadmapd owner add --name "Alice" --email alice@example.com
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Email address (unique)
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::new(args.port, args.data_dir, args.log, args.bind_address);

    // Init once — must happen before any tracing calls.
    setup_logging(&config.log, &config.log_format);

    match args.command {
        Some(Command::Owner { action }) => match action {
            OwnerAction::Add { name, email } => run_owner_add(&config, &name, &email).await?,
        },
        None | Some(Command::Serve) => run_server(config).await?,
    }

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
fn setup_logging(log_level: &str, log_format: &str) {
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}

async fn run_server(config: Config) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting roadmapd"
    );

    let ctx = Arc::new(AppContext::new(config).await?);
    rest::start_rest_server(ctx).await
}

async fn run_owner_add(config: &Config, name: &str, email: &str) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)?;
    let storage = Storage::new_with_slow_query(
        &config.data_dir,
        config.observability.slow_query_threshold_ms,
    )
    .await?;

    let (owner, token) = identity::provision_owner(&storage, name, email).await?;
    println!("Owner created: {} <{}>", owner.name, owner.email);
    println!("  id:    {}", owner.id);
    println!("  token: {token}");
    println!();
    println!("Store this token now — it cannot be shown again.");
    Ok(())
}

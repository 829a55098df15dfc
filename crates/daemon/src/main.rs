use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_core::telemetry::{InstrumentationConfig, init_tracing};
use warden_core::{ExecutionRunner, OsExecutionRunner};
use warden_daemon::{Settings, credentials, server, startup};
use warden_http::AppState;

/// Warden - secret store token and credential bootstrap service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the token provider, then serve the token regeneration API (default)
    Serve,
    /// Resolve database credentials from the secret store
    Credentials {
        /// Write each password to DIR/<database>/password
        #[arg(long, value_name = "DIR")]
        password_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let settings = match &cli.config {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::from_env()?,
    };

    init_tracing(&InstrumentationConfig {
        service_name: "warden".to_string(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        log_level: settings.writable.log_level.clone(),
        json: cli.json_logs,
    })?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {}", path);
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(settings).await,
        Command::Credentials { password_dir } => run_credentials(settings, password_dir).await,
    }
}

async fn run_server(settings: Settings) -> Result<()> {
    let shutdown = CancellationToken::new();
    let runner: Arc<dyn ExecutionRunner> = Arc::new(OsExecutionRunner::new());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_token.cancel();
        }
    });

    startup::launch_token_provider(
        &settings.secret_store,
        runner.clone(),
        shutdown.child_token(),
    )
    .await?;

    let state = AppState::new(settings.secret_store.clone())
        .with_runner(runner)
        .with_shutdown(shutdown);
    server::serve(&settings, state).await?;
    Ok(())
}

async fn run_credentials(settings: Settings, password_dir: Option<PathBuf>) -> Result<()> {
    let credentials = credentials::fetch_credentials(&settings).await?;

    let mut names: Vec<&String> = credentials.keys().collect();
    names.sort();
    for name in names {
        println!("{}: username={}", name, credentials[name].username);
    }

    if let Some(dir) = password_dir {
        for path in credentials::write_password_files(&dir, &credentials).await? {
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

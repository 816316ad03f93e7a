use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use quill_core::auth::AuthCore;
use quill_core::database::{InMemoryDatabase, PostgresDatabase};
use quill_server::{
    create_app,
    infra::{
        app_state::AppState,
        config::{Config, DatabaseConfig},
        telemetry,
    },
};
use tracing::{info, warn};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "quill-server")]
#[command(about = "Posting service with bearer-token authentication")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Keep users and posts in process memory instead of PostgreSQL
    #[arg(long, env = "QUILL_IN_MEMORY", default_value_t = false)]
    in_memory: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing();

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate().await,
        None => run_server(cli.serve).await,
    }
}

async fn run_db_migrate() -> anyhow::Result<()> {
    let database = DatabaseConfig::from_env().context("invalid database configuration")?;
    let url = database
        .url
        .context("DATABASE_URL or DATABASE_HOSTNAME/USERNAME/NAME must be set")?;
    let pg = PostgresDatabase::connect(&url)
        .await
        .context("failed to connect to PostgreSQL")?;
    pg.migrate().await.context("failed to apply migrations")?;
    Ok(())
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let auth = AuthCore::new(&config.auth).context("failed to initialise auth core")?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = if args.in_memory {
        warn!("Using in-memory storage; all data is lost on shutdown");
        AppState::new(Arc::new(InMemoryDatabase::new()), auth, config)
    } else {
        let url = config
            .database
            .url
            .clone()
            .context("DATABASE_URL must be set (or pass --in-memory)")?;
        let pg = PostgresDatabase::connect(&url)
            .await
            .context("failed to connect to PostgreSQL")?;
        pg.migrate().await.context("failed to apply migrations")?;
        AppState::new(Arc::new(pg), auth, config)
    };

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Starting Quill server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

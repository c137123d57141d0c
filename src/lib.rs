pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod registry;
pub mod services;
pub mod state;
pub mod transcode;

use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    init_tracing(&config);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("Config file already exists.");
        }
        return Ok(());
    }

    config.validate()?;

    match command {
        Commands::Init => Ok(()),
        Commands::Serve => run_server(config).await,
        Commands::Records { kind, status } => {
            cli::cmd_list_records(&config, kind, status.as_deref()).await
        }
        Commands::AddMovie {
            title,
            year,
            tmdb_id,
            imdb_id,
            genres,
        } => cli::cmd_add_movie(&config, &title.join(" "), year, tmdb_id, imdb_id, genres).await,
        Commands::Sync { command } => cli::cmd_sync(config, command).await,
        Commands::Logs {
            page,
            page_size,
            entity_type,
            status,
        } => cli::cmd_logs(&config, page, page_size, entity_type, status.as_deref()).await,
        Commands::Enrich { tmdb_id } => cli::cmd_enrich(&config, tmdb_id).await,
    }
}

/// `RUST_LOG` wins over `general.log_level`.
fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Marquee v{} starting server...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    if !config.server.enabled {
        anyhow::bail!("server.enabled is false; nothing to serve");
    }

    let port = config.server.port;
    let state = SharedState::new(config).await?;
    let app = api::router(api::AppState::new(state, prometheus_handle));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Error listening for shutdown: {}", e),
            }
        })
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

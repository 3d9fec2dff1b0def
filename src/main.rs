use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use snippetbox::cli::Cli;
use snippetbox::logging::{init_tracing, shutdown_tracer};
use snippetbox::router::init_router;
use snippetbox::server::{load_tls_config, serve};
use snippetbox::state::AppState;
use snippetbox_config::{DatabaseConfig, ServerConfig, SessionConfig};
use snippetbox_db::{MIGRATOR, init_db_pool};
use tokio::time::Duration;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{error, info};

const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    init_tracing(Path::new(&cli.log_dir))?;

    let mut server_config = ServerConfig::from_env();
    let mut database_config = DatabaseConfig::from_env();
    let session_config = SessionConfig::from_env();
    cli.apply(&mut server_config, &mut database_config);

    let pool = init_db_pool(&database_config)
        .await
        .context("Failed to connect to database")?;
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to create session table")?;
    let deletion_task = tokio::spawn(
        session_store
            .clone()
            .continuously_delete_expired(EXPIRED_SESSION_SWEEP),
    );

    let tls = load_tls_config(&server_config.tls_cert_path, &server_config.tls_key_path)?;
    let app = init_router(
        AppState::from_pool(pool),
        session_store,
        &session_config,
        &server_config.static_dir,
    );

    let result = serve(app, &server_config, tls, shutdown_signal()).await;
    if let Err(e) = &result {
        error!(error = %e, "Server failed");
    }

    deletion_task.abort();
    info!("Server stopped");
    shutdown_tracer();
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

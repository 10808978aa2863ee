use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fundpath_core::clock::SystemClock;
use fundpath_events::{mailer_from_env, DripConfig, DripScheduler, PgDripStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundpath_api::background;
use fundpath_api::config::ServerConfig;
use fundpath_api::router::build_app_router;
use fundpath_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fundpath_api=debug,fundpath_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = ?config.environment,
        "Loaded server configuration"
    );
    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET is not set; the drip trigger will reject every request");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = fundpath_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    fundpath_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    fundpath_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Drip scheduler ---
    let drip = match mailer_from_env() {
        Ok(Some(mailer)) => {
            let scheduler = DripScheduler::new(
                Arc::new(PgDripStore::new(pool.clone())),
                mailer,
                Arc::new(SystemClock),
                DripConfig::from_env(),
            );
            Some(Arc::new(scheduler))
        }
        Ok(None) => {
            tracing::warn!("No mailer configured (MAIL_API_KEY or SMTP_HOST); drip emails disabled");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build mailer; drip emails disabled");
            None
        }
    };

    // --- Background drip loop ---
    let drip_cancel = CancellationToken::new();
    let drip_handle = match (&drip, config.drip_interval_secs) {
        (Some(scheduler), Some(secs)) if secs > 0 => Some(tokio::spawn(
            background::drip_schedule::run(
                Arc::clone(scheduler),
                Duration::from_secs(secs),
                drip_cancel.clone(),
            ),
        )),
        _ => None,
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        drip,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    drip_cancel.cancel();
    if let Some(handle) = drip_handle {
        let timeout = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(timeout, handle).await.is_err() {
            tracing::warn!("Drip schedule did not stop within the shutdown timeout");
        } else {
            tracing::info!("Drip schedule stopped");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

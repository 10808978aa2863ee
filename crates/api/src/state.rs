use std::sync::Arc;

use fundpath_events::DripScheduler;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fundpath_db::DbPool,
    /// Server configuration (JWT settings, cron secret, environment).
    pub config: Arc<ServerConfig>,
    /// Drip scheduler, present only when a mailer is configured.
    pub drip: Option<Arc<DripScheduler>>,
}

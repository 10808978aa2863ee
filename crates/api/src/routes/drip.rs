//! Route definitions for scheduler triggers.

use axum::routing::get;
use axum::Router;

use crate::handlers::drip;
use crate::state::AppState;

/// Routes mounted at `/cron`.
///
/// ```text
/// POST   /onboarding-emails    -> trigger
/// GET    /onboarding-emails    -> trigger_manual (non-production only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/onboarding-emails",
        get(drip::trigger_manual).post(drip::trigger),
    )
}

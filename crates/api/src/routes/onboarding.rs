//! Route definitions for the `/onboarding` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

/// Routes mounted at `/onboarding`.
///
/// ```text
/// GET    /progress       -> get_progress
/// POST   /progress       -> update_progress
/// GET    /emails         -> list_sent_emails
/// POST   /unsubscribe    -> unsubscribe
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/progress",
            get(onboarding::get_progress).post(onboarding::update_progress),
        )
        .route("/emails", get(onboarding::list_sent_emails))
        .route("/unsubscribe", post(onboarding::unsubscribe))
}

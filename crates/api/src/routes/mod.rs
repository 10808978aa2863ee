pub mod drip;
pub mod health;
pub mod onboarding;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /onboarding/progress                 get, merge-update (requires auth)
/// /onboarding/emails                   sent drip stages (requires auth)
/// /onboarding/unsubscribe              opt out of drip emails (requires auth)
///
/// /cron/onboarding-emails              run the drip scheduler (cron secret)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/onboarding", onboarding::router())
        .nest("/cron", drip::router())
}

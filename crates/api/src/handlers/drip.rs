//! Handlers for the cron-triggered drip run.

use axum::extract::State;
use axum::Json;
use fundpath_core::types::Timestamp;
use fundpath_events::DripRunSummary;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::cron::CronAuth;
use crate::state::AppState;

/// Body returned by the trigger endpoints.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: &'static str,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub summary: DripRunSummary,
}

/// POST /api/v1/cron/onboarding-emails
pub async fn trigger(
    _cron: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<TriggerResponse>> {
    run_drip(&state).await
}

/// GET /api/v1/cron/onboarding-emails
///
/// Manual trigger for local testing. Disabled in production.
pub async fn trigger_manual(
    State(state): State<AppState>,
    cron: Result<CronAuth, AppError>,
) -> AppResult<Json<TriggerResponse>> {
    if state.config.is_production() {
        return Err(AppError::MethodNotAllowed(
            "Manual trigger is disabled in production; use POST".into(),
        ));
    }
    cron?;
    run_drip(&state).await
}

async fn run_drip(state: &AppState) -> AppResult<Json<TriggerResponse>> {
    let scheduler = state.drip.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Email delivery is not configured".into())
    })?;

    let summary = scheduler.run().await?;

    let message = if summary.all_failed {
        "Onboarding email run finished but every send failed"
    } else {
        "Onboarding emails processed"
    };

    Ok(Json(TriggerResponse {
        message,
        timestamp: scheduler.now(),
        summary,
    }))
}

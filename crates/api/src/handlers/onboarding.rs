//! Handlers for the `/onboarding` resource (progress, sent emails, opt-out).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use fundpath_core::error::CoreError;
use fundpath_core::onboarding::ProfilePatch;
use fundpath_core::types::DbId;
use fundpath_db::models::drip_send::DripSend;
use fundpath_db::models::onboarding_profile::OnboardingProfile;
use fundpath_db::repositories::{DripSendRepo, OnboardingProfileRepo, UserRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// 404 unless the authenticated user still has an account row.
async fn ensure_user_exists(state: &AppState, user_id: DbId) -> AppResult<()> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;
    Ok(())
}

/// GET /api/v1/onboarding/progress
///
/// The caller's profile, or `null` before their first progress write.
pub async fn get_progress(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<OnboardingProfile>>>> {
    ensure_user_exists(&state, auth.user_id).await?;

    let profile = OnboardingProfileRepo::find_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: profile }))
}

/// POST /api/v1/onboarding/progress
///
/// Merge a partial update into the caller's profile and return the rescored
/// result. Nothing is written when the body is malformed or invalid.
pub async fn update_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> AppResult<Json<DataResponse<OnboardingProfile>>> {
    let Json(patch) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    patch.validate()?;

    ensure_user_exists(&state, auth.user_id).await?;

    let profile = OnboardingProfileRepo::apply_patch(&state.pool, auth.user_id, &patch).await?;

    tracing::info!(
        user_id = auth.user_id,
        completion = profile.completion_percentage,
        "Onboarding progress updated"
    );

    Ok(Json(DataResponse { data: profile }))
}

/// GET /api/v1/onboarding/emails
///
/// Drip stages already sent to the caller, in send order.
pub async fn list_sent_emails(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DripSend>>>> {
    ensure_user_exists(&state, auth.user_id).await?;

    let sends = DripSendRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: sends }))
}

/// POST /api/v1/onboarding/unsubscribe
///
/// Opt the caller out of onboarding drip emails. Repeat calls are no-ops.
pub async fn unsubscribe(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    let updated = UserRepo::set_drip_unsubscribed(&state.pool, auth.user_id, true).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }));
    }

    tracing::info!(user_id = auth.user_id, "User unsubscribed from onboarding emails");
    Ok(StatusCode::NO_CONTENT)
}

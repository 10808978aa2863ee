//! HTTP-level tests for the onboarding progress endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get, get_auth, post_auth, post_json_auth, post_raw_auth, token_for,
};
use fundpath_db::repositories::{OnboardingProfileRepo, UserRepo};
use serde_json::json;
use sqlx::PgPool;

const PROGRESS: &str = "/api/v1/onboarding/progress";

// ---------------------------------------------------------------------------
// Auth gate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn progress_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, PROGRESS).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn progress_rejects_bad_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, PROGRESS, "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// GET /progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_progress_is_null_before_first_write(pool: PgPool) {
    let user = create_user(&pool, "new@test.io").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, PROGRESS, &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_progress_for_missing_user_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app, PROGRESS, &token_for(999_999)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// POST /progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn first_post_creates_profile(pool: PgPool) {
    let user = create_user(&pool, "first@test.io").await;
    let app = common::build_test_app(pool.clone());

    let body = json!({ "businessType": "LLC", "einUploaded": true });
    let response = post_json_auth(app, PROGRESS, body, &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["businessType"], "LLC");
    assert_eq!(json["data"]["einUploaded"], true);
    assert_eq!(json["data"]["completionPercentage"], 25);

    let stored = OnboardingProfileRepo::find_by_user(&pool, user.id)
        .await
        .unwrap()
        .expect("profile should exist");
    assert_eq!(stored.completion_percentage, 25);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_merges_before_scoring(pool: PgPool) {
    let user = create_user(&pool, "merge@test.io").await;
    let token = token_for(user.id);

    let first = json!({
        "businessType": "LLC",
        "yearsInOperation": "3",
        "currentCreditScore": "680",
        "einUploaded": true,
    });
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, PROGRESS, first, &token).await;
    assert_eq!(body_json(response).await["data"]["completionPercentage"], 50);

    let second = json!({ "bankConnected": true, "creditGoal": "$50k line" });
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, PROGRESS, second, &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["completionPercentage"], 75);
    // Fields from the first write survive.
    assert_eq!(json["data"]["businessType"], "LLC");
    assert_eq!(json["data"]["currentCreditScore"], "680");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_json_is_400_and_not_written(pool: PgPool) {
    let user = create_user(&pool, "bad@test.io").await;
    let app = common::build_test_app(pool.clone());

    let response = post_raw_auth(app, PROGRESS, "{not json".into(), &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(OnboardingProfileRepo::find_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_boolean_milestone_is_400(pool: PgPool) {
    let user = create_user(&pool, "type@test.io").await;
    let app = common::build_test_app(pool);

    let body = json!({ "bankConnected": "yes" });
    let response = post_json_auth(app, PROGRESS, body, &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn oversized_field_is_400_with_details(pool: PgPool) {
    let user = create_user(&pool, "long@test.io").await;
    let app = common::build_test_app(pool.clone());

    let body = json!({ "businessType": "x".repeat(300) });
    let response = post_json_auth(app, PROGRESS, body, &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["details"]["business_type"].is_array());
    assert!(OnboardingProfileRepo::find_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_for_missing_user_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = json!({ "businessType": "LLC" });
    let response = post_json_auth(app, PROGRESS, body, &token_for(424_242)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Sent emails and unsubscribe
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sent_emails_start_empty(pool: PgPool) {
    let user = create_user(&pool, "emails@test.io").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/onboarding/emails", &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsubscribe_sets_opt_out(pool: PgPool) {
    let user = create_user(&pool, "optout@test.io").await;
    let app = common::build_test_app(pool.clone());

    let response = post_auth(app, "/api/v1/onboarding/unsubscribe", &token_for(user.id)).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(stored.drip_unsubscribed_at.is_some());
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use fundpath_api::auth::jwt::{generate_access_token, JwtConfig};
use fundpath_api::config::{AppEnv, ServerConfig};
use fundpath_api::router::build_app_router;
use fundpath_api::state::AppState;
use fundpath_core::clock::{Clock, SystemClock};
use fundpath_core::types::DbId;
use fundpath_db::models::user::{CreateUser, User};
use fundpath_db::repositories::UserRepo;
use fundpath_events::{
    DripConfig, DripScheduler, EmailError, Mailer, OutboundEmail, PgDripStore, SendReceipt,
};

pub const CRON_SECRET: &str = "test-cron-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        environment: AppEnv::Development,
        cron_secret: Some(CRON_SECRET.to_string()),
        drip_interval_secs: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

// ---------------------------------------------------------------------------
// Fake mailer
// ---------------------------------------------------------------------------

/// Records every email it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, EmailError> {
        if self.fail {
            return Err(EmailError::HttpStatus {
                status: 500,
                body: "provider down".into(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(SendReceipt {
            message_id: Some(format!("<test-{}@fundpath.test>", sent.len())),
        })
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build the full application router for `config`, with the drip scheduler
/// wired to `mailer` (or disabled when `None`).
pub fn build_app(pool: PgPool, config: ServerConfig, mailer: Option<Arc<dyn Mailer>>) -> Router {
    build_app_with_clock(pool, config, mailer, Arc::new(SystemClock))
}

pub fn build_app_with_clock(
    pool: PgPool,
    config: ServerConfig,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Arc<dyn Clock>,
) -> Router {
    let drip = mailer.map(|mailer| {
        Arc::new(DripScheduler::new(
            Arc::new(PgDripStore::new(pool.clone())),
            mailer,
            clock,
            DripConfig {
                app_base_url: "https://app.test".into(),
                ..Default::default()
            },
        ))
    });

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        drip,
    };
    build_app_router(state, &config)
}

/// Default test app with a recording mailer.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_mailer(pool).0
}

pub fn build_test_app_with_mailer(pool: PgPool) -> (Router, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let app = build_app(pool, test_config(), Some(mailer.clone() as Arc<dyn Mailer>));
    (app, mailer)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: Some("Dana".to_string()),
        },
    )
    .await
    .expect("user creation should succeed")
}

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    post_raw_auth(app, uri, body.to_string(), token).await
}

pub async fn post_raw_auth(app: Router, uri: &str, body: String, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
